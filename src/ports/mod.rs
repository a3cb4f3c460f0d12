//! Port traits at the crate's I/O boundaries.

pub mod config_port;
pub mod data_port;
pub mod report_port;

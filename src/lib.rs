//! cryptobt: moving-average backtester for daily cryptocurrency prices.
//!
//! Hexagonal layout: pure simulation logic in [`domain`], port traits in
//! [`ports`], concrete price sources and writers in [`adapters`], and the
//! command-line front end in [`cli`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;

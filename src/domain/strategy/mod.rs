//! Signal strategies and the registry that selects them by name.

pub mod registry;
pub mod sma_crossover;
pub mod triple_sma;

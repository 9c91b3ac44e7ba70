//! Command implementations.

pub mod audit;

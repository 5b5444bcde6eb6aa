//! Database operations.

pub mod chunks;
pub mod vectors;

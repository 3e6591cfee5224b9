//! Report rendering for command results.

pub mod generator;

pub use generator::*;

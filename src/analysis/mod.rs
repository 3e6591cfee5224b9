//! Analytics over survey responses.
//!
//! The aggregator is stateless: callers fetch surveys and responses
//! from the store and pass them in by reference.

pub mod aggregator;

pub use aggregator::*;

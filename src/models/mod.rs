//! Exponential growth model.
//!
//! The model is implemented as small, pure functions so that fitting/plotting
//! code can stay generic.

pub mod exponential;

pub use exponential::*;

//! Curve fitting orchestration.
//!
//! Responsibilities:
//!
//! - validate the observations
//! - calibrate the exponential model (Levenberg-Marquardt)
//! - attach covariance and goodness-of-fit numbers

pub mod fitter;

pub use fitter::*;

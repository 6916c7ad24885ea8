//! Mathematical utilities: the Levenberg-Marquardt solver and covariance
//! estimation for the fitted parameters.

pub mod covariance;
pub mod lm;

pub use covariance::*;
pub use lm::*;

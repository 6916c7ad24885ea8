//! Shared domain types.
//!
//! These types are intentionally kept lightweight so they can be:
//!
//! - used in-memory during fitting
//! - passed freely between the pipeline, report, and plot layers

use nalgebra::DMatrix;

/// A single (x, y) observation used for fitting.
///
/// For the embedded dataset, `x` is a character level and `y` is the
/// cumulative experience threshold for that level.
#[derive(Debug, Clone, Copy)]
pub struct Observation {
    pub x: f64,
    pub y: f64,
}

/// Summary stats about the points actually used for fitting.
#[derive(Debug, Clone)]
pub struct DatasetStats {
    pub n_points: usize,
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

/// Parameters of the exponential model `f(x) = a * exp(b * x) + c`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpParams {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

/// Fit quality diagnostics.
#[derive(Debug, Clone)]
pub struct FitQuality {
    pub sse: f64,
    pub rmse: f64,
    pub n: usize,
}

/// Output of a successful fit.
#[derive(Debug, Clone)]
pub struct CurveFit {
    pub params: ExpParams,

    /// Covariance of the parameter estimates (3×3, ordered a, b, c),
    /// scaled by the residual variance `SSE / (n - 3)`.
    pub covariance: DMatrix<f64>,

    pub quality: FitQuality,

    /// Outer iterations the solver used before converging.
    pub iterations: usize,
}

/// A per-observation fitted result (used for ranking and plotting).
#[derive(Debug, Clone)]
pub struct Residual {
    pub point: Observation,
    pub y_fit: f64,
    pub residual: f64,
}

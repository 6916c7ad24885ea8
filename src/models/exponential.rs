//! Evaluation of `f(x) = a * exp(b * x) + c`.
//!
//! The fitter relies on two primitive operations:
//! - predict `f(x)` given the parameters (for residuals and plots)
//! - the gradient of `f(x)` in the parameters (for the Jacobian)
//!
//! Overflow is not guarded here: for `b * x` beyond the double range the
//! prediction is `inf`/`NaN`, and the solver treats such trial points as
//! rejected steps.

use crate::domain::ExpParams;

/// Number of free parameters in the model.
pub const NPARAMS: usize = 3;

/// Predict `f(x)` for the given parameters.
pub fn predict(p: &ExpParams, x: f64) -> f64 {
    p.a * (p.b * x).exp() + p.c
}

/// Gradient of `f(x)` with respect to `(a, b, c)`.
pub fn gradient(p: &ExpParams, x: f64) -> [f64; NPARAMS] {
    let e = (p.b * x).exp();
    [e, p.a * x * e, 1.0]
}

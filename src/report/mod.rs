//! Reporting utilities: residuals, extremes, and formatted terminal output.

pub mod format;

pub use format::*;

use crate::domain::{CurveFit, Observation, Residual};
use crate::error::AppError;
use crate::models::exponential;

/// Observations farthest above and below the fitted curve (top-N each side).
#[derive(Debug, Clone)]
pub struct Extremes {
    pub above: Vec<Residual>,
    pub below: Vec<Residual>,
}

/// Compute fitted values and residuals for each observation.
pub fn compute_residuals(points: &[Observation], fit: &CurveFit) -> Result<Vec<Residual>, AppError> {
    let mut out = Vec::with_capacity(points.len());
    for p in points {
        let y_fit = exponential::predict(&fit.params, p.x);
        if !y_fit.is_finite() {
            return Err(AppError::new(4, "Non-finite model prediction during residual computation."));
        }
        let residual = p.y - y_fit;
        out.push(Residual {
            point: *p,
            y_fit,
            residual,
        });
    }
    Ok(out)
}

/// Rank the observations farthest above and below the curve.
pub fn rank_extremes(residuals: &[Residual], top_n: usize) -> Extremes {
    let mut sorted = residuals.to_vec();
    sorted.sort_by(|a, b| b.residual.partial_cmp(&a.residual).unwrap_or(std::cmp::Ordering::Equal));

    let above = sorted.iter().take(top_n).cloned().collect();

    let mut sorted_below = residuals.to_vec();
    sorted_below.sort_by(|a, b| a.residual.partial_cmp(&b.residual).unwrap_or(std::cmp::Ordering::Equal));
    let below = sorted_below.iter().take(top_n).cloned().collect();

    Extremes { above, below }
}

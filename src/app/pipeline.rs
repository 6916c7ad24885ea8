//! Shared "fit pipeline" logic used by both the printed report and the TUI.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! observations -> fit -> residuals -> extremes
//!
//! The report and the TUI can then focus on presentation (printing vs widgets).

use crate::data;
use crate::domain::{CurveFit, DatasetStats, Observation, Residual};
use crate::error::AppError;
use crate::fit::{FitOptions, fit_exponential};
use crate::report::{Extremes, compute_residuals, rank_extremes};

/// How many observations to highlight on each side of the curve.
pub const TOP_N: usize = 3;

/// All computed outputs of a single fit run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub stats: DatasetStats,
    pub fit: CurveFit,
    pub residuals: Vec<Residual>,
    pub extremes: Extremes,
}

/// Execute the full fitting pipeline and return the computed outputs.
pub fn run_fit(points: &[Observation], opts: &FitOptions) -> Result<RunOutput, AppError> {
    let stats = data::compute_stats(points)
        .ok_or_else(|| AppError::new(3, "Dataset is empty or non-finite."))?;

    let fit = fit_exponential(points, opts)?;

    let residuals = compute_residuals(points, &fit)?;
    let extremes = rank_extremes(&residuals, TOP_N);

    Ok(RunOutput {
        stats,
        fit,
        residuals,
        extremes,
    })
}

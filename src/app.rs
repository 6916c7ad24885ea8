//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads the embedded level table
//! - runs the fit pipeline
//! - prints the run summary and residual tables
//! - opens the TUI chart when attached to a terminal (ASCII plot otherwise)

use std::io;

use crossterm::tty::IsTty;

use crate::error::AppError;
use crate::fit::FitOptions;

pub mod pipeline;

/// Plot grid size for the non-interactive fallback.
const PLOT_WIDTH: usize = 72;
const PLOT_HEIGHT: usize = 20;

/// Entry point for the `xp` binary.
pub fn run() -> Result<(), AppError> {
    let points = crate::data::observations();
    let run = pipeline::run_fit(&points, &FitOptions::default())?;

    print!("{}", crate::report::format_run_summary(&run.stats, &run.fit));
    println!("{}", crate::report::format_extremes(&run.extremes));

    if io::stdout().is_tty() {
        crate::tui::run(&run)?;
    } else {
        let plot = crate::plot::render_ascii_plot(
            &run.residuals,
            &run.fit,
            PLOT_WIDTH,
            PLOT_HEIGHT,
            Some(&run.extremes),
        );
        print!("{plot}");
    }

    Ok(())
}

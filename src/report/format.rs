//! Formatted terminal output for fit runs.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::domain::{CurveFit, DatasetStats, Residual};
use crate::report::Extremes;

/// Format the full run summary (dataset stats + parameters + fit quality).
pub fn format_run_summary(stats: &DatasetStats, fit: &CurveFit) -> String {
    let mut out = String::new();

    out.push_str("=== xp - Level Experience Curve Fit ===\n");
    out.push_str("Model: y = a*exp(b*x) + c\n");
    out.push_str(&format!(
        "Points: n={} | x=[{:.1}, {:.1}] | y=[{:.0}, {:.0}]\n",
        stats.n_points, stats.x_min, stats.x_max, stats.y_min, stats.y_max
    ));

    out.push_str("\nFitted parameters:\n");
    let names = ["a", "b", "c"];
    let values = [fit.params.a, fit.params.b, fit.params.c];
    for (j, name) in names.iter().enumerate() {
        out.push_str(&format!(
            "- {name} = {:.6} (std err {})\n",
            values[j],
            fmt_std_err(fit.covariance[(j, j)]),
        ));
    }

    out.push_str("\nCovariance:\n");
    for i in 0..3 {
        out.push_str(&format!(
            "  [{:>13.5e} {:>13.5e} {:>13.5e}]\n",
            fit.covariance[(i, 0)],
            fit.covariance[(i, 1)],
            fit.covariance[(i, 2)],
        ));
    }

    out.push_str("\nFit quality:\n");
    out.push_str(&format!("- SSE : {:.6e}\n", fit.quality.sse));
    out.push_str(&format!("- RMSE: {:.6e}\n", fit.quality.rmse));
    out.push_str(&format!("- iterations: {}\n", fit.iterations));
    out.push('\n');

    out
}

/// Format the above/below-curve tables.
pub fn format_extremes(extremes: &Extremes) -> String {
    let mut out = String::new();

    out.push_str("Farthest above the curve (positive residual):\n");
    out.push_str(&format_table(&extremes.above));
    out.push('\n');

    out.push_str("Farthest below the curve (negative residual):\n");
    out.push_str(&format_table(&extremes.below));

    out
}

fn format_table(rows: &[Residual]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<6} {:>14} {:>14} {:>14}\n",
            "level", "xp", "fit", "residual"
        )
        .trim_end(),
    );
    out.push('\n');

    out.push_str(format!("{:-<6} {:-<14} {:-<14} {:-<14}\n", "", "", "", "").trim_end());
    out.push('\n');

    for r in rows {
        out.push_str(
            format!(
                "{:<6} {:>14.0} {:>14.1} {:>14.1}\n",
                r.point.x, r.point.y, r.y_fit, r.residual
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

fn fmt_std_err(variance: f64) -> String {
    if variance >= 0.0 {
        format!("{:.3e}", variance.sqrt())
    } else {
        "n/a".to_string()
    }
}

//! Character-grid plot for non-interactive runs.
//!
//! A fixed-size grid keeps the output deterministic, which makes the
//! renderer golden-testable and the piped output diffable. Markers:
//! observed points `o`, the fitted curve `-`, and optionally `A`/`B` for
//! the extremes above/below the curve.

use std::collections::HashSet;

use crate::domain::{CurveFit, Residual};
use crate::models::exponential;
use crate::report::Extremes;

/// Render data points, fitted curve and optional extreme markers to a string.
pub fn render_ascii_plot(
    residuals: &[Residual],
    fit: &CurveFit,
    width: usize,
    height: usize,
    extremes: Option<&Extremes>,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (x_min, x_max) = x_range_from_residuals(residuals).unwrap_or((0.0, 50.0));
    let curve = sample_curve(fit, x_min, x_max, width);

    // The y extent must cover both the data and the sampled curve.
    let (y_min, y_max) = y_range(residuals, &curve).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Draw the curve first so points can overlay it.
    draw_curve(&mut grid, &curve, x_min, x_max, y_min, y_max);

    // Highlight sets, keyed by the x coordinate's bit pattern (levels are
    // exact values, so bitwise identity is the right notion of "same point").
    let (above, below) = extremes
        .map(|e| {
            (
                e.above.iter().map(|r| r.point.x.to_bits()).collect(),
                e.below.iter().map(|r| r.point.x.to_bits()).collect(),
            )
        })
        .unwrap_or_else(|| (HashSet::new(), HashSet::new()));

    for r in residuals {
        let x = map_x(r.point.x, x_min, x_max, width);
        let y = map_y(r.point.y, y_min, y_max, height);

        let ch = if above.contains(&r.point.x.to_bits()) {
            'A'
        } else if below.contains(&r.point.x.to_bits()) {
            'B'
        } else {
            'o'
        };

        grid[y][x] = ch;
    }

    // Build final string. We include a small header with ranges and a legend.
    let mut out = String::new();
    out.push_str(&format!(
        "Plot: x=[{x_min:.3}, {x_max:.3}] | y=[{y_min:.2}, {y_max:.2}]\n"
    ));
    out.push_str("Legend: o=data, -=fit");
    if extremes.is_some() {
        out.push_str(", A=above, B=below");
    }
    out.push('\n');

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

fn x_range_from_residuals(residuals: &[Residual]) -> Option<(f64, f64)> {
    let (lo, hi) = residuals
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), r| {
            (lo.min(r.point.x), hi.max(r.point.x))
        });
    (lo.is_finite() && hi.is_finite() && hi > lo).then_some((lo, hi))
}

fn sample_curve(fit: &CurveFit, x_min: f64, x_max: f64, n: usize) -> Vec<(f64, f64)> {
    let n = n.max(2);
    (0..n)
        .map(|i| {
            let x = x_min + (x_max - x_min) * i as f64 / (n - 1) as f64;
            (x, exponential::predict(&fit.params, x))
        })
        .collect()
}

fn y_range(residuals: &[Residual], curve: &[(f64, f64)]) -> Option<(f64, f64)> {
    let ys = residuals
        .iter()
        .map(|r| r.point.y)
        .chain(curve.iter().map(|&(_, y)| y));
    let (lo, hi) = ys.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| {
        (lo.min(y), hi.max(y))
    });
    (lo.is_finite() && hi.is_finite() && hi > lo).then_some((lo, hi))
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let pad = ((max - min).abs() * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width.max(2) - 1) as f64).round() as usize
}

// Row 0 is the top of the grid, so high y maps to low row index.
fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let rows = (height.max(2) - 1) as f64;
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    (rows - u * rows).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], x_min: f64, x_max: f64, y_min: f64, y_max: f64) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();
    let cell =
        |&(x, y): &(f64, f64)| (map_x(x, x_min, x_max, width), map_y(y, y_min, y_max, height));

    let (x0, y0) = cell(&curve[0]);
    grid[y0][x0] = '-';
    for pair in curve.windows(2) {
        let (ax, ay) = cell(&pair[0]);
        let (bx, by) = cell(&pair[1]);
        draw_line(grid, ax, ay, bx, by, '-');
    }
}

/// Bresenham line between two cells, writing only into empty cells.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

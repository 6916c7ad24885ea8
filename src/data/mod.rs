//! Input data: the embedded level/XP table and dataset summaries.

pub mod levels;

pub use levels::{LEVEL_XP, observations};

use crate::domain::{DatasetStats, Observation};

/// Summarize a dataset's extent. Returns `None` for an empty or non-finite
/// dataset.
pub fn compute_stats(points: &[Observation]) -> Option<DatasetStats> {
    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;

    for p in points {
        x_min = x_min.min(p.x);
        x_max = x_max.max(p.x);
        y_min = y_min.min(p.y);
        y_max = y_max.max(p.y);
    }

    if !x_min.is_finite() || !x_max.is_finite() || !y_min.is_finite() || !y_max.is_finite() {
        return None;
    }

    Some(DatasetStats {
        n_points: points.len(),
        x_min,
        x_max,
        y_min,
        y_max,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_summarize_the_embedded_table() {
        let stats = compute_stats(&observations()).unwrap();
        assert_eq!(stats.n_points, 51);
        assert_eq!(stats.x_min, 0.0);
        assert_eq!(stats.x_max, 50.0);
        assert_eq!(stats.y_min, 0.0);
        assert_eq!(stats.y_max, 1_583_495_809.0);
    }

    #[test]
    fn stats_reject_empty_and_non_finite_input() {
        assert!(compute_stats(&[]).is_none());
        assert!(
            compute_stats(&[Observation {
                x: f64::NAN,
                y: 1.0
            }])
            .is_none()
        );
    }
}

//! Calibration of the exponential growth model.
//!
//! Given observations `(x_i, y_i)` we find the parameters `(a, b, c)` of
//! `y = a·exp(b·x) + c` minimizing the sum of squared residuals, and package
//! them together with their covariance and goodness-of-fit numbers.
//!
//! Validation happens here (finite data, enough points); the numerical work
//! lives in [`crate::math`].

use nalgebra::{DMatrix, DVector};

use crate::domain::{CurveFit, ExpParams, FitQuality, Observation};
use crate::error::FitError;
use crate::math::{LmOptions, covariance_from_jacobian, minimize};
use crate::models::exponential;

/// Fitting options that affect how the model is calibrated.
#[derive(Debug, Clone)]
pub struct FitOptions {
    /// Starting point for `(a, b, c)`.
    ///
    /// The all-ones default is the conventional generic start; the solver's
    /// step rejection keeps it safe even when the data dwarfs it.
    pub initial_guess: [f64; exponential::NPARAMS],

    /// Solver tuning.
    pub lm: LmOptions,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            initial_guess: [1.0; exponential::NPARAMS],
            lm: LmOptions::default(),
        }
    }
}

/// Calibrate `a·exp(b·x) + c` to the observations.
///
/// Residuals are oriented `model − observed`. Deterministic: the same points
/// and options always produce the same fit.
pub fn fit_exponential(points: &[Observation], opts: &FitOptions) -> Result<CurveFit, FitError> {
    for (index, p) in points.iter().enumerate() {
        if !(p.x.is_finite() && p.y.is_finite()) {
            return Err(FitError::NonFiniteData { index });
        }
    }
    if points.len() < exponential::NPARAMS {
        return Err(FitError::Underdetermined {
            actual: points.len(),
            required: exponential::NPARAMS,
        });
    }

    let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.y).collect();

    let solution = minimize(
        |v| residual_vector(&xs, &ys, &params_from_vector(v)),
        |v| jacobian_matrix(&xs, &params_from_vector(v)),
        DVector::from_column_slice(&opts.initial_guess),
        &opts.lm,
    )?;

    let params = params_from_vector(&solution.params);

    // Covariance comes from the Jacobian at the accepted solution.
    let jac = jacobian_matrix(&xs, &params);
    let covariance =
        covariance_from_jacobian(&jac, solution.sse).ok_or(FitError::SingularJacobian)?;

    let n = points.len();
    let quality = FitQuality {
        sse: solution.sse,
        rmse: (solution.sse / n as f64).sqrt(),
        n,
    };

    Ok(CurveFit {
        params,
        covariance,
        quality,
        iterations: solution.iterations,
    })
}

fn params_from_vector(v: &DVector<f64>) -> ExpParams {
    ExpParams {
        a: v[0],
        b: v[1],
        c: v[2],
    }
}

fn residual_vector(xs: &[f64], ys: &[f64], p: &ExpParams) -> DVector<f64> {
    DVector::from_iterator(
        xs.len(),
        xs.iter()
            .zip(ys)
            .map(|(&x, &y)| exponential::predict(p, x) - y),
    )
}

fn jacobian_matrix(xs: &[f64], p: &ExpParams) -> DMatrix<f64> {
    let mut jac = DMatrix::zeros(xs.len(), exponential::NPARAMS);
    for (i, &x) in xs.iter().enumerate() {
        let row = exponential::gradient(p, x);
        for (j, g) in row.iter().enumerate() {
            jac[(i, j)] = *g;
        }
    }
    jac
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data;
    use approx::assert_relative_eq;
    use rand::prelude::*;
    use rand::rngs::StdRng;
    use rand_distr::Normal;

    fn exact_dataset(a: f64, b: f64, c: f64, xs: &[f64]) -> Vec<Observation> {
        xs.iter()
            .map(|&x| Observation {
                x,
                y: a * (b * x).exp() + c,
            })
            .collect()
    }

    #[test]
    fn default_guess_is_all_ones() {
        assert_eq!(FitOptions::default().initial_guess, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn recovers_exact_exponential_data() {
        // y = 2·e^x sampled on five points; the optimum is an exact root.
        let points = exact_dataset(2.0, 1.0, 0.0, &[0.0, 1.0, 2.0, 3.0, 4.0]);
        let fit = fit_exponential(&points, &FitOptions::default()).unwrap();

        assert_relative_eq!(fit.params.a, 2.0, epsilon = 1e-4);
        assert_relative_eq!(fit.params.b, 1.0, epsilon = 1e-4);
        assert!(fit.params.c.abs() < 1e-3);
        assert!(fit.quality.sse < 1e-6);
    }

    #[test]
    fn recovers_parameters_on_a_wider_range() {
        let xs: Vec<f64> = (0..=20).map(|i| i as f64).collect();
        let points = exact_dataset(4.0, 0.25, 12.0, &xs);
        let fit = fit_exponential(&points, &FitOptions::default()).unwrap();

        assert_relative_eq!(fit.params.a, 4.0, max_relative = 1e-5);
        assert_relative_eq!(fit.params.b, 0.25, max_relative = 1e-5);
        assert_relative_eq!(fit.params.c, 12.0, max_relative = 1e-5);
    }

    #[test]
    fn fitting_is_deterministic() {
        let points = data::observations();
        let first = fit_exponential(&points, &FitOptions::default()).unwrap();
        let second = fit_exponential(&points, &FitOptions::default()).unwrap();

        assert_eq!(first.params, second.params);
        assert_eq!(first.iterations, second.iterations);
        assert_eq!(first.quality.sse, second.quality.sse);
    }

    #[test]
    fn too_few_points_is_underdetermined() {
        let single = exact_dataset(2.0, 0.5, 1.0, &[0.0]);
        let err = fit_exponential(&single, &FitOptions::default()).unwrap_err();
        assert_eq!(
            err,
            FitError::Underdetermined {
                actual: 1,
                required: 3
            }
        );

        let pair = exact_dataset(2.0, 0.5, 1.0, &[0.0, 1.0]);
        let err = fit_exponential(&pair, &FitOptions::default()).unwrap_err();
        assert_eq!(
            err,
            FitError::Underdetermined {
                actual: 2,
                required: 3
            }
        );
    }

    #[test]
    fn non_finite_observations_are_rejected_with_index() {
        let mut points = exact_dataset(2.0, 0.5, 1.0, &[0.0, 1.0, 2.0, 3.0]);
        points[2].y = f64::NAN;
        let err = fit_exponential(&points, &FitOptions::default()).unwrap_err();

        assert_eq!(err, FitError::NonFiniteData { index: 2 });
    }

    #[test]
    fn constant_data_yields_a_flat_curve() {
        let xs: Vec<f64> = (0..=10).map(|i| i as f64).collect();
        let points: Vec<Observation> = xs
            .iter()
            .map(|&x| Observation { x, y: 100.0 })
            .collect();
        let fit = fit_exponential(&points, &FitOptions::default()).unwrap();

        // Degenerate dataset: many parameter combinations produce the same
        // flat curve, so assert on the curve rather than on (a, b, c).
        assert!(fit.quality.sse < 1e-8);
        for &x in &xs {
            assert_relative_eq!(exponential::predict(&fit.params, x), 100.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn fits_the_level_experience_table() {
        let points = data::observations();
        let fit = fit_exponential(&points, &FitOptions::default()).unwrap();

        // A plausible growth curve: positive scale and rate, residuals far
        // below the table's top value.
        assert!(fit.params.a > 0.0);
        assert!(fit.params.b > 0.0);
        let top = points.last().unwrap().y;
        assert!(fit.quality.rmse < top * 0.05);

        assert_eq!(fit.covariance.nrows(), 3);
        assert_eq!(fit.covariance.ncols(), 3);
        for j in 0..3 {
            let var = fit.covariance[(j, j)];
            assert!(var.is_finite() && var > 0.0);
        }
        assert_relative_eq!(
            fit.covariance[(0, 1)],
            fit.covariance[(1, 0)],
            max_relative = 1e-9
        );
    }

    #[test]
    fn recovers_parameters_from_noisy_data() {
        let mut rng = StdRng::seed_from_u64(7);
        let noise = Normal::new(0.0, 0.1).unwrap();
        let truth = ExpParams {
            a: 4.0,
            b: 0.25,
            c: 12.0,
        };
        let points: Vec<Observation> = (0..=20)
            .map(|i| {
                let x = i as f64;
                Observation {
                    x,
                    y: exponential::predict(&truth, x) + noise.sample(&mut rng),
                }
            })
            .collect();

        let fit = fit_exponential(&points, &FitOptions::default()).unwrap();

        assert_relative_eq!(fit.params.a, truth.a, max_relative = 0.05);
        assert_relative_eq!(fit.params.b, truth.b, max_relative = 0.05);
        assert_relative_eq!(fit.params.c, truth.c, max_relative = 0.05);
    }

    #[test]
    fn custom_initial_guess_is_honored() {
        let points = data::observations();
        let far = fit_exponential(&points, &FitOptions::default()).unwrap();
        let near = fit_exponential(
            &points,
            &FitOptions {
                initial_guess: [far.params.a, far.params.b, far.params.c],
                ..FitOptions::default()
            },
        )
        .unwrap();

        // Starting at the solution converges immediately.
        assert!(near.iterations <= far.iterations);
        assert_relative_eq!(near.params.b, far.params.b, max_relative = 1e-6);
    }

    #[test]
    fn exact_point_count_gives_unbounded_covariance() {
        // Three points, three parameters: zero degrees of freedom, so the
        // residual variance (and with it the covariance) is undefined.
        let points = exact_dataset(2.0, 0.5, 1.0, &[0.0, 1.0, 2.0]);
        let fit = fit_exponential(&points, &FitOptions::default()).unwrap();

        assert!(fit.quality.sse < 1e-10);
        assert!(fit.covariance[(0, 0)].is_infinite());
    }
}

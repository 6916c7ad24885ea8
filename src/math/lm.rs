//! Levenberg–Marquardt minimization for nonlinear least squares.
//!
//! Each iteration linearizes the residual vector around the current estimate
//! and solves the damped step
//!
//! ```text
//! minimize ‖J δ + r‖² + λ ‖D δ‖²
//! ```
//!
//! where `D` holds the Jacobian column norms (Marquardt scaling), so damping
//! behaves the same regardless of parameter units. The step is solved as one
//! augmented least-squares system via SVD; `JᵀJ` is never formed, which
//! matters for exponential models whose columns can span dozens of orders of
//! magnitude.
//!
//! Trial steps that fail to reduce the sum of squares, or that produce
//! non-finite residuals (e.g. `exp` overflow), are rejected and the damping
//! raised. The rejection loop is what lets the solver start from a guess with
//! astronomically large residuals without ever propagating `inf` into the
//! accepted state.

use nalgebra::{DMatrix, DVector};

use crate::error::FitError;

/// Tuning knobs for the solver.
///
/// Problems in this crate are tiny (tens of rows, three columns), so the
/// defaults lean toward a wide iteration budget and tight tolerances.
#[derive(Debug, Clone)]
pub struct LmOptions {
    /// Maximum outer iterations (one Jacobian evaluation each).
    pub max_iterations: usize,

    /// Converged when an accepted step reduces the SSE by less than this
    /// fraction of its previous value.
    pub ftol: f64,

    /// Converged when the proposed step is this small relative to the
    /// parameter vector.
    pub xtol: f64,

    /// Converged when the cosine of the angle between every Jacobian column
    /// and the residual falls to this value.
    pub gtol: f64,

    /// Initial damping factor.
    pub lambda_init: f64,

    /// Damping multiplier after a rejected step.
    pub lambda_up: f64,

    /// Damping multiplier after an accepted step.
    pub lambda_down: f64,

    /// Damping floor.
    pub lambda_min: f64,

    /// Damping ceiling; escalating past it without an acceptable step is a
    /// convergence failure.
    pub lambda_max: f64,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            max_iterations: 400,
            ftol: 1e-10,
            xtol: 1e-10,
            gtol: 1e-14,
            lambda_init: 1e-3,
            lambda_up: 10.0,
            lambda_down: 0.1,
            lambda_min: 1e-12,
            lambda_max: 1e12,
        }
    }
}

/// Solver state at the accepted final iterate.
#[derive(Debug, Clone)]
pub struct LmSolution {
    pub params: DVector<f64>,
    pub residuals: DVector<f64>,
    pub sse: f64,
    pub iterations: usize,
}

/// Minimize `‖r(p)‖²` starting from `x0`.
///
/// `residual_fn` evaluates the residual vector at a parameter point;
/// `jacobian_fn` its derivative matrix (rows follow residuals, columns follow
/// parameters). Deterministic: identical inputs yield identical iterates.
pub fn minimize<R, J>(
    mut residual_fn: R,
    mut jacobian_fn: J,
    x0: DVector<f64>,
    opts: &LmOptions,
) -> Result<LmSolution, FitError>
where
    R: FnMut(&DVector<f64>) -> DVector<f64>,
    J: FnMut(&DVector<f64>) -> DMatrix<f64>,
{
    let n = x0.len();
    let mut x = x0;
    let mut r = residual_fn(&x);
    let m = r.len();

    if n == 0 || m < n {
        return Err(FitError::Underdetermined {
            actual: m,
            required: n.max(1),
        });
    }

    let mut sse = r.norm_squared();
    if !sse.is_finite() {
        return Err(FitError::NonFiniteAtGuess);
    }

    let mut lambda = opts.lambda_init;

    for iteration in 1..=opts.max_iterations {
        if sse == 0.0 {
            return Ok(LmSolution {
                params: x,
                residuals: r,
                sse,
                iterations: iteration - 1,
            });
        }

        let jac = jacobian_fn(&x);
        debug_assert_eq!(jac.nrows(), m);
        debug_assert_eq!(jac.ncols(), n);
        if jac.iter().any(|v| !v.is_finite()) {
            return Err(FitError::SingularJacobian);
        }

        // Marquardt scaling: damp each parameter relative to its sensitivity.
        let mut scale = vec![0.0_f64; n];
        for (j, s) in scale.iter_mut().enumerate() {
            let norm = jac.column(j).norm();
            *s = if norm > 0.0 { norm } else { 1.0 };
        }

        // Scale-invariant gradient test (cosine of the angle between each
        // column and the residual); an absolute threshold would be useless
        // against this problem family's dynamic range.
        let gradient = jac.transpose() * &r;
        let r_norm = sse.sqrt();
        let g_cos = (0..n)
            .map(|j| gradient[j].abs() / (scale[j] * r_norm))
            .fold(0.0_f64, f64::max);
        if g_cos <= opts.gtol {
            return Ok(LmSolution {
                params: x,
                residuals: r,
                sse,
                iterations: iteration - 1,
            });
        }

        // Escalate damping until a step is accepted or becomes negligible.
        loop {
            let Some(delta) = damped_step(&jac, &r, &scale, lambda) else {
                lambda *= opts.lambda_up;
                if lambda > opts.lambda_max {
                    return Err(FitError::SingularJacobian);
                }
                continue;
            };

            if delta.norm() <= opts.xtol * (x.norm() + opts.xtol) {
                // The damped model cannot move the parameters any further.
                return Ok(LmSolution {
                    params: x,
                    residuals: r,
                    sse,
                    iterations: iteration,
                });
            }

            let x_trial = &x + &delta;
            let r_trial = residual_fn(&x_trial);
            let sse_trial = r_trial.norm_squared();

            if sse_trial.is_finite() && sse_trial < sse {
                let previous = sse;
                x = x_trial;
                r = r_trial;
                sse = sse_trial;
                lambda = (lambda * opts.lambda_down).max(opts.lambda_min);

                if previous - sse <= opts.ftol * previous {
                    return Ok(LmSolution {
                        params: x,
                        residuals: r,
                        sse,
                        iterations: iteration,
                    });
                }
                break;
            }

            lambda *= opts.lambda_up;
            if lambda > opts.lambda_max {
                return Err(FitError::NoConvergence {
                    iterations: iteration,
                });
            }
        }
    }

    Err(FitError::NoConvergence {
        iterations: opts.max_iterations,
    })
}

/// Solve the damped least-squares step for a given λ.
///
/// Stacks `√λ·D` under the Jacobian so that one SVD pass solves
/// `minimize ‖J δ + r‖² + λ ‖D δ‖²`.
fn damped_step(
    jacobian: &DMatrix<f64>,
    residuals: &DVector<f64>,
    scale: &[f64],
    lambda: f64,
) -> Option<DVector<f64>> {
    let m = jacobian.nrows();
    let n = jacobian.ncols();
    let sqrt_lambda = lambda.sqrt();

    let mut augmented = DMatrix::zeros(m + n, n);
    augmented.view_mut((0, 0), (m, n)).copy_from(jacobian);
    for j in 0..n {
        augmented[(m + j, j)] = sqrt_lambda * scale[j];
    }

    let mut rhs = DVector::zeros(m + n);
    for i in 0..m {
        rhs[i] = -residuals[i];
    }

    solve_least_squares(&augmented, &rhs)
}

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
fn solve_least_squares(a: &DMatrix<f64>, b: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = a.clone().svd(true, true);

    // Try progressively looser tolerances if the strict solve fails. Damping
    // keeps the augmented matrix comfortably full-rank, so the first
    // tolerance nearly always wins; the fallbacks cover degenerate scales.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(delta) = svd.solve(b, tol) {
            if delta.iter().all(|v| v.is_finite()) {
                return Some(delta);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_options_are_ordered() {
        let opts = LmOptions::default();
        assert!(opts.lambda_min < opts.lambda_init);
        assert!(opts.lambda_init < opts.lambda_max);
        assert!(opts.lambda_up > 1.0);
        assert!(opts.lambda_down < 1.0);
        assert!(opts.max_iterations > 0);
    }

    #[test]
    fn converges_on_linear_problem() {
        // Fit y = 2 + 3x on x = [0, 1, 2]; linear residuals converge in a
        // handful of damped Gauss-Newton steps.
        let xs = [0.0, 1.0, 2.0];
        let ys = [2.0, 5.0, 8.0];

        let residual = |p: &DVector<f64>| {
            DVector::from_iterator(3, xs.iter().zip(ys).map(|(&x, y)| p[0] + p[1] * x - y))
        };
        let jacobian = |_: &DVector<f64>| {
            DMatrix::from_fn(3, 2, |i, j| if j == 0 { 1.0 } else { xs[i] })
        };

        let sol = minimize(
            residual,
            jacobian,
            DVector::from_column_slice(&[0.0, 0.0]),
            &LmOptions::default(),
        )
        .unwrap();

        assert_relative_eq!(sol.params[0], 2.0, epsilon = 1e-8);
        assert_relative_eq!(sol.params[1], 3.0, epsilon = 1e-8);
        assert!(sol.sse < 1e-16);
    }

    #[test]
    fn converges_on_exponential_decay() {
        // y = 2 exp(-1.5 x), two free parameters, started well off target.
        let xs: Vec<f64> = (0..6).map(|i| i as f64 * 0.5).collect();
        let ys: Vec<f64> = xs.iter().map(|&x| 2.0 * (-1.5 * x).exp()).collect();

        let residual = |p: &DVector<f64>| {
            DVector::from_iterator(
                xs.len(),
                xs.iter()
                    .zip(&ys)
                    .map(|(&x, &y)| p[0] * (p[1] * x).exp() - y),
            )
        };
        let jacobian = |p: &DVector<f64>| {
            DMatrix::from_fn(xs.len(), 2, |i, j| {
                let e = (p[1] * xs[i]).exp();
                if j == 0 { e } else { p[0] * xs[i] * e }
            })
        };

        let sol = minimize(
            residual,
            jacobian,
            DVector::from_column_slice(&[1.0, 1.0]),
            &LmOptions::default(),
        )
        .unwrap();

        assert_relative_eq!(sol.params[0], 2.0, max_relative = 1e-6);
        assert_relative_eq!(sol.params[1], -1.5, max_relative = 1e-6);
    }

    #[test]
    fn converges_on_rosenbrock() {
        // Classic curved valley; exercises the step-rejection path.
        let residual = |p: &DVector<f64>| {
            DVector::from_column_slice(&[10.0 * (p[1] - p[0] * p[0]), 1.0 - p[0]])
        };
        let jacobian = |p: &DVector<f64>| {
            DMatrix::from_row_slice(2, 2, &[-20.0 * p[0], 10.0, -1.0, 0.0])
        };

        let sol = minimize(
            residual,
            jacobian,
            DVector::from_column_slice(&[-1.2, 1.0]),
            &LmOptions::default(),
        )
        .unwrap();

        assert_relative_eq!(sol.params[0], 1.0, epsilon = 1e-4);
        assert_relative_eq!(sol.params[1], 1.0, epsilon = 1e-4);
    }

    #[test]
    fn already_optimal_start_returns_immediately() {
        let residual = |p: &DVector<f64>| DVector::from_column_slice(&[p[0] - 2.0]);
        let jacobian = |_: &DVector<f64>| DMatrix::from_row_slice(1, 1, &[1.0]);

        let sol = minimize(
            residual,
            jacobian,
            DVector::from_column_slice(&[2.0]),
            &LmOptions::default(),
        )
        .unwrap();

        assert_eq!(sol.iterations, 0);
        assert_eq!(sol.sse, 0.0);
        assert_relative_eq!(sol.params[0], 2.0);
    }

    #[test]
    fn iteration_budget_exhaustion_is_an_error() {
        let xs: Vec<f64> = (0..6).map(|i| i as f64 * 0.5).collect();
        let ys: Vec<f64> = xs.iter().map(|&x| 2.0 * (-1.5 * x).exp()).collect();

        let residual = |p: &DVector<f64>| {
            DVector::from_iterator(
                xs.len(),
                xs.iter()
                    .zip(&ys)
                    .map(|(&x, &y)| p[0] * (p[1] * x).exp() - y),
            )
        };
        let jacobian = |p: &DVector<f64>| {
            DMatrix::from_fn(xs.len(), 2, |i, j| {
                let e = (p[1] * xs[i]).exp();
                if j == 0 { e } else { p[0] * xs[i] * e }
            })
        };

        let opts = LmOptions {
            max_iterations: 1,
            ..LmOptions::default()
        };
        let err = minimize(
            residual,
            jacobian,
            DVector::from_column_slice(&[5.0, 5.0]),
            &opts,
        )
        .unwrap_err();

        assert!(matches!(err, FitError::NoConvergence { .. }));
    }

    #[test]
    fn non_finite_guess_is_an_error() {
        let residual = |p: &DVector<f64>| DVector::from_column_slice(&[(p[0] * 1000.0).exp()]);
        let jacobian = |_: &DVector<f64>| DMatrix::from_row_slice(1, 1, &[1.0]);

        let err = minimize(
            residual,
            jacobian,
            DVector::from_column_slice(&[1.0]),
            &LmOptions::default(),
        )
        .unwrap_err();

        assert_eq!(err, FitError::NonFiniteAtGuess);
    }

    #[test]
    fn non_finite_trials_are_rejected_and_damped() {
        // One-dimensional problem with a residual cliff: past p = 2 the
        // second residual squares to infinity, so the undamped step toward
        // p = 3 must be rejected and retried with more damping until the
        // trial lands on the finite side.
        let residual = |p: &DVector<f64>| {
            let wall = if p[0] > 2.0 { 1e200 } else { 0.0 };
            DVector::from_column_slice(&[p[0] - 3.0, wall])
        };
        let jacobian = |_: &DVector<f64>| DMatrix::from_row_slice(2, 1, &[1.0, 0.0]);

        let sol = minimize(
            residual,
            jacobian,
            DVector::from_column_slice(&[0.0]),
            &LmOptions::default(),
        )
        .unwrap();

        // The minimum on the finite side sits at the cliff edge.
        assert!(sol.params[0] <= 2.0);
        assert_relative_eq!(sol.params[0], 2.0, epsilon = 1e-6);
        assert!(sol.sse.is_finite());
    }

    #[test]
    fn fewer_residuals_than_parameters_is_underdetermined() {
        let residual = |p: &DVector<f64>| DVector::from_column_slice(&[p[0] + p[1]]);
        let jacobian = |_: &DVector<f64>| DMatrix::from_row_slice(1, 2, &[1.0, 1.0]);

        let err = minimize(
            residual,
            jacobian,
            DVector::from_column_slice(&[1.0, 1.0]),
            &LmOptions::default(),
        )
        .unwrap_err();

        assert_eq!(
            err,
            FitError::Underdetermined {
                actual: 1,
                required: 2
            }
        );
    }
}

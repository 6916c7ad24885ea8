//! Covariance of least-squares parameter estimates.
//!
//! At the solution the estimate covariance is `s²·(JᵀJ)⁻¹` with residual
//! variance `s² = SSE / (m − n)`. The inverse is built from the SVD of `J`
//! itself as `V Σ⁻² Vᵀ`, which avoids squaring the condition number, and
//! directions whose singular values are negligible relative to the largest
//! are dropped (the unidentifiable subspace of a rank-deficient fit).

use nalgebra::DMatrix;

/// Relative singular value cutoff for the pseudo-inverse.
const SV_RCUT: f64 = 1e-12;

/// Covariance of the parameter estimates from the Jacobian at the solution.
///
/// Returns an `n × n` matrix. With zero degrees of freedom (`m == n`) the
/// residual variance is undefined and every entry is `+∞`. Returns `None`
/// when the Jacobian contains non-finite values or the decomposition yields
/// nothing usable.
pub fn covariance_from_jacobian(jacobian: &DMatrix<f64>, sse: f64) -> Option<DMatrix<f64>> {
    let m = jacobian.nrows();
    let n = jacobian.ncols();
    if m < n || !sse.is_finite() || jacobian.iter().any(|v| !v.is_finite()) {
        return None;
    }
    if m == n {
        return Some(DMatrix::from_element(n, n, f64::INFINITY));
    }

    let s2 = sse / (m - n) as f64;

    let svd = jacobian.clone().svd(false, true);
    let v_t = svd.v_t.as_ref()?;
    let sigma = &svd.singular_values;
    let sigma_max = sigma.iter().fold(0.0_f64, |acc, &s| acc.max(s));
    if sigma_max <= 0.0 {
        return None;
    }
    let cutoff = sigma_max * SV_RCUT;

    let mut cov = DMatrix::zeros(n, n);
    for k in 0..sigma.len() {
        if sigma[k] <= cutoff {
            continue;
        }
        let w = s2 / (sigma[k] * sigma[k]);
        for i in 0..n {
            for j in 0..n {
                cov[(i, j)] += w * v_t[(k, i)] * v_t[(k, j)];
            }
        }
    }

    Some(cov)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn constant_model_matches_hand_computation() {
        // J = ones(5, 1): (JᵀJ)⁻¹ = 1/5, s² = sse / 4.
        let jac = DMatrix::from_element(5, 1, 1.0);
        let cov = covariance_from_jacobian(&jac, 2.0).unwrap();

        assert_eq!(cov.nrows(), 1);
        assert_relative_eq!(cov[(0, 0)], 2.0 / 4.0 / 5.0, epsilon = 1e-14);
    }

    #[test]
    fn zero_degrees_of_freedom_saturates() {
        let jac = DMatrix::identity(3, 3);
        let cov = covariance_from_jacobian(&jac, 0.5).unwrap();

        assert!(cov.iter().all(|v| v.is_infinite() && *v > 0.0));
    }

    #[test]
    fn result_is_symmetric() {
        let jac = DMatrix::from_row_slice(
            4,
            2,
            &[1.0, 0.5, 1.0, 1.5, 1.0, 2.5, 1.0, 4.0],
        );
        let cov = covariance_from_jacobian(&jac, 1.0).unwrap();

        assert_eq!(cov.nrows(), 2);
        assert_relative_eq!(cov[(0, 1)], cov[(1, 0)], epsilon = 1e-14);
        assert!(cov[(0, 0)] > 0.0);
        assert!(cov[(1, 1)] > 0.0);
    }

    #[test]
    fn non_finite_jacobian_is_rejected() {
        let jac = DMatrix::from_row_slice(2, 1, &[1.0, f64::NAN]);
        assert!(covariance_from_jacobian(&jac, 1.0).is_none());
    }
}

//! Validation helpers for the log-likelihood optimizer.
//!
//! - [`verify_tol_grad`], [`verify_tol_cost`]: stopping-rule tolerances.
//! - [`validate_theta`]: starting coefficients (length and finiteness).
//! - [`validate_grad`], [`validate_hessian`]: derivative shapes and entries.
//! - [`validate_theta_hat`], [`validate_value`]: solver output.
//!
//! All helpers report through [`OptError`] so callers can branch on the
//! variant rather than on strings.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{Grad, Theta, types::Hessian},
};

/// Validate the optional gradient‐norm tolerance.
///
/// - Accepts `None` (no stopping rule on gradient).
/// - If `Some`, the value must be **finite** and **strictly positive**.
///
/// # Errors
/// Returns [`OptError::InvalidTolGrad`] if the value is non-finite or ≤ 0.0.
pub fn verify_tol_grad(tol: Option<f64>) -> OptResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(OptError::InvalidTolGrad { tol, reason: "Tolerance must be finite." });
        }
        if tol <= 0.0 {
            return Err(OptError::InvalidTolGrad { tol, reason: "Tolerance must be positive." });
        }
    }
    Ok(())
}

/// Validate the optional cost‐change tolerance (for convergence).
///
/// - Accepts `None` (no stopping rule on cost change).
/// - If `Some`, the value must be **finite** and **strictly positive**.
///
/// # Errors
/// Returns [`OptError::InvalidTolCost`] if the value is non-finite or ≤ 0.0.
pub fn verify_tol_cost(tol: Option<f64>) -> OptResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(OptError::InvalidTolCost { tol, reason: "Tolerance must be finite." });
        }
        if tol <= 0.0 {
            return Err(OptError::InvalidTolCost { tol, reason: "Tolerance must be positive." });
        }
    }
    Ok(())
}

/// Validate a coefficient vector before it reaches the solver.
///
/// # Errors
/// - [`OptError::ThetaLengthMismatch`] if `theta.len() != expected`.
/// - [`OptError::InvalidThetaInput`] for the first non-finite entry.
pub fn validate_theta(theta: &Theta, expected: usize) -> OptResult<()> {
    if theta.len() != expected {
        return Err(OptError::ThetaLengthMismatch { expected, actual: theta.len() });
    }
    if let Some((index, &value)) = theta.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(OptError::InvalidThetaInput { index, value });
    }
    Ok(())
}

/// Validate a gradient vector against dimension and finiteness.
///
/// Checks:
/// - `grad.len() == dim`
/// - every element is finite (`NaN` or `±∞` are rejected)
///
/// # Errors
/// - [`OptError::GradientDimMismatch`] if length does not match `dim`.
/// - [`OptError::InvalidGradient`] with the index/value/reason of the first
///   offending element.
pub fn validate_grad(grad: &Grad, dim: usize) -> OptResult<()> {
    if grad.len() != dim {
        return Err(OptError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    for (index, &value) in grad.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidGradient {
                index,
                value,
                reason: "Gradient elements must be finite.",
            });
        }
    }
    Ok(())
}

/// Validate and unwrap an estimated parameter vector (`theta_hat`).
///
/// Accepts only a present vector with all **finite** entries.
///
/// # Returns
/// The owned `Theta` if valid.
///
/// # Errors
/// - [`OptError::MissingThetaHat`] if no vector was provided.
/// - [`OptError::InvalidThetaHat`] if any element is non-finite.
pub fn validate_theta_hat(theta_hat: Option<Theta>) -> OptResult<Theta> {
    match theta_hat {
        Some(t) => {
            for (index, &value) in t.iter().enumerate() {
                if !value.is_finite() {
                    return Err(OptError::InvalidThetaHat {
                        index,
                        value,
                        reason: "Parameter estimates must be finite.",
                    });
                }
            }
            Ok(t)
        }
        None => Err(OptError::MissingThetaHat),
    }
}

/// Validate that a scalar log-likelihood value is finite.
///
/// Negative values are fine as long as they are finite.
///
/// # Errors
/// Returns [`OptError::NonFiniteCost`] if the value is `NaN` or infinite.
pub fn validate_value(value: f64) -> OptResult<()> {
    if !value.is_finite() {
        return Err(OptError::NonFiniteCost { value });
    }
    Ok(())
}

/// Validate the shape and entries of a Hessian matrix.
///
/// # Checks
/// 1. Matrix dimensions must equal `dim × dim`.
/// 2. All entries must be finite (no NaN or ±∞).
///
/// # Arguments
/// - `hessian`: Hessian matrix to validate.
/// - `dim`: expected dimension (both rows and columns).
///
/// # Returns
/// - `Ok(())` if the Hessian passes all checks.
///
/// # Errors
/// - [`OptError::HessianDimMismatch`] if dimensions do not match `dim`.
/// - [`OptError::InvalidHessian`] if any entry is non-finite, with offending
///   row/col indices and value.
pub fn validate_hessian(hessian: &Hessian, dim: usize) -> OptResult<()> {
    if hessian.nrows() != dim || hessian.ncols() != dim {
        return Err(OptError::HessianDimMismatch {
            expected: dim,
            found: (hessian.nrows(), hessian.ncols()),
        });
    }
    for ((i, j), &value) in hessian.indexed_iter() {
        if !value.is_finite() {
            return Err(OptError::InvalidHessian { row: i, col: j, value });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Shape and finiteness checks on coefficients, gradients and Hessians.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Starting coefficients must match the layer count and be finite.
    //
    // Given
    // -----
    // - A length-2 vector checked against 3, and a vector holding NaN.
    //
    // Expect
    // ------
    // - `ThetaLengthMismatch` and `InvalidThetaInput` at the NaN index.
    fn validate_theta_checks_length_then_entries() {
        // Act / Assert
        assert_eq!(
            validate_theta(&array![0.0, 0.0], 3),
            Err(OptError::ThetaLengthMismatch { expected: 3, actual: 2 })
        );
        assert!(matches!(
            validate_theta(&array![0.0, f64::NAN], 2),
            Err(OptError::InvalidThetaInput { index: 1, .. })
        ));
        assert_eq!(validate_theta(&array![0.1, -0.2], 2), Ok(()));
    }

    #[test]
    // Purpose
    // -------
    // Hessians with the wrong shape or a non-finite entry are rejected.
    //
    // Given
    // -----
    // - A 2×3 matrix and a 2×2 matrix with an infinite entry.
    //
    // Expect
    // ------
    // - `HessianDimMismatch` and `InvalidHessian` at the offending cell.
    fn validate_hessian_rejects_bad_shape_and_entries() {
        // Arrange
        let wide = Array2::<f64>::zeros((2, 3));
        let mut bad = Array2::<f64>::zeros((2, 2));
        bad[[1, 0]] = f64::INFINITY;

        // Act / Assert
        assert!(matches!(validate_hessian(&wide, 2), Err(OptError::HessianDimMismatch { .. })));
        assert!(matches!(
            validate_hessian(&bad, 2),
            Err(OptError::InvalidHessian { row: 1, col: 0, .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // A missing solver estimate is reported distinctly from a non-finite one.
    //
    // Given
    // -----
    // - `None` and a vector containing infinity.
    //
    // Expect
    // ------
    // - `MissingThetaHat` and `InvalidThetaHat`.
    fn validate_theta_hat_distinguishes_missing_and_non_finite() {
        // Act / Assert
        assert_eq!(validate_theta_hat(None), Err(OptError::MissingThetaHat));
        assert!(matches!(
            validate_theta_hat(Some(array![f64::INFINITY])),
            Err(OptError::InvalidThetaHat { index: 0, .. })
        ));
    }
}

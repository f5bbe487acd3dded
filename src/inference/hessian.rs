//! inference::hessian — observed information and coefficient covariance.
//!
//! Purpose
//! -------
//! Turn an analytic log-likelihood gradient into the observed Fisher
//! information at the optimum, `J(ĉ) = -∇²ℓ(ĉ)`, and invert it into the
//! asymptotic covariance of the raw coefficients. A non-invertible
//! information matrix is never pseudo-inverted: either the degenerate
//! coefficients are set aside and the rest is inverted exactly, or an error
//! is reported. Standard errors are never fabricated.
//!
//! Key behaviors
//! -------------
//! - [`observed_information`] differences the gradient numerically through
//!   `finite_diff::hessian_of_fallible` and flips the sign.
//! - [`calc_covariance`] copies `J` into `nalgebra` ([`fill_dmatrix`]),
//!   runs a symmetric eigendecomposition and returns `Q Λ⁻¹ Qᵀ`.
//! - Singularity rule: `λ_min ≤ EIGEN_EPS · max(1, λ_max)` (or any
//!   non-finite eigenvalue) yields [`InferenceError::SingularInformation`].
//! - [`calc_partial_covariance`] handles a singular `J` coefficient by
//!   coefficient: coordinates that load on a null eigen-direction are
//!   flagged unidentified, and `J` restricted to the remaining coordinates is
//!   inverted. This repeats until the block is invertible or nothing is left.
//!
//! Invariants & assumptions
//! ------------------------
//! - Matrices are `k × k` with `k` the number of active layers. `k = 0` is
//!   valid and yields an empty covariance.
//! - The Hessian helpers already return exactly symmetric matrices.
//!
//! Conventions
//! -----------
//! - Information is on the total log-likelihood scale (a sum over dyads),
//!   so variances need no further rescaling.
//! - Coefficients live on the raw `c` scale; effects `exp(c)` are never
//!   differentiated here.
//!
//! Testing notes
//! -------------
//! - Diagonal and correlated quadratic objectives with known inverses.
//! - A rank-deficient information matrix must be rejected by
//!   [`calc_covariance`] and split by [`calc_partial_covariance`].
use crate::{
    inference::errors::{InferenceError, InferenceResult},
    optimization::{
        errors::OptResult,
        loglik_optimizer::{Covariance, Grad, Hessian, Theta, finite_diff::hessian_of_fallible},
        numerical_stability::transformations::EIGEN_EPS,
    },
};
use nalgebra::DMatrix;
use ndarray::Array2;

/// Squared loading above which a coordinate is tied to a null direction.
const NULL_DIRECTION_LOADING: f64 = 1e-2;

/// Covariance of the identified coefficients of a fit.
///
/// Coefficient `i` is identified when `identified[i]`; `block` is the
/// covariance of the identified coefficients in their original order.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialCovariance {
    identified: Vec<bool>,
    block: Covariance,
}

impl PartialCovariance {
    /// Every coefficient identified.
    pub fn complete(covariance: Covariance) -> Self {
        Self { identified: vec![true; covariance.nrows()], block: covariance }
    }

    /// Errors
    /// ------
    /// - [`InferenceError::DimensionMismatch`] if `block` is not square with
    ///   one row per identified coefficient.
    pub fn new(identified: Vec<bool>, block: Covariance) -> InferenceResult<Self> {
        let expected = identified.iter().filter(|&&id| id).count();
        if block.nrows() != expected || block.ncols() != expected {
            return Err(InferenceError::DimensionMismatch { expected, found: block.nrows() });
        }
        Ok(Self { identified, block })
    }

    pub fn n_coefficients(&self) -> usize {
        self.identified.len()
    }

    pub fn identified(&self) -> &[bool] {
        &self.identified
    }

    pub fn is_identified(&self, index: usize) -> bool {
        self.identified.get(index).copied().unwrap_or(false)
    }

    pub fn is_complete(&self) -> bool {
        self.identified.iter().all(|&id| id)
    }

    /// Covariance of the identified coefficients.
    pub fn block(&self) -> &Covariance {
        &self.block
    }

    /// Full `k × k` covariance when every coefficient is identified.
    pub fn full(&self) -> Option<&Covariance> {
        self.is_complete().then_some(&self.block)
    }

    /// Variance of coefficient `index`, if it is identified.
    pub fn variance(&self, index: usize) -> Option<f64> {
        if !self.is_identified(index) {
            return None;
        }
        let pos = self.identified[..index].iter().filter(|&&id| id).count();
        Some(self.block[[pos, pos]])
    }
}

/// Observed information `J(θ̂) = -∇²ℓ(θ̂)` from the gradient of `ℓ`.
///
/// Parameters
/// ----------
/// - `grad_ll`: gradient of the log-likelihood (not of the cost).
/// - `theta_hat`: point at which the information is evaluated.
///
/// Errors
/// ------
/// - [`InferenceError::Derivatives`] when the gradient fails at a perturbed
///   point or the difference quotient is not finite.
pub fn observed_information<F>(grad_ll: &F, theta_hat: &Theta) -> InferenceResult<Hessian>
where
    F: Fn(&Theta) -> OptResult<Grad>,
{
    if theta_hat.is_empty() {
        return Ok(Hessian::zeros((0, 0)));
    }
    let hess = hessian_of_fallible(grad_ll, theta_hat)?;
    Ok(-hess)
}

/// Covariance `J⁻¹` of the coefficient estimates.
///
/// Parameters
/// ----------
/// - `obs_info`: symmetric `k × k` observed information.
///
/// Returns
/// -------
/// `Q Λ⁻¹ Qᵀ` from the symmetric eigendecomposition `J = Q Λ Qᵀ`.
///
/// Errors
/// ------
/// - [`InferenceError::DimensionMismatch`] if `obs_info` is not square.
/// - [`InferenceError::SingularInformation`] when the smallest eigenvalue
///   is not safely positive relative to the largest.
pub fn calc_covariance(obs_info: &Hessian) -> InferenceResult<Covariance> {
    let k = obs_info.nrows();
    if obs_info.ncols() != k {
        return Err(InferenceError::DimensionMismatch { expected: k, found: obs_info.ncols() });
    }
    if k == 0 {
        return Ok(Covariance::zeros((0, 0)));
    }
    let mut obs_info_nalg = DMatrix::<f64>::zeros(k, k);
    fill_dmatrix(obs_info, &mut obs_info_nalg);
    let eigen = obs_info_nalg.symmetric_eigen();
    let lambdas = &eigen.eigenvalues;
    let min_eigenvalue = lambdas.iter().copied().fold(f64::INFINITY, f64::min);
    let max_eigenvalue = lambdas.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let finite = lambdas.iter().all(|l| l.is_finite());
    if !finite || min_eigenvalue <= EIGEN_EPS * max_eigenvalue.max(1.0) {
        return Err(InferenceError::SingularInformation { min_eigenvalue, max_eigenvalue });
    }

    let q = &eigen.eigenvectors;
    let mut cov = Covariance::zeros((k, k));
    for i in 0..k {
        for j in 0..=i {
            let v: f64 =
                lambdas.iter().enumerate().map(|(l, &lam)| q[(i, l)] * q[(j, l)] / lam).sum();
            cov[[i, j]] = v;
            cov[[j, i]] = v;
        }
    }
    Ok(cov)
}

/// Covariance of the identified coefficients when `J` may be singular.
///
/// Returns the complete covariance whenever [`calc_covariance`] succeeds.
/// Otherwise coordinates carrying a null direction of `J` are flagged as
/// unidentified and the restricted information is inverted again, until it
/// is invertible.
///
/// Errors
/// ------
/// - [`InferenceError::DimensionMismatch`] if `obs_info` is not square.
/// - The original [`InferenceError::SingularInformation`] when no
///   coefficient is identified, or when `J` has non-finite entries.
pub fn calc_partial_covariance(obs_info: &Hessian) -> InferenceResult<PartialCovariance> {
    let first_err = match calc_covariance(obs_info) {
        Ok(cov) => return Ok(PartialCovariance::complete(cov)),
        Err(err @ InferenceError::SingularInformation { .. }) => err,
        Err(err) => return Err(err),
    };
    if obs_info.iter().any(|v| !v.is_finite()) {
        return Err(first_err);
    }

    let k = obs_info.nrows();
    let mut keep: Vec<usize> = (0..k).collect();
    loop {
        let sub = Array2::from_shape_fn((keep.len(), keep.len()), |(i, j)| {
            obs_info[[keep[i], keep[j]]]
        });
        match calc_covariance(&sub) {
            Ok(block) => {
                let mut identified = vec![false; k];
                for &i in &keep {
                    identified[i] = true;
                }
                return PartialCovariance::new(identified, block);
            }
            Err(InferenceError::SingularInformation { .. }) => {
                let weak = null_direction_coordinates(&sub);
                keep = keep.into_iter().zip(weak).filter(|(_, w)| !w).map(|(i, _)| i).collect();
                if keep.is_empty() {
                    return Err(first_err);
                }
            }
            Err(err) => return Err(err),
        }
    }
}

// ---- Helper methods ----

/// Coordinates that load on an eigen-direction of `obs_info` whose
/// eigenvalue fails the singularity rule.
///
/// For every such direction the coordinate with the largest loading is
/// always flagged, so each call flags at least one coordinate of a singular
/// matrix.
fn null_direction_coordinates(obs_info: &Hessian) -> Vec<bool> {
    let k = obs_info.nrows();
    let mut info_nalg = DMatrix::<f64>::zeros(k, k);
    fill_dmatrix(obs_info, &mut info_nalg);
    let eigen = info_nalg.symmetric_eigen();
    let max_eigenvalue = eigen.eigenvalues.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let threshold = EIGEN_EPS * max_eigenvalue.max(1.0);

    let mut weak = vec![false; k];
    for (l, &lambda) in eigen.eigenvalues.iter().enumerate() {
        if lambda.is_finite() && lambda > threshold {
            continue;
        }
        let column = eigen.eigenvectors.column(l);
        let mut strongest = 0;
        for j in 0..k {
            let loading = column[j] * column[j];
            if loading >= NULL_DIRECTION_LOADING {
                weak[j] = true;
            }
            if loading > column[strongest] * column[strongest] {
                strongest = j;
            }
        }
        weak[strongest] = true;
    }
    weak
}

/// Copy a square `ndarray` matrix into a preallocated `DMatrix`, column by
/// column. Shapes must already agree.
fn fill_dmatrix(src: &Array2<f64>, dst: &mut DMatrix<f64>) {
    let n = src.ncols();
    for j in 0..n {
        for i in 0..n {
            dst[(i, j)] = src[[i, j]];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // - `ndarray` → `nalgebra` copy.
    // - Observed information of quadratic log-likelihoods.
    // - Covariance inversion and the singularity rule.
    // - Partial covariance on degenerate information.
    //
    // Fitted-model inference is covered by the NRM tests.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // The copy helper preserves every entry.
    //
    // Given
    // -----
    // - [[2, 0.5], [0.5, 1]].
    //
    // Expect
    // ------
    // - Identical DMatrix entries.
    fn fill_dmatrix_copies_entries() {
        // Arrange
        let src = array![[2.0, 0.5], [0.5, 1.0]];
        let mut dst = DMatrix::<f64>::zeros(2, 2);

        // Act
        fill_dmatrix(&src, &mut dst);

        // Assert
        assert_eq!(dst[(0, 0)], 2.0);
        assert_eq!(dst[(0, 1)], 0.5);
        assert_eq!(dst[(1, 0)], 0.5);
        assert_eq!(dst[(1, 1)], 1.0);
    }

    #[test]
    // Purpose
    // -------
    // For ℓ(θ) = -½ θᵀAθ the information is A and the covariance A⁻¹.
    //
    // Given
    // -----
    // - A = [[4, 1], [1, 2]], ∇ℓ = -Aθ.
    //
    // Expect
    // ------
    // - J ≈ A and Σ ≈ A⁻¹ = [[2, -1], [-1, 4]] / 7.
    fn covariance_inverts_information_of_quadratic() {
        // Arrange
        let a = array![[4.0, 1.0], [1.0, 2.0]];
        let grad = |t: &Theta| -> OptResult<Grad> { Ok(-a.dot(t)) };
        let theta_hat = array![0.2, -0.1];

        // Act
        let info = observed_information(&grad, &theta_hat).unwrap();
        let cov = calc_covariance(&info).unwrap();

        // Assert
        assert_relative_eq!(info[[0, 0]], 4.0, epsilon = 1e-6);
        assert_relative_eq!(info[[0, 1]], 1.0, epsilon = 1e-6);
        assert_relative_eq!(cov[[0, 0]], 2.0 / 7.0, epsilon = 1e-6);
        assert_relative_eq!(cov[[0, 1]], -1.0 / 7.0, epsilon = 1e-6);
        assert_relative_eq!(cov[[1, 1]], 4.0 / 7.0, epsilon = 1e-6);
    }

    #[test]
    // Purpose
    // -------
    // A flat direction is reported instead of being inverted.
    //
    // Given
    // -----
    // - J = [[1, 1], [1, 1]] (rank one) and J = 0 (1×1).
    //
    // Expect
    // ------
    // - `SingularInformation` for both.
    fn covariance_rejects_singular_information() {
        // Arrange
        let rank_one = array![[1.0, 1.0], [1.0, 1.0]];
        let zero = array![[0.0]];

        // Act / Assert
        assert!(matches!(
            calc_covariance(&rank_one),
            Err(InferenceError::SingularInformation { .. })
        ));
        assert!(matches!(calc_covariance(&zero), Err(InferenceError::SingularInformation { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Negative curvature (a saddle or minimum of ℓ) is not invertible
    // information either.
    //
    // Given
    // -----
    // - J = diag(3, -1).
    //
    // Expect
    // ------
    // - `SingularInformation` with min eigenvalue -1.
    fn covariance_rejects_indefinite_information() {
        // Arrange
        let indefinite = array![[3.0, 0.0], [0.0, -1.0]];

        // Act
        let res = calc_covariance(&indefinite);

        // Assert
        match res {
            Err(InferenceError::SingularInformation { min_eigenvalue, .. }) => {
                assert_relative_eq!(min_eigenvalue, -1.0, epsilon = 1e-12)
            }
            other => panic!("expected SingularInformation, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // A model without coefficients has an empty covariance.
    //
    // Given
    // -----
    // - θ̂ of length zero.
    //
    // Expect
    // ------
    // - 0×0 information and covariance.
    fn empty_coefficient_vector_yields_empty_covariance() {
        // Arrange
        let grad = |_: &Theta| -> OptResult<Grad> { Ok(Grad::zeros(0)) };

        // Act
        let info = observed_information(&grad, &Theta::zeros(0)).unwrap();
        let cov = calc_covariance(&info).unwrap();

        // Assert
        assert_eq!(cov.dim(), (0, 0));
    }

    #[test]
    // Purpose
    // -------
    // A coefficient with vanishing information is set aside and the rest of
    // the information is still inverted.
    //
    // Given
    // -----
    // - J = diag(48.2, 1e-8), the shape of an informative layer fitted next
    //   to a layer whose effect collapsed to zero.
    //
    // Expect
    // ------
    // - `calc_covariance` rejects J; the partial covariance identifies only
    //   the first coefficient with variance 1/48.2.
    fn partial_covariance_sets_aside_vanishing_information() {
        // Arrange
        let info = array![[48.2, 0.0], [0.0, 1e-8]];

        // Act
        let partial = calc_partial_covariance(&info).unwrap();

        // Assert
        assert!(calc_covariance(&info).is_err());
        assert_eq!(partial.identified(), &[true, false]);
        assert!(!partial.is_complete());
        assert!(partial.full().is_none());
        assert_relative_eq!(partial.variance(0).unwrap(), 1.0 / 48.2, epsilon = 1e-12);
        assert_eq!(partial.variance(1), None);
    }

    #[test]
    // Purpose
    // -------
    // Collinear coefficients are both unidentified; an unrelated one keeps
    // its variance, computed from its own block.
    //
    // Given
    // -----
    // - J with a rank-one block [[1, 1], [1, 1]] on coefficients 0 and 2,
    //   and 4 on coefficient 1.
    //
    // Expect
    // ------
    // - Identified pattern (false, true, false) and variance 0.25.
    fn partial_covariance_drops_collinear_pair() {
        // Arrange
        let info = array![[1.0, 0.0, 1.0], [0.0, 4.0, 0.0], [1.0, 0.0, 1.0]];

        // Act
        let partial = calc_partial_covariance(&info).unwrap();

        // Assert
        assert_eq!(partial.identified(), &[false, true, false]);
        assert_relative_eq!(partial.variance(1).unwrap(), 0.25, epsilon = 1e-12);
        assert_eq!(partial.block().dim(), (1, 1));
    }

    #[test]
    // Purpose
    // -------
    // Invertible information gives a complete covariance, and fully
    // degenerate information keeps the original error.
    //
    // Given
    // -----
    // - J = [[4, 1], [1, 2]] and J = 0 (2×2).
    //
    // Expect
    // ------
    // - Complete covariance equal to `calc_covariance`; SingularInformation
    //   for the zero matrix.
    fn partial_covariance_is_complete_or_fails_as_a_whole() {
        // Arrange
        let regular = array![[4.0, 1.0], [1.0, 2.0]];
        let zero = Array2::<f64>::zeros((2, 2));

        // Act
        let partial = calc_partial_covariance(&regular).unwrap();

        // Assert
        assert!(partial.is_complete());
        assert_eq!(partial.full(), Some(&calc_covariance(&regular).unwrap()));
        assert!(matches!(
            calc_partial_covariance(&zero),
            Err(InferenceError::SingularInformation { .. })
        ));
        assert_eq!(
            PartialCovariance::new(vec![true, false], Covariance::zeros((2, 2))),
            Err(InferenceError::DimensionMismatch { expected: 1, found: 2 })
        );
    }
}

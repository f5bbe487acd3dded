//! Numerically stable transforms used by the ensemble likelihood.
//!
//! # Provided items
//! - [`EIGEN_EPS`]: relative floor below which an information eigenvalue is
//!   treated as zero.
//! - [`GENERAL_TOL`]: absolute guard for near-zero denominators.
//! - [`MAX_LOG_EFFECT`]: clamp on raw coefficients before exponentiation.
//! - [`log_sum_exp`], [`softmax_from_logits`]: max-shifted normalization.
//! - [`coef_to_effect`]: `c ↦ exp(min(c, MAX_LOG_EFFECT))` plus derivative.
use ndarray::{Array1, ArrayView1};

/// Relative eigenvalue floor for observed information matrices.
///
/// An eigenvalue `λ` counts as zero when `λ ≤ EIGEN_EPS · max(1, λ_max)`.
pub const EIGEN_EPS: f64 = 1e-8;

/// Absolute tolerance for quantities that should not be divided by.
pub const GENERAL_TOL: f64 = 1e-12;

/// Largest raw coefficient that is exponentiated as-is.
pub const MAX_LOG_EFFECT: f64 = 30.0;

/// `ln Σ exp(xᵢ)` with a max shift.
///
/// Returns `-∞` for an empty slice or when every entry is `-∞`.
pub fn log_sum_exp(x: ArrayView1<f64>) -> f64 {
    let max = x.fold(f64::NEG_INFINITY, |acc, &v| acc.max(v));
    if !max.is_finite() {
        return max;
    }
    let sum: f64 = x.iter().map(|&v| (v - max).exp()).sum();
    max + sum.ln()
}

/// Probabilities `πᵢ = exp(xᵢ - LSE(x))` together with `LSE(x)`.
pub fn softmax_from_logits(x: ArrayView1<f64>) -> (Array1<f64>, f64) {
    let lse = log_sum_exp(x);
    let probs = x.mapv(|v| (v - lse).exp());
    (probs, lse)
}

/// Map a raw coefficient to its multiplicative effect.
///
/// Returns `(β, dβ/dc)`. Below [`MAX_LOG_EFFECT`] both equal `exp(c)`;
/// above it `β` is held at `exp(MAX_LOG_EFFECT)` and the derivative is zero,
/// which keeps the value and gradient of the likelihood consistent.
pub fn coef_to_effect(c: f64) -> (f64, f64) {
    if c > MAX_LOG_EFFECT {
        (MAX_LOG_EFFECT.exp(), 0.0)
    } else {
        let beta = c.exp();
        (beta, beta)
    }
}

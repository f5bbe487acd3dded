//! inference::criteria — information criteria and goodness of fit.
use crate::optimization::numerical_stability::transformations::GENERAL_TOL;

/// Akaike information criterion `2k − 2ℓ`.
pub fn aic(loglik: f64, k: usize) -> f64 {
    2.0 * k as f64 - 2.0 * loglik
}

/// McFadden pseudo-R² `1 − ℓ/ℓ₀`.
///
/// When `|ℓ₀|` is below [`GENERAL_TOL`] the null model already fits
/// perfectly and the ratio is undefined; `0.0` is returned.
pub fn mcfadden_r2(loglik: f64, null_loglik: f64) -> f64 {
    if null_loglik.abs() < GENERAL_TOL {
        return 0.0;
    }
    1.0 - loglik / null_loglik
}

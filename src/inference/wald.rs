//! inference::wald — normal-approximation tests on raw coefficients.
//!
//! z = c / SE(c), two-sided p-value `2Φ(−|z|)`, and Wald intervals
//! `c ± z_{1−α/2} · SE(c)`. All quantities are on the raw coefficient scale
//! `c`, not on the effect scale `exp(c)`.
use crate::inference::errors::{InferenceError, InferenceResult};
use statrs::distribution::{ContinuousCDF, Normal};

/// Per-coefficient Wald summary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaldStat {
    pub std_error: f64,
    pub z_value: f64,
    pub p_value: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
}

/// Two-sided critical value `z_{1−α/2}` for a confidence `level = 1 − α`.
///
/// # Errors
/// [`InferenceError::InvalidConfidenceLevel`] unless `0 < level < 1`.
pub fn critical_value(level: f64) -> InferenceResult<f64> {
    if !(level.is_finite() && level > 0.0 && level < 1.0) {
        return Err(InferenceError::InvalidConfidenceLevel { level });
    }
    Ok(standard_normal()?.inverse_cdf(0.5 + 0.5 * level))
}

/// Two-sided normal p-value `2Φ(−|z|)`.
pub fn two_sided_p_value(z: f64) -> InferenceResult<f64> {
    Ok(2.0 * standard_normal()?.cdf(-z.abs()))
}

/// Wald summaries for `estimates` with standard errors taken from the
/// diagonal of `variances`.
///
/// # Errors
/// - [`InferenceError::DimensionMismatch`] if the lengths differ.
/// - [`InferenceError::InvalidConfidenceLevel`] from [`critical_value`].
pub fn wald_table(
    estimates: &[f64], variances: &[f64], level: f64,
) -> InferenceResult<Vec<WaldStat>> {
    if estimates.len() != variances.len() {
        return Err(InferenceError::DimensionMismatch {
            expected: estimates.len(),
            found: variances.len(),
        });
    }
    let z_crit = critical_value(level)?;
    estimates
        .iter()
        .zip(variances)
        .map(|(&c, &var)| {
            let std_error = var.sqrt();
            let z_value = c / std_error;
            Ok(WaldStat {
                std_error,
                z_value,
                p_value: two_sided_p_value(z_value)?,
                ci_lower: c - z_crit * std_error,
                ci_upper: c + z_crit * std_error,
            })
        })
        .collect()
}

fn standard_normal() -> InferenceResult<Normal> {
    Normal::new(0.0, 1.0).map_err(|_| InferenceError::UnknownError)
}

//! NRMFit — immutable result of one network regression fit.
//!
//! Purpose
//! -------
//! Hold the point estimates of a fitted model together with everything a
//! reporting layer needs: log-likelihoods, AIC, McFadden pseudo-R², the
//! covariance of the identified coefficients, and the optimizer diagnostics.
//!
//! Key behaviors
//! -------------
//! - Goodness of fit is fixed at construction: `aic = 2k − 2ℓ` and
//!   `R² = 1 − ℓ/ℓ₀`.
//! - Inference is per coefficient. A coefficient whose information
//!   vanishes (a flat or collapsed layer, a capped effect, an exact
//!   collinearity) is unidentified: its standard error, p-value and interval
//!   are `None`, while the identified coefficients keep theirs. Only when no
//!   coefficient is identified does the fit store an inference error.
//! - AIC rebasing records a reference value; [`NRMFit::relative_aic`]
//!   subtracts it. Rebasing never touches coefficients or likelihoods, and
//!   rebasing twice with the same reference is the same as once.
//!
//! Invariants & assumptions
//! ------------------------
//! - `coefficients.len() == layers.len()`; every per-coefficient vector has
//!   the same length and order.
//! - The baseline model with no layers is a valid fit with `k = 0`,
//!   `ℓ = ℓ₀` and `R² = 0`.
//!
//! Conventions
//! -----------
//! - Coefficients are on the raw `c` scale; [`NRMFit::effects`] maps them to
//!   multiplicative exponents `exp(c)`.
//! - Wald statistics and intervals are on the `c` scale.
use crate::{
    inference::{
        aic,
        hessian::PartialCovariance,
        mcfadden_r2,
        wald::{WaldStat, wald_table},
    },
    network::errors::{NRMError, NRMResult},
    optimization::{
        loglik_optimizer::{Covariance, OptimOutcome, Theta},
        numerical_stability::coef_to_effect,
    },
};
use ndarray::Array1;

/// One row of a coefficient table.
///
/// `wald` is `None` when the coefficient is not identified.
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientRow {
    pub layer: String,
    pub estimate: f64,
    pub effect: f64,
    pub wald: Option<WaldStat>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NRMFit {
    layers: Vec<String>,
    coefficients: Theta,
    loglik: f64,
    null_loglik: f64,
    aic: f64,
    aic_reference: Option<f64>,
    r2: f64,
    inference: Result<PartialCovariance, NRMError>,
    confidence_level: f64,
    converged: bool,
    outcome: Option<OptimOutcome>,
}

impl NRMFit {
    pub(crate) fn new(
        layers: Vec<String>, coefficients: Theta, loglik: f64, null_loglik: f64,
        inference: Result<PartialCovariance, NRMError>, confidence_level: f64,
        outcome: Option<OptimOutcome>,
    ) -> Self {
        let k = coefficients.len();
        Self {
            layers,
            coefficients,
            loglik,
            null_loglik,
            aic: aic(loglik, k),
            aic_reference: None,
            r2: mcfadden_r2(loglik, null_loglik),
            inference,
            confidence_level,
            converged: outcome.as_ref().map_or(true, |o| o.converged),
            outcome,
        }
    }

    /// Baseline model without layers.
    pub(crate) fn null(null_loglik: f64, confidence_level: f64) -> Self {
        Self::new(
            Vec::new(),
            Theta::zeros(0),
            null_loglik,
            null_loglik,
            Ok(PartialCovariance::complete(Covariance::zeros((0, 0)))),
            confidence_level,
            None,
        )
    }

    /// Layer names in coefficient order.
    pub fn layers(&self) -> &[String] {
        &self.layers
    }

    /// Raw coefficients `c`.
    pub fn coefficients(&self) -> &Theta {
        &self.coefficients
    }

    /// Coefficient of `layer`, if it is part of this model.
    pub fn coefficient(&self, layer: &str) -> Option<f64> {
        self.layers.iter().position(|l| l == layer).map(|i| self.coefficients[i])
    }

    /// Multiplicative exponents `exp(c)`.
    pub fn effects(&self) -> Array1<f64> {
        self.coefficients.mapv(|c| coef_to_effect(c).0)
    }

    pub fn n_coefficients(&self) -> usize {
        self.coefficients.len()
    }

    pub fn loglik(&self) -> f64 {
        self.loglik
    }

    pub fn null_loglik(&self) -> f64 {
        self.null_loglik
    }

    /// Absolute AIC `2k − 2ℓ`, unaffected by rebasing.
    pub fn aic(&self) -> f64 {
        self.aic
    }

    /// AIC minus the rebasing reference (the absolute AIC if never rebased).
    pub fn relative_aic(&self) -> f64 {
        self.aic - self.aic_reference.unwrap_or(0.0)
    }

    pub fn aic_reference(&self) -> Option<f64> {
        self.aic_reference
    }

    /// Report AIC relative to `reference`.
    pub fn rebase_aic(&mut self, reference: f64) {
        self.aic_reference = Some(reference);
    }

    pub fn clear_aic_reference(&mut self) {
        self.aic_reference = None;
    }

    /// McFadden pseudo-R².
    pub fn mcfadden_r2(&self) -> f64 {
        self.r2
    }

    /// `true` when the optimizer met a stopping rule. Always `true` for the
    /// baseline model.
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Optimizer diagnostics; `None` for the baseline model.
    pub fn outcome(&self) -> Option<&OptimOutcome> {
        self.outcome.as_ref()
    }

    pub fn confidence_level(&self) -> f64 {
        self.confidence_level
    }

    /// Full covariance of the raw coefficients, if every coefficient is
    /// identified.
    pub fn covariance(&self) -> Option<&Covariance> {
        self.inference.as_ref().ok().and_then(PartialCovariance::full)
    }

    /// Covariance of the identified coefficients.
    pub fn partial_covariance(&self) -> Option<&PartialCovariance> {
        self.inference.as_ref().ok()
    }

    /// Why inference is unavailable for every coefficient, if it is.
    pub fn inference_error(&self) -> Option<&NRMError> {
        self.inference.as_ref().err()
    }

    /// `true` when every coefficient is identified.
    pub fn has_inference(&self) -> bool {
        self.covariance().is_some()
    }

    /// Whether coefficient `index` has a standard error.
    pub fn is_identified(&self, index: usize) -> bool {
        self.partial_covariance().is_some_and(|p| p.is_identified(index))
    }

    /// Layers whose coefficients are not identified.
    pub fn unidentified_layers(&self) -> Vec<&str> {
        self.layers
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.is_identified(*i))
            .map(|(_, l)| l.as_str())
            .collect()
    }

    /// Standard errors; `None` for unidentified coefficients.
    pub fn std_errors(&self) -> Vec<Option<f64>> {
        (0..self.n_coefficients())
            .map(|i| self.partial_covariance().and_then(|p| p.variance(i)).map(f64::sqrt))
            .collect()
    }

    /// Wald statistics per coefficient; `None` for unidentified coefficients.
    ///
    /// Errors
    /// ------
    /// - The stored inference error when no coefficient is identified.
    /// - [`NRMError::Inference`] if the confidence level is invalid.
    pub fn wald(&self) -> NRMResult<Vec<Option<WaldStat>>> {
        let partial = self.inference.as_ref().map_err(Clone::clone)?;
        let identified: Vec<usize> =
            (0..self.n_coefficients()).filter(|&i| partial.is_identified(i)).collect();
        let estimates: Vec<f64> = identified.iter().map(|&i| self.coefficients[i]).collect();
        let variances = partial.block().diag().to_vec();
        let table = wald_table(&estimates, &variances, self.confidence_level)?;

        let mut rows = vec![None; self.n_coefficients()];
        for (&i, stat) in identified.iter().zip(table) {
            rows[i] = Some(stat);
        }
        Ok(rows)
    }

    /// Two-sided p-values `2Φ(−|c/SE|)`.
    pub fn p_values(&self) -> Vec<Option<f64>> {
        self.wald_rows().iter().map(|w| w.map(|w| w.p_value)).collect()
    }

    /// Wald intervals `(lower, upper)` at the fit's confidence level.
    pub fn confidence_intervals(&self) -> Vec<Option<(f64, f64)>> {
        self.wald_rows().iter().map(|w| w.map(|w| (w.ci_lower, w.ci_upper))).collect()
    }

    /// Coefficient table for renderers.
    pub fn summary(&self) -> Vec<CoefficientRow> {
        let wald = self.wald_rows();
        self.layers
            .iter()
            .enumerate()
            .map(|(i, layer)| CoefficientRow {
                layer: layer.clone(),
                estimate: self.coefficients[i],
                effect: coef_to_effect(self.coefficients[i]).0,
                wald: wald[i],
            })
            .collect()
    }

    // ---- Helper methods ----

    fn wald_rows(&self) -> Vec<Option<WaldStat>> {
        self.wald().unwrap_or_else(|_| vec![None; self.n_coefficients()])
    }
}

/// Rebase every fit in a comparison set on the AIC of `fits[reference]`.
///
/// Errors
/// ------
/// - [`NRMError::InvalidReferenceFit`] if `reference` is out of range.
pub fn rebase_aic(fits: &mut [NRMFit], reference: usize) -> NRMResult<()> {
    let base = fits
        .get(reference)
        .map(NRMFit::aic)
        .ok_or(NRMError::InvalidReferenceFit { index: reference, len: fits.len() })?;
    for fit in fits.iter_mut() {
        fit.rebase_aic(base);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Derived quantities of hand-built fits: AIC, R², Wald rows, partial
    // and missing inference, and AIC rebasing.
    // -------------------------------------------------------------------------

    fn fit_with(cov: Result<PartialCovariance, NRMError>) -> NRMFit {
        NRMFit::new(
            vec!["a".into(), "b".into()],
            array![0.5, -1.0],
            -40.0,
            -50.0,
            cov,
            0.95,
            None,
        )
    }

    #[test]
    // Purpose
    // -------
    // Goodness of fit is computed at construction.
    //
    // Given
    // -----
    // - k = 2, ℓ = -40, ℓ₀ = -50.
    //
    // Expect
    // ------
    // - AIC = 84, R² = 0.2, effects exp(c).
    fn goodness_of_fit_is_derived() {
        // Act
        let fit = fit_with(Ok(PartialCovariance::complete(array![[0.04, 0.0], [0.0, 0.25]])));

        // Assert
        assert_eq!(fit.aic(), 84.0);
        assert_relative_eq!(fit.mcfadden_r2(), 0.2, epsilon = 1e-12);
        assert_relative_eq!(fit.effects()[0], 0.5_f64.exp());
        assert_eq!(fit.coefficient("b"), Some(-1.0));
        assert_eq!(fit.coefficient("z"), None);
    }

    #[test]
    // Purpose
    // -------
    // Wald rows come from the covariance diagonal.
    //
    // Given
    // -----
    // - Var = (0.04, 0.25).
    //
    // Expect
    // ------
    // - SE = (0.2, 0.5), z = (2.5, -2), rows carry Wald stats.
    fn summary_uses_covariance_diagonal() {
        // Arrange
        let fit = fit_with(Ok(PartialCovariance::complete(array![[0.04, 0.0], [0.0, 0.25]])));

        // Act
        let rows = fit.summary();
        let se = fit.std_errors();

        // Assert
        assert_relative_eq!(se[0].unwrap(), 0.2, epsilon = 1e-12);
        let w0 = rows[0].wald.unwrap();
        let w1 = rows[1].wald.unwrap();
        assert_relative_eq!(w0.z_value, 2.5, epsilon = 1e-12);
        assert_relative_eq!(w1.z_value, -2.0, epsilon = 1e-12);
        assert!(w0.p_value < w1.p_value);
        assert_eq!(fit.p_values().len(), 2);
        assert!(fit.has_inference());
        assert!(fit.unidentified_layers().is_empty());
    }

    #[test]
    // Purpose
    // -------
    // An unidentified coefficient loses its inference without taking the
    // other coefficient's with it.
    //
    // Given
    // -----
    // - Coefficient "a" identified with Var = 0.04; "b" unidentified.
    //
    // Expect
    // ------
    // - SE (0.2, None), p-value and interval for "a" only, a Wald row for
    //   "a" only, no full covariance and no inference error.
    fn unidentified_coefficient_keeps_others_inference() {
        // Arrange
        let partial = PartialCovariance::new(vec![true, false], array![[0.04]]).unwrap();

        // Act
        let fit = fit_with(Ok(partial));

        // Assert
        let se = fit.std_errors();
        assert_relative_eq!(se[0].unwrap(), 0.2, epsilon = 1e-12);
        assert_eq!(se[1], None);
        let p = fit.p_values();
        assert!(p[0].unwrap() < 0.05);
        assert_eq!(p[1], None);
        let ci = fit.confidence_intervals();
        let (lo, hi) = ci[0].unwrap();
        assert!(lo < 0.5 && 0.5 < hi);
        assert_eq!(ci[1], None);
        let rows = fit.summary();
        assert_relative_eq!(rows[0].wald.unwrap().z_value, 2.5, epsilon = 1e-12);
        assert!(rows[1].wald.is_none());
        assert!(fit.covariance().is_none());
        assert!(!fit.has_inference());
        assert!(fit.is_identified(0) && !fit.is_identified(1));
        assert_eq!(fit.unidentified_layers(), vec!["b"]);
        assert!(fit.inference_error().is_none());
    }

    #[test]
    // Purpose
    // -------
    // A singular fit keeps its coefficients but reports no inference.
    //
    // Given
    // -----
    // - Covariance replaced by SingularInformation.
    //
    // Expect
    // ------
    // - Coefficients present; SE, p-values, intervals and Wald rows absent;
    //   `wald()` returns the stored error.
    fn singular_fit_marks_inference_unavailable() {
        // Arrange
        let err = NRMError::SingularInformation { min_eigenvalue: 0.0, max_eigenvalue: 3.0 };

        // Act
        let fit = fit_with(Err(err.clone()));

        // Assert
        assert_eq!(fit.coefficients().len(), 2);
        assert!(!fit.has_inference());
        assert!(fit.std_errors().iter().all(Option::is_none));
        assert!(fit.p_values().iter().all(Option::is_none));
        assert!(fit.confidence_intervals().iter().all(Option::is_none));
        assert_eq!(fit.unidentified_layers(), vec!["a", "b"]);
        assert!(fit.summary().iter().all(|r| r.wald.is_none()));
        assert_eq!(fit.wald(), Err(err.clone()));
        assert_eq!(fit.inference_error(), Some(&err));
    }

    #[test]
    // Purpose
    // -------
    // Rebasing is cosmetic and idempotent.
    //
    // Given
    // -----
    // - A null fit (AIC 100) and a two-layer fit (AIC 84).
    //
    // Expect
    // ------
    // - Relative AIC (0, -16) after one or two rebases; absolute AIC,
    //   coefficients and ℓ unchanged; bad reference rejected.
    fn rebase_is_idempotent_and_cosmetic() {
        // Arrange
        let complete = PartialCovariance::complete(Covariance::eye(2));
        let mut fits = vec![NRMFit::null(-50.0, 0.95), fit_with(Ok(complete))];
        let before = fits.clone();

        // Act
        rebase_aic(&mut fits, 0).unwrap();
        let once = fits.clone();
        rebase_aic(&mut fits, 0).unwrap();

        // Assert
        assert_eq!(fits, once);
        assert_eq!(fits[0].relative_aic(), 0.0);
        assert_eq!(fits[1].relative_aic(), -16.0);
        assert_eq!(fits[1].aic(), before[1].aic());
        assert_eq!(fits[1].loglik(), before[1].loglik());
        assert_eq!(fits[1].coefficients(), before[1].coefficients());
        assert_eq!(
            rebase_aic(&mut fits, 5),
            Err(NRMError::InvalidReferenceFit { index: 5, len: 2 })
        );
        fits[1].clear_aic_reference();
        assert_eq!(fits[1].relative_aic(), fits[1].aic());
    }

    #[test]
    // Purpose
    // -------
    // The baseline model is a valid zero-coefficient fit.
    //
    // Given
    // -----
    // - `NRMFit::null(-50, 0.95)`.
    //
    // Expect
    // ------
    // - k = 0, AIC = 100, R² = 0, converged, empty summary.
    fn null_fit_is_degenerate_but_valid() {
        // Act
        let fit = NRMFit::null(-50.0, 0.95);

        // Assert
        assert_eq!(fit.n_coefficients(), 0);
        assert_eq!(fit.aic(), 100.0);
        assert_eq!(fit.mcfadden_r2(), 0.0);
        assert!(fit.converged());
        assert!(fit.summary().is_empty());
        assert!(fit.outcome().is_none());
    }
}

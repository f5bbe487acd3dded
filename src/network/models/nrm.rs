//! NRM — multi-layer network regression fitted by maximum likelihood.
//!
//! This module wires the ensemble likelihood of `core::ensemble` to the
//! `LogLikelihood` trait and turns optimizer output into an [`NRMFit`].
//!
//! Key ideas:
//! - [`NRMModel::new`] validates the adjacency matrix and every candidate
//!   layer once; later fits on any subset of layers only assemble a dense
//!   [`LayerDesign`] and run the optimizer.
//! - Coefficients are unconstrained; each layer enters the propensity as
//!   `w^{exp(c)}`, so the gradient is analytic and L-BFGS needs no bounds.
//! - After convergence the observed information is the negative numerical
//!   Jacobian of the analytic gradient. Coefficients on which it is
//!   degenerate (flat or collapsed layers, capped effects) lose their
//!   inference; the rest keep theirs.
//! - A fit is a pure function of `(model, layers, init)`: the model is never
//!   mutated, so candidate fits can run concurrently on one shared model.
use crate::{
    inference::{calc_partial_covariance, observed_information},
    network::{
        core::{
            ensemble::{EnsembleData, LayerColumn, LayerDesign},
            layers::LayerSet,
            matrix::NetworkMatrix,
            options::{EnsembleConfig, NRMOptions},
        },
        errors::{NRMError, NRMResult},
        models::fit::NRMFit,
    },
    optimization::{
        errors::OptResult,
        loglik_optimizer::{Grad, LogLikelihood, Theta, maximize, validation::validate_theta},
    },
};
use std::collections::HashSet;
use tracing::debug;

/// Network regression model over one observed network and a pool of
/// validated covariate layers.
#[derive(Debug, Clone, PartialEq)]
pub struct NRMModel {
    ensemble: EnsembleData,
    columns: Vec<LayerColumn>,
    options: NRMOptions,
}

impl NRMModel {
    /// Validate `adjacency` and every layer in `layers` under `options`.
    ///
    /// Errors
    /// ------
    /// - Configuration errors from [`EnsembleData::new`] (empty network, no
    ///   admissible dyads, bad counts, asymmetric undirected input).
    /// - Configuration and domain errors from [`EnsembleData::layer_column`]
    ///   (size or label mismatch, invalid or zero-on-observed values).
    pub fn new(
        adjacency: &NetworkMatrix, layers: &LayerSet, options: NRMOptions,
    ) -> NRMResult<Self> {
        let ensemble = EnsembleData::new(adjacency, options.ensemble)?;
        let columns =
            layers.iter().map(|layer| ensemble.layer_column(layer)).collect::<NRMResult<_>>()?;
        debug!(
            nodes = ensemble.n_nodes(),
            dyads = ensemble.n_pairs(),
            interactions = ensemble.total(),
            layers = layers.len(),
            "network regression model ready"
        );
        Ok(Self { ensemble, columns, options })
    }

    pub fn ensemble(&self) -> &EnsembleData {
        &self.ensemble
    }

    pub fn options(&self) -> &NRMOptions {
        &self.options
    }

    /// Names of all available layers, in the order supplied.
    pub fn layer_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name().to_string()).collect()
    }

    /// Dense design for `layers`, in the given order.
    ///
    /// Errors
    /// ------
    /// - [`NRMError::UnknownLayer`] / [`NRMError::DuplicateLayer`].
    pub fn design(&self, layers: &[String]) -> NRMResult<LayerDesign> {
        let mut seen = HashSet::with_capacity(layers.len());
        let mut selected = Vec::with_capacity(layers.len());
        for name in layers {
            if !seen.insert(name.as_str()) {
                return Err(NRMError::DuplicateLayer { name: name.clone() });
            }
            let column = self
                .columns
                .iter()
                .find(|c| c.name() == name)
                .ok_or_else(|| NRMError::UnknownLayer { name: name.clone() })?;
            selected.push(column);
        }
        Ok(self.ensemble.design(&selected))
    }

    /// Log-likelihood of the model with `layers` at `coefficients`.
    pub fn log_likelihood(&self, layers: &[String], coefficients: &Theta) -> NRMResult<f64> {
        let design = self.design(layers)?;
        validate_theta(coefficients, design.n_layers())?;
        Ok(design.log_likelihood(coefficients))
    }

    /// Gradient of [`NRMModel::log_likelihood`] in the raw coefficients.
    pub fn gradient(&self, layers: &[String], coefficients: &Theta) -> NRMResult<Grad> {
        let design = self.design(layers)?;
        validate_theta(coefficients, design.n_layers())?;
        Ok(design.gradient(coefficients))
    }

    /// Baseline fit without layers. Needs no optimization.
    pub fn null_fit(&self) -> NRMFit {
        NRMFit::null(self.ensemble.null_loglik(), self.options.confidence_level())
    }

    /// Fit the model with every available layer.
    pub fn fit_all(&self, init: Option<Theta>) -> NRMResult<NRMFit> {
        self.fit(&self.layer_names(), init)
    }

    /// Fit the model with `layers` by maximum likelihood.
    ///
    /// Parameters
    /// ----------
    /// - `layers`: non-empty list of available layer names; fixes the
    ///   coefficient order.
    /// - `init`: starting coefficients, zeros when `None`.
    ///
    /// Errors
    /// ------
    /// - [`NRMError::EmptyLayerSet`], [`NRMError::UnknownLayer`],
    ///   [`NRMError::DuplicateLayer`].
    /// - [`NRMError::CoefficientLengthMismatch`] /
    ///   [`NRMError::InvalidCoefficient`] for a bad `init`.
    /// - [`NRMError::InvalidOptimizerOptions`] if the solver cannot be built.
    /// - [`NRMError::ConvergenceFailed`] when no stopping rule fired (e.g.
    ///   the iteration cap was hit), [`NRMError::Optimization`] when the
    ///   solver itself failed.
    ///
    /// A singular information matrix is not an error here: the fit is
    /// returned with the unidentified coefficients' inference marked
    /// unavailable.
    pub fn fit(&self, layers: &[String], init: Option<Theta>) -> NRMResult<NRMFit> {
        if layers.is_empty() {
            return Err(NRMError::EmptyLayerSet);
        }
        let design = self.design(layers)?;
        let theta0 = init.unwrap_or_else(|| Theta::zeros(design.n_layers()));
        let outcome = maximize(self, theta0, &design, &self.options.mle)?;
        if !outcome.converged {
            debug!(layers = ?layers, status = %outcome.status, "fit did not converge");
            return Err(NRMError::ConvergenceFailed {
                status: outcome.status,
                iterations: outcome.iterations,
            });
        }

        let theta_hat = outcome.theta_hat.clone();
        let loglik = design.log_likelihood(&theta_hat);
        let grad_ll = |theta: &Theta| self.grad(theta, &design);
        let covariance = observed_information(&grad_ll, &theta_hat)
            .and_then(|info| calc_partial_covariance(&info))
            .map_err(NRMError::from);
        match &covariance {
            Err(err) => debug!(layers = ?layers, error = %err, "inference unavailable"),
            Ok(partial) if !partial.is_complete() => {
                let unidentified: Vec<&String> = layers
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| !partial.is_identified(*i))
                    .map(|(_, l)| l)
                    .collect();
                debug!(?unidentified, "coefficients without inference");
            }
            Ok(_) => {}
        }
        debug!(layers = ?layers, loglik, iterations = outcome.iterations, "fit converged");

        Ok(NRMFit::new(
            layers.to_vec(),
            theta_hat,
            loglik,
            self.ensemble.null_loglik(),
            covariance,
            self.options.confidence_level(),
            Some(outcome),
        ))
    }
}

impl LogLikelihood for NRMModel {
    type Data = LayerDesign;

    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<f64> {
        Ok(data.log_likelihood(theta))
    }

    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()> {
        validate_theta(theta, data.n_layers())
    }

    fn grad(&self, theta: &Theta, data: &Self::Data) -> OptResult<Grad> {
        Ok(data.gradient(theta))
    }
}

/// Fit a network regression of `adjacency` on all of `layers`.
///
/// Errors
/// ------
/// - [`NRMError::EmptyLayerSet`] if `layers` is empty.
/// - Everything [`NRMModel::new`] and [`NRMModel::fit`] report.
pub fn nrm(
    adjacency: &NetworkMatrix, layers: &LayerSet, init: Option<Theta>, options: &NRMOptions,
) -> NRMResult<NRMFit> {
    if layers.is_empty() {
        return Err(NRMError::EmptyLayerSet);
    }
    NRMModel::new(adjacency, layers, options.clone())?.fit_all(init)
}

/// Log-likelihood of `adjacency` given all of `layers` at `coefficients`.
pub fn log_likelihood(
    adjacency: &NetworkMatrix, layers: &LayerSet, coefficients: &Theta, config: EnsembleConfig,
) -> NRMResult<f64> {
    let options = NRMOptions::default().with_ensemble(config);
    let model = NRMModel::new(adjacency, layers, options)?;
    model.log_likelihood(&model.layer_names(), coefficients)
}

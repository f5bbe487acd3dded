//! Forward stepwise selection of predictor bundles by AIC.
//!
//! Purpose
//! -------
//! Grow a network regression one bundle at a time. Each step fits the
//! current model extended by every remaining bundle, keeps the candidate
//! with the lowest AIC, and stops when no candidate improves on the current
//! model or nothing is left to add.
//!
//! Key behaviors
//! -------------
//! - The baseline is the forced bundles (fitted once) or, without forced
//!   bundles, the layer-free null model.
//! - Candidates warm-start from the current coefficients followed by zeros
//!   for the new bundle's layers.
//! - Candidates of one step are independent fits on a shared, immutable
//!   [`NRMModel`] and run on the rayon pool when `parallel` is set. Results
//!   are collected in bundle order before the decision, so the outcome does
//!   not depend on scheduling.
//! - Ties on AIC go to the bundle listed first. A candidate is included only
//!   if its AIC is strictly below the current model's.
//! - A candidate is disqualified for one step only when its fit fails (no
//!   convergence, solver error) or its information cannot be evaluated at
//!   all; it is logged and recorded as a [`CandidateFailure`].
//!   Configuration and domain errors abort.
//! - Singular information does not disqualify: a candidate whose new layer
//!   carries no information still has a well-defined AIC (about two points
//!   above the current model) and simply loses the comparison.
//!
//! Invariants & assumptions
//! ------------------------
//! - Bundles are validated up front: known layers, unique names, no layer in
//!   two bundles.
//! - `trace.fits.len() == trace.included.len() + 1`, and never more than the
//!   number of non-forced bundles plus one.
//!
//! Conventions
//! -----------
//! - `step` counts inclusion rounds from 1; the baseline is step 0.
//! - `tracing` levels: `info!` per completed step, `warn!` per excluded
//!   candidate, `debug!` per candidate result.
//!
//! Testing notes
//! -------------
//! - Unit tests cover bundle validation failures, forced baselines, and the
//!   step cap on a small network. Determinism and the end-to-end selection
//!   order are exercised in the integration tests.
use crate::{
    network::{
        core::{
            layers::{LayerSet, PredictorBundle, validate_bundles},
            matrix::NetworkMatrix,
            options::{NRMOptions, StepwiseOptions},
        },
        errors::{NRMError, NRMResult},
        models::{
            fit::{NRMFit, rebase_aic},
            nrm::NRMModel,
        },
    },
    optimization::loglik_optimizer::Theta,
};
use ndarray::Array1;
use rayon::prelude::*;
use tracing::{debug, info, warn};

/// Why selection stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// No remaining bundle lowered the AIC.
    NoImprovement,
    /// Every bundle was included.
    Exhausted,
    /// The configured step cap was reached.
    MaxSteps,
}

/// Whether every candidate could be evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStatus {
    Complete,
    /// At least one candidate fit was unusable.
    Partial,
}

/// A candidate that could not be evaluated in a step.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFailure {
    pub step: usize,
    pub bundle: String,
    pub error: NRMError,
}

/// Ordered result of a stepwise selection.
///
/// - `fits[0]` is the baseline; `fits[i]` is the model after including
///   `included[i - 1]`.
/// - `forced` lists the bundles in the baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionTrace {
    pub fits: Vec<NRMFit>,
    pub forced: Vec<String>,
    pub included: Vec<String>,
    pub failures: Vec<CandidateFailure>,
    pub termination: Termination,
}

impl SelectionTrace {
    pub fn status(&self) -> SelectionStatus {
        if self.failures.is_empty() { SelectionStatus::Complete } else { SelectionStatus::Partial }
    }

    pub fn baseline(&self) -> Option<&NRMFit> {
        self.fits.first()
    }

    /// Last (best) model of the trace.
    pub fn final_fit(&self) -> Option<&NRMFit> {
        self.fits.last()
    }

    /// Rebase every fit on the AIC of `fits[reference]`.
    pub fn rebase_aic(&mut self, reference: usize) -> NRMResult<()> {
        rebase_aic(&mut self.fits, reference)
    }
}

/// Forward stepwise selection over `bundles` on a prepared model.
///
/// Errors
/// ------
/// - [`NRMError::EmptyLayerSet`], [`NRMError::DuplicateBundle`],
///   [`NRMError::UnknownLayer`], [`NRMError::OverlappingBundles`] from
///   bundle validation; [`NRMError::UnknownBundle`] for a forced name that
///   is not a bundle.
/// - Any error of the forced baseline fit.
/// - The first configuration or domain error raised by a candidate.
pub fn stepwise(
    model: &NRMModel, bundles: &[PredictorBundle], options: &StepwiseOptions,
) -> NRMResult<SelectionTrace> {
    validate_bundles(bundles, &model.layer_names())?;

    let mut remaining: Vec<&PredictorBundle> = Vec::with_capacity(bundles.len());
    let mut forced: Vec<&PredictorBundle> = Vec::with_capacity(options.forced().len());
    for name in options.forced() {
        let bundle = bundles
            .iter()
            .find(|b| b.name() == name)
            .ok_or_else(|| NRMError::UnknownBundle { name: name.clone() })?;
        forced.push(bundle);
    }
    remaining.extend(bundles.iter().filter(|b| !options.forced().iter().any(|f| f == b.name())));

    let mut current_layers: Vec<String> =
        forced.iter().flat_map(|b| b.layers().iter().cloned()).collect();
    let mut current = if current_layers.is_empty() {
        model.null_fit()
    } else {
        model.fit(&current_layers, None)?
    };
    info!(
        forced = ?options.forced(),
        aic = current.aic(),
        candidates = remaining.len(),
        "stepwise selection baseline"
    );

    let mut trace = SelectionTrace {
        fits: vec![current.clone()],
        forced: forced.iter().map(|b| b.name().to_string()).collect(),
        included: Vec::new(),
        failures: Vec::new(),
        termination: Termination::Exhausted,
    };

    let mut step = 0;
    loop {
        if remaining.is_empty() {
            trace.termination = Termination::Exhausted;
            break;
        }
        if options.max_steps().is_some_and(|cap| step >= cap) {
            trace.termination = Termination::MaxSteps;
            break;
        }
        step += 1;

        let results = evaluate_candidates(model, &current, &current_layers, &remaining, options);

        let mut best: Option<(usize, NRMFit)> = None;
        for (pos, result) in results.into_iter().enumerate() {
            let bundle = remaining[pos].name();
            match result {
                Ok(fit) => {
                    debug!(step, bundle, aic = fit.aic(), "candidate evaluated");
                    let better =
                        best.as_ref().map_or(true, |(_, b)| fit.aic().total_cmp(&b.aic()).is_lt());
                    if better {
                        best = Some((pos, fit));
                    }
                }
                Err(error) if error.is_recoverable() => {
                    warn!(step, bundle, %error, "candidate excluded");
                    trace.failures.push(CandidateFailure {
                        step,
                        bundle: bundle.to_string(),
                        error,
                    });
                }
                Err(error) => return Err(error),
            }
        }

        match best {
            Some((pos, fit)) if fit.aic() < current.aic() => {
                let bundle = remaining.remove(pos);
                info!(step, bundle = bundle.name(), aic = fit.aic(), "bundle included");
                current_layers.extend(bundle.layers().iter().cloned());
                trace.included.push(bundle.name().to_string());
                trace.fits.push(fit.clone());
                current = fit;
            }
            _ => {
                info!(step, aic = current.aic(), "no candidate improves AIC");
                trace.termination = Termination::NoImprovement;
                break;
            }
        }
    }

    info!(
        included = ?trace.included,
        termination = ?trace.termination,
        failures = trace.failures.len(),
        "stepwise selection finished"
    );
    Ok(trace)
}

/// Build the model and run [`stepwise`].
///
/// Bundles are validated against `layers` before any matrix work.
pub fn nrm_selection(
    adjacency: &NetworkMatrix, layers: &LayerSet, bundles: &[PredictorBundle],
    options: &NRMOptions, stepwise_options: &StepwiseOptions,
) -> NRMResult<SelectionTrace> {
    validate_bundles(bundles, &layers.names())?;
    let model = NRMModel::new(adjacency, layers, options.clone())?;
    stepwise(&model, bundles, stepwise_options)
}

// ---- Helper methods ----

/// Fit `current + bundle` for every remaining bundle, in bundle order.
///
/// A fit whose information matrix could not be evaluated becomes an error;
/// degenerate (singular) information leaves the fit usable.
fn evaluate_candidates(
    model: &NRMModel, current: &NRMFit, current_layers: &[String],
    remaining: &[&PredictorBundle], options: &StepwiseOptions,
) -> Vec<NRMResult<NRMFit>> {
    let fit_candidate = |bundle: &&PredictorBundle| -> NRMResult<NRMFit> {
        let mut layers = current_layers.to_vec();
        layers.extend(bundle.layers().iter().cloned());
        let init = warm_start(current.coefficients(), bundle.layers().len());
        let fit = model.fit(&layers, Some(init))?;
        match fit.inference_error() {
            Some(err @ NRMError::Inference(_)) => Err(err.clone()),
            _ => Ok(fit),
        }
    };
    if options.parallel() {
        remaining.par_iter().map(fit_candidate).collect()
    } else {
        remaining.iter().map(fit_candidate).collect()
    }
}

/// Current coefficients followed by `extra` zeros.
fn warm_start(current: &Theta, extra: usize) -> Theta {
    let mut init = Array1::zeros(current.len() + extra);
    init.slice_mut(ndarray::s![..current.len()]).assign(current);
    init
}

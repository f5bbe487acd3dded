//! nrm_ghype — multi-layer network regression models with Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that
//! exposes network regression fitting and stepwise layer selection to Python
//! via the `_nrm_ghype` extension module.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules (`network`, `inference`,
//!   `optimization`) as the public crate surface.
//! - Define `#[pyclass]` wrappers ([`NRM`], [`NRMSelection`]) and the
//!   `#[pymodule]` initializer when the `python-bindings` feature is on.
//! - Register the `network_models` submodule under `nrm_ghype` so that
//!   dot-notation imports work.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work lives in the inner modules; this file performs only
//!   FFI glue, input conversion, and error mapping.
//! - Python-visible results are read-only snapshots of [`NRMFit`] and
//!   [`SelectionTrace`], except for AIC rebasing.
//!
//! Conventions
//! -----------
//! - Errors are mapped at the boundary: configuration and domain errors
//!   become `ValueError`, convergence and singular-information errors become
//!   `RuntimeError`.
//! - Unavailable inference is returned as `None` per coefficient, never as
//!   NaN.
//!
//! Downstream usage
//! ----------------
//! - Rust code should depend on [`network`] directly (or its prelude) and can
//!   ignore everything gated behind `python-bindings`.
//! - A reporting layer in Python reads coefficients, `summary`, AIC and
//!   pseudo-R² from the wrappers and renders tables.
//!
//! Testing notes
//! -------------
//! - Numerical behavior is covered by unit tests in the inner modules and by
//!   the integration tests under `tests/`.

pub mod inference;
pub mod network;
pub mod optimization;
pub mod utils;

#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    network::{
        models::{
            fit::NRMFit,
            nrm::NRMModel,
            selection::{SelectionStatus, SelectionTrace, Termination, stepwise},
        },
        core::layers::validate_bundles,
    },
    utils::{
        build_nrm_options, build_stepwise_options, extract_bundles, extract_init, extract_layers,
        extract_mle_opts, extract_network_matrix,
    },
};

/// NRM — Python-facing wrapper for one fitted network regression.
///
/// Purpose
/// -------
/// Fit a gHypEG network regression from Python inputs and expose the
/// resulting [`NRMFit`] through read-only properties.
///
/// Parameters
/// ----------
/// Constructed from Python via `NRM(adj, layers, ...)`:
/// - `adj`: 2-D array-like of non-negative interaction counts.
/// - `layers`: dict mapping layer names to 2-D array-likes of the same size.
/// - `directed`, `selfloops`: ensemble configuration (default `False`).
/// - `init`: optional starting coefficients, one per layer.
/// - `labels`: optional node labels for `adj`.
/// - `combinatorics`: `"degree"` (default) or `"regular"`.
/// - `tol_grad`, `tol_cost`, `max_iter`, `line_searcher`, `lbfgs_mem`,
///   `verbose`: optimizer settings.
/// - `confidence_level`: Wald interval level, default `0.95`.
///
/// Fields
/// ------
/// - `inner`: [`NRMFit`] of the requested model.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "nrm_ghype.network_models")]
#[derive(Clone)]
pub struct NRM {
    inner: NRMFit,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl NRM {
    #[new]
    #[pyo3(
        signature = (
            adj,
            layers,
            directed = false,
            selfloops = false,
            init = None,
            labels = None,
            combinatorics = None,
            tol_grad = None,
            tol_cost = None,
            max_iter = None,
            line_searcher = None,
            lbfgs_mem = None,
            verbose = false,
            confidence_level = 0.95,
        ),
        text_signature = "(adj, layers, /, directed=False, selfloops=False, init=None, \
                          labels=None, combinatorics='degree', tol_grad=None, tol_cost=None, \
                          max_iter=None, line_searcher=None, lbfgs_mem=None, verbose=False, \
                          confidence_level=0.95)"
    )]
    pub fn fit<'py>(
        py: Python<'py>, adj: &Bound<'py, PyAny>, layers: &Bound<'py, PyAny>, directed: bool,
        selfloops: bool, init: Option<&Bound<'py, PyAny>>, labels: Option<Vec<String>>,
        combinatorics: Option<&str>, tol_grad: Option<f64>, tol_cost: Option<f64>,
        max_iter: Option<usize>, line_searcher: Option<&str>, lbfgs_mem: Option<usize>,
        verbose: bool, confidence_level: f64,
    ) -> PyResult<Self> {
        let adjacency = extract_network_matrix(adj, labels)?;
        let layer_set = extract_layers(layers, adjacency.labels())?;
        let init = extract_init(py, init)?;
        let mle =
            extract_mle_opts(tol_grad, tol_cost, max_iter, line_searcher, lbfgs_mem, verbose)?;
        let options =
            build_nrm_options(directed, selfloops, combinatorics, confidence_level, mle)?;
        let inner = py.allow_threads(|| network::nrm(&adjacency, &layer_set, init, &options))?;
        Ok(NRM { inner })
    }

    #[getter]
    pub fn layers(&self) -> Vec<String> {
        self.inner.layers().to_vec()
    }

    /// Raw coefficients as `(layer, c)` pairs.
    #[getter]
    pub fn coefficients(&self) -> Vec<(String, f64)> {
        self.inner.layers().iter().cloned().zip(self.inner.coefficients().iter().copied()).collect()
    }

    #[getter]
    pub fn effects(&self) -> Vec<f64> {
        self.inner.effects().to_vec()
    }

    /// Per layer; `None` for coefficients that are not identified.
    #[getter]
    pub fn std_errors(&self) -> Vec<Option<f64>> {
        self.inner.std_errors()
    }

    #[getter]
    pub fn p_values(&self) -> Vec<Option<f64>> {
        self.inner.p_values()
    }

    #[getter]
    pub fn confidence_intervals(&self) -> Vec<Option<(f64, f64)>> {
        self.inner.confidence_intervals()
    }

    /// Full covariance; `None` unless every coefficient is identified.
    #[getter]
    pub fn covariance(&self) -> Option<Vec<Vec<f64>>> {
        self.inner.covariance().map(|cov| cov.rows().into_iter().map(|r| r.to_vec()).collect())
    }

    /// Layers whose coefficients carry no inference.
    #[getter]
    pub fn unidentified_layers(&self) -> Vec<String> {
        self.inner.unidentified_layers().into_iter().map(String::from).collect()
    }

    /// Why inference is unavailable for every coefficient, if it is.
    #[getter]
    pub fn inference_error(&self) -> Option<String> {
        self.inner.inference_error().map(ToString::to_string)
    }

    #[getter]
    pub fn loglik(&self) -> f64 {
        self.inner.loglik()
    }

    #[getter]
    pub fn null_loglik(&self) -> f64 {
        self.inner.null_loglik()
    }

    #[getter]
    pub fn aic(&self) -> f64 {
        self.inner.aic()
    }

    #[getter]
    pub fn relative_aic(&self) -> f64 {
        self.inner.relative_aic()
    }

    #[getter]
    pub fn r2(&self) -> f64 {
        self.inner.mcfadden_r2()
    }

    #[getter]
    pub fn converged(&self) -> bool {
        self.inner.converged()
    }

    #[getter]
    pub fn iterations(&self) -> Option<usize> {
        self.inner.outcome().map(|o| o.iterations)
    }

    /// Rows `(layer, estimate, effect, se, z, p, ci_lower, ci_upper)`;
    /// inference fields are `None` for unidentified coefficients.
    #[allow(clippy::type_complexity)]
    pub fn summary(
        &self,
    ) -> Vec<(String, f64, f64, Option<f64>, Option<f64>, Option<f64>, Option<f64>, Option<f64>)>
    {
        self.inner
            .summary()
            .into_iter()
            .map(|row| {
                let w = row.wald;
                (
                    row.layer,
                    row.estimate,
                    row.effect,
                    w.map(|w| w.std_error),
                    w.map(|w| w.z_value),
                    w.map(|w| w.p_value),
                    w.map(|w| w.ci_lower),
                    w.map(|w| w.ci_upper),
                )
            })
            .collect()
    }

    /// Report AIC relative to `reference`.
    pub fn rebase_aic(&mut self, reference: f64) {
        self.inner.rebase_aic(reference);
    }
}

/// NRMSelection — Python-facing wrapper for forward stepwise selection.
///
/// Purpose
/// -------
/// Run [`stepwise`] over predictor bundles and expose the
/// [`SelectionTrace`]: the fitted models in inclusion order, the bundle
/// names, excluded candidates, and why the search stopped.
///
/// Parameters
/// ----------
/// As [`NRM`], plus:
/// - `bundles`: optional dict mapping bundle names to lists of layer names;
///   one bundle per layer when omitted.
/// - `forced`: bundle names always in the baseline model.
/// - `max_steps`: optional cap on inclusion steps.
/// - `parallel`: evaluate the candidates of a step concurrently (default
///   `True`).
#[cfg(feature = "python-bindings")]
#[pyclass(module = "nrm_ghype.network_models")]
pub struct NRMSelection {
    inner: SelectionTrace,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl NRMSelection {
    #[new]
    #[pyo3(
        signature = (
            adj,
            layers,
            bundles = None,
            forced = None,
            max_steps = None,
            parallel = true,
            directed = false,
            selfloops = false,
            labels = None,
            combinatorics = None,
            tol_grad = None,
            tol_cost = None,
            max_iter = None,
            line_searcher = None,
            lbfgs_mem = None,
            confidence_level = 0.95,
        ),
        text_signature = "(adj, layers, /, bundles=None, forced=None, max_steps=None, \
                          parallel=True, directed=False, selfloops=False, labels=None, \
                          combinatorics='degree', tol_grad=None, tol_cost=None, max_iter=None, \
                          line_searcher=None, lbfgs_mem=None, confidence_level=0.95)"
    )]
    pub fn select<'py>(
        py: Python<'py>, adj: &Bound<'py, PyAny>, layers: &Bound<'py, PyAny>,
        bundles: Option<&Bound<'py, PyAny>>, forced: Option<Vec<String>>,
        max_steps: Option<usize>, parallel: bool, directed: bool, selfloops: bool,
        labels: Option<Vec<String>>, combinatorics: Option<&str>, tol_grad: Option<f64>,
        tol_cost: Option<f64>, max_iter: Option<usize>, line_searcher: Option<&str>,
        lbfgs_mem: Option<usize>, confidence_level: f64,
    ) -> PyResult<Self> {
        let adjacency = extract_network_matrix(adj, labels)?;
        let layer_set = extract_layers(layers, adjacency.labels())?;
        let bundle_list = extract_bundles(bundles, &layer_set)?;
        validate_bundles(&bundle_list, &layer_set.names())?;
        let mle = extract_mle_opts(tol_grad, tol_cost, max_iter, line_searcher, lbfgs_mem, false)?;
        let options =
            build_nrm_options(directed, selfloops, combinatorics, confidence_level, mle)?;
        let step_options = build_stepwise_options(forced, max_steps, parallel)?;
        let inner = py.allow_threads(|| {
            let model = NRMModel::new(&adjacency, &layer_set, options)?;
            stepwise(&model, &bundle_list, &step_options)
        })?;
        Ok(NRMSelection { inner })
    }

    /// Fitted models: baseline first, then one per included bundle.
    #[getter]
    pub fn fits(&self) -> Vec<NRM> {
        self.inner.fits.iter().map(|fit| NRM { inner: fit.clone() }).collect()
    }

    #[getter]
    pub fn included(&self) -> Vec<String> {
        self.inner.included.clone()
    }

    #[getter]
    pub fn forced(&self) -> Vec<String> {
        self.inner.forced.clone()
    }

    /// Excluded candidates as `(step, bundle, message)`.
    #[getter]
    pub fn failures(&self) -> Vec<(usize, String, String)> {
        self.inner
            .failures
            .iter()
            .map(|f| (f.step, f.bundle.clone(), f.error.to_string()))
            .collect()
    }

    /// `"no_improvement"`, `"exhausted"` or `"max_steps"`.
    #[getter]
    pub fn termination(&self) -> &'static str {
        match self.inner.termination {
            Termination::NoImprovement => "no_improvement",
            Termination::Exhausted => "exhausted",
            Termination::MaxSteps => "max_steps",
        }
    }

    /// `"complete"` or `"partial"`.
    #[getter]
    pub fn status(&self) -> &'static str {
        match self.inner.status() {
            SelectionStatus::Complete => "complete",
            SelectionStatus::Partial => "partial",
        }
    }

    /// Rebase every fit on the AIC of fit number `reference`.
    pub fn rebase_aic(&mut self, reference: usize) -> PyResult<()> {
        Ok(self.inner.rebase_aic(reference)?)
    }
}

/// _nrm_ghype — PyO3 module initializer for the Python extension.
///
/// Creates the `network_models` submodule, attaches it to `_nrm_ghype`, and
/// registers it in `sys.modules` as `nrm_ghype.network_models`.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _nrm_ghype<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let network_models_mod = PyModule::new(_py, "network_models")?;
    network_models(_py, m, &network_models_mod)?;

    // Manually add submodules into sys.modules to allow for dot notation.
    _py.import("sys")?
        .getattr("modules")?
        .set_item("nrm_ghype.network_models", network_models_mod)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn network_models<'py>(
    _py: Python, nrm_ghype: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<NRM>()?;
    m.add_class::<NRMSelection>()?;
    nrm_ghype.add_submodule(m)?;
    Ok(())
}

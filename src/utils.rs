//! utils — conversion helpers for the Python bindings.
//!
//! Everything here is compiled only with the `python-bindings` feature. The
//! helpers turn Python inputs (numpy arrays, pandas objects, nested lists,
//! dicts) into validated Rust types and map library errors to `PyErr`
//! through the `From<NRMError> for PyErr` conversion.
#[cfg(feature = "python-bindings")]
use ndarray::{Array1, Array2};

#[cfg(feature = "python-bindings")]
use pyo3::{
    exceptions::{PyTypeError, PyValueError},
    prelude::*,
    types::{PyAny, PyDict},
};

#[cfg(feature = "python-bindings")]
use crate::{
    network::{
        core::{
            layers::{Layer, LayerSet, PredictorBundle},
            matrix::NetworkMatrix,
            options::{Combinatorics, EnsembleConfig, NRMOptions, StepwiseOptions},
        },
        errors::NRMError,
    },
    optimization::loglik_optimizer::{LineSearcher, MLEOptions, Tolerances},
};

#[cfg(feature = "python-bindings")]
use numpy::{
    IntoPyArray,    // Vec → PyArray
    PyArrayMethods, // .readonly()
    PyReadonlyArray1,
    PyReadonlyArray2,
};

#[cfg(feature = "python-bindings")]
#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<f64>>() {
        if arr_ro.as_slice().is_ok() {
            return Ok(arr_ro);
        }
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(series_ro) = obj.extract::<PyReadonlyArray1<f64>>() {
            if series_ro.as_slice().is_ok() {
                return Ok(series_ro);
            }
        }
    }

    let vec: Vec<f64> = raw_data.extract().map_err(|_| {
        PyTypeError::new_err("expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64")
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

/// Copy a 2-D numpy array, pandas DataFrame, or list of rows into an owned
/// matrix.
#[cfg(feature = "python-bindings")]
pub fn extract_f64_matrix(raw: &Bound<'_, PyAny>) -> PyResult<Array2<f64>> {
    if let Ok(arr) = raw.extract::<PyReadonlyArray2<f64>>() {
        return Ok(arr.as_array().to_owned());
    }

    if let Ok(obj) = raw.call_method0("to_numpy") {
        if let Ok(arr) = obj.extract::<PyReadonlyArray2<f64>>() {
            return Ok(arr.as_array().to_owned());
        }
    }

    let rows: Vec<Vec<f64>> = raw.extract().map_err(|_| {
        PyTypeError::new_err(
            "expected a 2-D numpy.ndarray, pandas.DataFrame, or list of float64 rows",
        )
    })?;
    let n_rows = rows.len();
    let n_cols = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|r| r.len() != n_cols) {
        return Err(PyValueError::new_err("matrix rows must all have the same length"));
    }
    Array2::from_shape_vec((n_rows, n_cols), rows.concat())
        .map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Node labels from a pandas DataFrame index, when it holds strings.
#[cfg(feature = "python-bindings")]
fn extract_index_labels(raw: &Bound<'_, PyAny>) -> Option<Vec<String>> {
    raw.getattr("index").ok()?.call_method0("tolist").ok()?.extract::<Vec<String>>().ok()
}

/// Build a [`NetworkMatrix`]; explicit `labels` win over a DataFrame index.
#[cfg(feature = "python-bindings")]
pub fn extract_network_matrix(
    raw: &Bound<'_, PyAny>, labels: Option<Vec<String>>,
) -> PyResult<NetworkMatrix> {
    let values = extract_f64_matrix(raw)?;
    let labels = labels.or_else(|| extract_index_labels(raw));
    Ok(NetworkMatrix::new(values, labels)?)
}

/// Layers from a `{name: matrix}` dict, in insertion order.
///
/// A layer without index labels is positional: it adopts
/// `adjacency_labels` so that label checks apply to labelled layers only.
#[cfg(feature = "python-bindings")]
pub fn extract_layers(
    raw_layers: &Bound<'_, PyAny>, adjacency_labels: Option<&[String]>,
) -> PyResult<LayerSet> {
    let dict = raw_layers
        .downcast::<PyDict>()
        .map_err(|_| PyTypeError::new_err("layers must be a dict mapping names to matrices"))?;
    let mut set = LayerSet::default();
    for (key, value) in dict.iter() {
        let name: String = key.extract()?;
        let matrix = match (extract_network_matrix(&value, None)?, adjacency_labels) {
            (m, Some(labels)) if m.labels().is_none() => m.with_labels(labels.to_vec())?,
            (m, _) => m,
        };
        set.push(Layer::new(name, matrix))?;
    }
    Ok(set)
}

/// Bundles from a `{bundle: [layer, ...]}` dict; singletons when `None`.
#[cfg(feature = "python-bindings")]
pub fn extract_bundles(
    raw_bundles: Option<&Bound<'_, PyAny>>, layers: &LayerSet,
) -> PyResult<Vec<PredictorBundle>> {
    let Some(raw) = raw_bundles else {
        return Ok(PredictorBundle::singletons(layers));
    };
    let dict = raw
        .downcast::<PyDict>()
        .map_err(|_| PyTypeError::new_err("bundles must be a dict mapping names to layer lists"))?;
    let mut bundles = Vec::with_capacity(dict.len());
    for (key, value) in dict.iter() {
        let name: String = key.extract()?;
        let members: Vec<String> = value.extract()?;
        bundles.push(PredictorBundle::new(name, members)?);
    }
    Ok(bundles)
}

#[cfg(feature = "python-bindings")]
pub fn extract_init<'py>(
    py: Python<'py>, init: Option<&Bound<'py, PyAny>>,
) -> PyResult<Option<Array1<f64>>> {
    init.map(|raw| {
        let arr = extract_f64_array(py, raw)?;
        let slice = arr.as_slice().map_err(|_| {
            PyValueError::new_err("init must be a 1-D contiguous float64 array or sequence")
        })?;
        Ok(Array1::from(slice.to_vec()))
    })
    .transpose()
}

#[cfg(feature = "python-bindings")]
pub fn extract_mle_opts(
    tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    line_searcher: Option<&str>, lbfgs_mem: Option<usize>, verbose: bool,
) -> PyResult<MLEOptions> {
    let defaults = Tolerances::default();
    let tols = Tolerances::new(
        tol_grad.or(defaults.tol_grad),
        tol_cost.or(defaults.tol_cost),
        max_iter.or(defaults.max_iter),
    )
    .map_err(NRMError::from)?;

    let ls = match line_searcher {
        Some(name) => name.parse::<LineSearcher>().map_err(NRMError::from)?,
        None => LineSearcher::default(),
    };

    Ok(MLEOptions::new(tols, ls, verbose, lbfgs_mem).map_err(NRMError::from)?)
}

/// Assemble [`NRMOptions`] from the keyword arguments shared by the Python
/// classes.
#[cfg(feature = "python-bindings")]
pub fn build_nrm_options(
    directed: bool, selfloops: bool, combinatorics: Option<&str>, confidence_level: f64,
    mle: MLEOptions,
) -> PyResult<NRMOptions> {
    let combinatorics = match combinatorics {
        Some(name) => name.parse::<Combinatorics>()?,
        None => Combinatorics::default(),
    };
    let ensemble = EnsembleConfig::new(directed, selfloops, combinatorics);
    Ok(NRMOptions::new(ensemble, mle, confidence_level)?)
}

#[cfg(feature = "python-bindings")]
pub fn build_stepwise_options(
    forced: Option<Vec<String>>, max_steps: Option<usize>, parallel: bool,
) -> PyResult<StepwiseOptions> {
    Ok(StepwiseOptions::new(forced.unwrap_or_default(), max_steps, parallel)?)
}

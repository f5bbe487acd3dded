//! Errors for network regression models (input validation, ensemble domain
//! checks, estimation and inference failures).
//!
//! [`NRMError`] is the single error type returned by the `network` API. Each
//! variant belongs to one [`ErrorKind`]:
//!
//! - `Configuration`: malformed inputs or options. Fatal, raised before any
//!   optimizer work.
//! - `Domain`: a covariate layer cannot be used on this network (negative or
//!   non-finite values, a zero propensity on an observed dyad).
//! - `Convergence`: the optimizer did not reach a stationary point.
//! - `SingularInformation`: a point estimate exists but no coefficient has
//!   a covariance.
//!
//! The last two are recoverable. The stepwise selector records failed fits
//! per candidate and keeps going; a fit that merely lacks inference still
//! competes on AIC.
//!
//! ## Conventions
//! - Node indices are 0-based row/column positions.
//! - Optimizer configuration mistakes are reported as `Configuration`, all
//!   other optimizer failures as `Convergence`.
use crate::{inference::errors::InferenceError, optimization::errors::OptError};

/// Result alias for the `network` API.
pub type NRMResult<T> = Result<T, NRMError>;

/// Coarse classification of [`NRMError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    Domain,
    Convergence,
    SingularInformation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NRMError {
    // ---- Matrix structure ----
    /// A matrix must be square.
    NonSquareMatrix { rows: usize, cols: usize },

    /// Node labels must have one entry per row.
    LabelCountMismatch { expected: usize, found: usize },

    /// Node labels must be unique.
    DuplicateLabel { label: String },

    /// A layer's dimension differs from the adjacency matrix.
    DimensionMismatch { layer: String, expected: usize, found: usize },

    /// A layer's node labels differ from the adjacency labels.
    LabelMismatch { layer: String, index: usize, expected: String, found: String },

    /// Either every matrix carries node labels or none does.
    InconsistentLabels { layer: String, adjacency_labelled: bool },

    // ---- Adjacency ----
    /// Interaction counts must be finite.
    NonFiniteCount { row: usize, col: usize, value: f64 },

    /// Interaction counts must be non-negative.
    NegativeCount { row: usize, col: usize, value: f64 },

    /// Undirected ensembles require a symmetric adjacency matrix.
    AsymmetricAdjacency { row: usize, col: usize },

    /// The network has no nodes or no observed interactions.
    EmptyNetwork { nodes: usize },

    /// No dyad is admissible under the directed/selfloop configuration.
    NoAdmissiblePairs { nodes: usize },

    // ---- Layers and bundles ----
    /// At least one layer (or bundle) is required.
    EmptyLayerSet,

    /// Layer names must be unique.
    DuplicateLayer { name: String },

    /// A referenced layer does not exist.
    UnknownLayer { name: String },

    /// Bundle names must be unique.
    DuplicateBundle { name: String },

    /// A referenced bundle does not exist.
    UnknownBundle { name: String },

    /// A bundle must contain at least one layer.
    EmptyBundle { name: String },

    /// A layer may belong to at most one bundle.
    OverlappingBundles { layer: String, first: String, second: String },

    // ---- Options ----
    /// Coefficient vectors (including starting values) need one entry per
    /// active layer.
    CoefficientLengthMismatch { expected: usize, actual: usize },

    /// Coefficients must be finite.
    InvalidCoefficient { index: usize, value: f64 },

    /// Confidence level must lie strictly between 0 and 1.
    InvalidConfidenceLevel { level: f64 },

    /// Combinatorics name not recognized.
    UnknownCombinatorics { name: String },

    /// Reference index outside a comparison set.
    InvalidReferenceFit { index: usize, len: usize },

    /// A step cap of zero leaves nothing to select.
    InvalidMaxSteps { max_steps: usize },

    /// Optimizer options rejected during validation or solver construction.
    InvalidOptimizerOptions(OptError),

    // ---- Domain ----
    /// Layer values must be finite and non-negative.
    InvalidLayerValue { layer: String, row: usize, col: usize, value: f64 },

    /// A dyad with observed interactions has zero propensity.
    ZeroPropensityOnObservedPair { layer: Option<String>, row: usize, col: usize, count: f64 },

    // ---- Convergence ----
    /// The optimizer stopped without meeting a convergence criterion.
    ConvergenceFailed { status: String, iterations: usize },

    /// The optimizer failed while running.
    Optimization(OptError),

    // ---- Inference ----
    /// Observed information is not invertible.
    SingularInformation { min_eigenvalue: f64, max_eigenvalue: f64 },

    /// The observed information could not be evaluated.
    Inference(InferenceError),
}

impl NRMError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            NRMError::InvalidLayerValue { .. } | NRMError::ZeroPropensityOnObservedPair { .. } => {
                ErrorKind::Domain
            }
            NRMError::ConvergenceFailed { .. } | NRMError::Optimization(_) => {
                ErrorKind::Convergence
            }
            NRMError::SingularInformation { .. } | NRMError::Inference(_) => {
                ErrorKind::SingularInformation
            }
            _ => ErrorKind::Configuration,
        }
    }

    /// `true` for errors that only disqualify one fit: convergence failures
    /// and unavailable inference.
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Convergence | ErrorKind::SingularInformation)
    }
}

impl std::error::Error for NRMError {}

impl std::fmt::Display for NRMError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Matrix structure ----
            NRMError::NonSquareMatrix { rows, cols } => {
                write!(f, "Matrix must be square, got {rows}x{cols}.")
            }
            NRMError::LabelCountMismatch { expected, found } => {
                write!(f, "Expected {expected} node labels, got {found}.")
            }
            NRMError::DuplicateLabel { label } => write!(f, "Node label '{label}' is duplicated."),
            NRMError::DimensionMismatch { layer, expected, found } => write!(
                f,
                "Layer '{layer}' has dimension {found}, adjacency has dimension {expected}."
            ),
            NRMError::LabelMismatch { layer, index, expected, found } => write!(
                f,
                "Layer '{layer}' label at position {index} is '{found}', adjacency has '{expected}'."
            ),
            NRMError::InconsistentLabels { layer, adjacency_labelled } => {
                let (with, without) = if *adjacency_labelled {
                    ("adjacency", "layer")
                } else {
                    ("layer", "adjacency")
                };
                write!(
                    f,
                    "Layer '{layer}': the {with} carries node labels but the {without} does not."
                )
            }

            // ---- Adjacency ----
            NRMError::NonFiniteCount { row, col, value } => {
                write!(f, "Adjacency entry ({row}, {col}) is non-finite: {value}")
            }
            NRMError::NegativeCount { row, col, value } => {
                write!(f, "Adjacency entry ({row}, {col}) is negative: {value}")
            }
            NRMError::AsymmetricAdjacency { row, col } => write!(
                f,
                "Undirected model requires a symmetric adjacency; entries ({row}, {col}) and \
                 ({col}, {row}) differ."
            ),
            NRMError::EmptyNetwork { nodes } => {
                write!(f, "Network with {nodes} nodes has no observed interactions.")
            }
            NRMError::NoAdmissiblePairs { nodes } => {
                write!(f, "Network with {nodes} nodes has no admissible dyads.")
            }

            // ---- Layers and bundles ----
            NRMError::EmptyLayerSet => write!(f, "At least one covariate layer is required."),
            NRMError::DuplicateLayer { name } => write!(f, "Layer '{name}' is duplicated."),
            NRMError::UnknownLayer { name } => write!(f, "Unknown layer '{name}'."),
            NRMError::DuplicateBundle { name } => write!(f, "Bundle '{name}' is duplicated."),
            NRMError::UnknownBundle { name } => write!(f, "Unknown bundle '{name}'."),
            NRMError::EmptyBundle { name } => write!(f, "Bundle '{name}' contains no layers."),
            NRMError::OverlappingBundles { layer, first, second } => {
                write!(f, "Layer '{layer}' appears in bundles '{first}' and '{second}'.")
            }

            // ---- Options ----
            NRMError::CoefficientLengthMismatch { expected, actual } => write!(
                f,
                "Coefficient vector has length {actual}, expected {expected} (one per layer)."
            ),
            NRMError::InvalidCoefficient { index, value } => {
                write!(f, "Coefficient at index {index} must be finite, got {value}")
            }
            NRMError::InvalidConfidenceLevel { level } => {
                write!(f, "Confidence level must lie in (0, 1), got {level}")
            }
            NRMError::UnknownCombinatorics { name } => write!(
                f,
                "Unknown combinatorics '{name}'. Valid options are case insensitive 'degree' or \
                 'regular'."
            ),
            NRMError::InvalidReferenceFit { index, len } => {
                write!(f, "Reference fit {index} is out of range for {len} fits.")
            }
            NRMError::InvalidMaxSteps { max_steps } => {
                write!(f, "Maximum number of selection steps must be positive, got {max_steps}")
            }
            NRMError::InvalidOptimizerOptions(err) => write!(f, "Invalid optimizer options: {err}"),

            // ---- Domain ----
            NRMError::InvalidLayerValue { layer, row, col, value } => write!(
                f,
                "Layer '{layer}' entry ({row}, {col}) must be finite and non-negative, got {value}"
            ),
            NRMError::ZeroPropensityOnObservedPair { layer, row, col, count } => match layer {
                Some(layer) => write!(
                    f,
                    "Layer '{layer}' is zero on dyad ({row}, {col}) which has {count} observed \
                     interactions."
                ),
                None => write!(
                    f,
                    "Dyad ({row}, {col}) has zero combinatorial weight but {count} observed \
                     interactions."
                ),
            },

            // ---- Convergence ----
            NRMError::ConvergenceFailed { status, iterations } => {
                write!(f, "Optimizer did not converge after {iterations} iterations: {status}")
            }
            NRMError::Optimization(err) => write!(f, "Optimizer failed: {err}"),

            // ---- Inference ----
            NRMError::SingularInformation { min_eigenvalue, max_eigenvalue } => write!(
                f,
                "Observed information is singular (min eigenvalue {min_eigenvalue:e}, max \
                 eigenvalue {max_eigenvalue:e}); standard errors are unavailable."
            ),
            NRMError::Inference(err) => write!(f, "{err}"),
        }
    }
}

impl From<OptError> for NRMError {
    fn from(err: OptError) -> NRMError {
        match err {
            OptError::ThetaLengthMismatch { expected, actual } => {
                NRMError::CoefficientLengthMismatch { expected, actual }
            }
            OptError::InvalidThetaInput { index, value } => {
                NRMError::InvalidCoefficient { index, value }
            }
            err if err.is_configuration() => NRMError::InvalidOptimizerOptions(err),
            err => NRMError::Optimization(err),
        }
    }
}

impl From<InferenceError> for NRMError {
    fn from(err: InferenceError) -> NRMError {
        match err {
            InferenceError::SingularInformation { min_eigenvalue, max_eigenvalue } => {
                NRMError::SingularInformation { min_eigenvalue, max_eigenvalue }
            }
            InferenceError::InvalidConfidenceLevel { level } => {
                NRMError::InvalidConfidenceLevel { level }
            }
            err => NRMError::Inference(err),
        }
    }
}

/// Convert an [`NRMError`] into a Python exception: `ValueError` for
/// configuration and domain errors, `RuntimeError` otherwise.
#[cfg(feature = "python-bindings")]
impl From<NRMError> for pyo3::PyErr {
    fn from(err: NRMError) -> pyo3::PyErr {
        use pyo3::exceptions::{PyRuntimeError, PyValueError};
        match err.kind() {
            ErrorKind::Configuration | ErrorKind::Domain => PyValueError::new_err(err.to_string()),
            ErrorKind::Convergence | ErrorKind::SingularInformation => {
                PyRuntimeError::new_err(err.to_string())
            }
        }
    }
}

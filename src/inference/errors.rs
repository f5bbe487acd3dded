//! Error handling for post-estimation inference.
//!
//! `InferenceError` covers failures that happen after a point estimate
//! exists: the observed information could not be formed, it is singular,
//! or a requested summary (confidence level, dimensions) is malformed. The
//! alias `InferenceResult<T>` is used throughout `inference`.
use crate::optimization::errors::OptError;

#[derive(Debug, Clone, PartialEq)]
pub enum InferenceError {
    // ---- Information matrix ----
    /// Smallest eigenvalue of the observed information is not safely
    /// positive, so the inverse does not exist.
    SingularInformation { min_eigenvalue: f64, max_eigenvalue: f64 },

    /// The numerical Hessian could not be evaluated.
    Derivatives(OptError),

    /// Matrix or vector dimensions disagree with the coefficient count.
    DimensionMismatch { expected: usize, found: usize },

    // ---- Summaries ----
    /// Confidence level must lie strictly between 0 and 1.
    InvalidConfidenceLevel { level: f64 },

    // ---- Fallback ----
    UnknownError,
}

pub type InferenceResult<T> = Result<T, InferenceError>;

impl From<OptError> for InferenceError {
    fn from(err: OptError) -> Self {
        InferenceError::Derivatives(err)
    }
}

impl std::error::Error for InferenceError {}

impl std::fmt::Display for InferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Information matrix ----
            InferenceError::SingularInformation { min_eigenvalue, max_eigenvalue } => write!(
                f,
                "Inference Error: Observed information is singular \
                 (min eigenvalue {min_eigenvalue:e}, max eigenvalue {max_eigenvalue:e})"
            ),
            InferenceError::Derivatives(err) => {
                write!(f, "Inference Error: Numerical Hessian failed: {err}")
            }
            InferenceError::DimensionMismatch { expected, found } => {
                write!(f, "Inference Error: Dimension mismatch: expected {expected}, found {found}")
            }

            // ---- Summaries ----
            InferenceError::InvalidConfidenceLevel { level } => {
                write!(f, "Inference Error: Confidence level {level} must lie in (0, 1)")
            }

            // ---- Fallback ----
            InferenceError::UnknownError => write!(f, "Inference Error: Unknown error occurred"),
        }
    }
}

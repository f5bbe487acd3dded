//! Optimizer error surface.
//!
//! Every failure raised while configuring or running the log-likelihood
//! maximizer is normalized into [`OptError`]. Argmin's dynamic errors are
//! downcast into dedicated variants where possible so callers can decide
//! whether a failure is a configuration mistake or a numerical breakdown.
use argmin::core::{ArgminError, Error};

/// Crate-wide result alias for optimizer operations.
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    // ---- Gradient ----
    /// Implies that FD should be used
    GradientNotImplemented,

    /// Gradient dimensions do not match parameter dimensions.
    GradientDimMismatch { expected: usize, found: usize },

    /// Gradient elements need to be finite.
    InvalidGradient { index: usize, value: f64, reason: &'static str },

    // ---- MLEOptions ----
    /// Gradient tolerance needs to be positive and finite.
    InvalidTolGrad { tol: f64, reason: &'static str },

    /// Cost change tolerance needs to be positive and finite.
    InvalidTolCost { tol: f64, reason: &'static str },

    /// Maximum iterations needs to be positive.
    InvalidMaxIter { max_iter: usize, reason: &'static str },

    /// At least one tolerance must be provided.
    NoTolerancesProvided,

    /// Invalid line searcher name.
    InvalidLineSearch { name: String, reason: &'static str },

    /// lbfgs_mem needs to be at least 1.
    InvalidLBFGSMem { mem: usize, reason: &'static str },

    // ---- Parameter vector ----
    /// Coefficient vector length does not match the number of active layers.
    ThetaLengthMismatch { expected: usize, actual: usize },

    /// Coefficient entries must be finite.
    InvalidThetaInput { index: usize, value: f64 },

    /// The objective has no free parameters.
    EmptyTheta,

    // ---- Cost function ----
    /// Cost function returned a non-finite value.
    NonFiniteCost { value: f64 },

    // ---- Optimizer outcome ----
    /// Estimated parameters must be finite.
    InvalidThetaHat { index: usize, value: f64, reason: &'static str },

    /// Theta hat is missing.
    MissingThetaHat,

    // ---- Argmin ----
    /// Wrapper for argmin::InvalidParameter
    InvalidParameter { text: String },
    /// Wrapper for argmin::NotImplemented
    NotImplemented { text: String },
    /// Wrapper for argmin::NotInitialized
    NotInitialized { text: String },
    /// Wrapper for argmin::ConditionViolated
    ConditionViolated { text: String },
    /// Wrapper for argmin::CheckPointNotFound
    CheckPointNotFound { text: String },
    /// Wrapper for argmin::PotentialBug
    PotentialBug { text: String },
    /// Wrapper for argmin::ImpossibleError
    ImpossibleError { text: String },
    /// Wrapper for other argmin::Error types
    BackendError { text: String },

    // ---- Finite Diffs ----
    /// Hessian matrix dimensions do not match parameter dimensions.
    HessianDimMismatch { expected: usize, found: (usize, usize) },

    /// Hessian values need to be finite.
    InvalidHessian { row: usize, col: usize, value: f64 },

    // ---- Fallback ----
    UnknownError,
}

impl OptError {
    /// True for errors caused by the caller's options rather than by the
    /// objective or the solver run.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            OptError::InvalidTolGrad { .. }
                | OptError::InvalidTolCost { .. }
                | OptError::InvalidMaxIter { .. }
                | OptError::NoTolerancesProvided
                | OptError::InvalidLineSearch { .. }
                | OptError::InvalidLBFGSMem { .. }
                | OptError::ThetaLengthMismatch { .. }
                | OptError::InvalidThetaInput { .. }
                | OptError::EmptyTheta
        )
    }
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Gradient ----
            OptError::GradientNotImplemented => {
                write!(f, "Gradient optimization not implemented")
            }
            OptError::GradientDimMismatch { expected, found } => {
                write!(f, "Gradient dimension mismatch: expected {expected}, found {found}")
            }
            OptError::InvalidGradient { index, value, reason } => {
                write!(f, "Invalid gradient at index {index}: {value}: {reason}")
            }

            // ---- MLEOptions ----
            OptError::InvalidTolGrad { tol, reason } => {
                write!(f, "Invalid gradient tolerance {tol}: {reason}")
            }
            OptError::InvalidTolCost { tol, reason } => {
                write!(f, "Invalid cost function change tolerance {tol}: {reason}")
            }
            OptError::InvalidMaxIter { max_iter, reason } => {
                write!(f, "Invalid maximum iterations {max_iter}: {reason}")
            }
            OptError::NoTolerancesProvided => write!(f, "No tolerances provided"),
            OptError::InvalidLineSearch { name, reason } => {
                write!(f, "Invalid line searcher '{name}': {reason}")
            }
            OptError::InvalidLBFGSMem { mem, reason } => {
                write!(f, "Invalid L-BFGS memory {mem}: {reason}")
            }

            // ---- Parameter vector ----
            OptError::ThetaLengthMismatch { expected, actual } => {
                write!(f, "Coefficient length mismatch: expected {expected}, actual {actual}")
            }
            OptError::InvalidThetaInput { index, value } => {
                write!(f, "Invalid coefficient at index {index}: {value}, must be finite")
            }
            OptError::EmptyTheta => write!(f, "Objective has no free parameters"),

            // ---- Cost function ----
            OptError::NonFiniteCost { value } => write!(f, "Non-finite cost value: {value}"),

            // ---- Optimizer outcome ----
            OptError::InvalidThetaHat { index, value, reason } => {
                write!(f, "Invalid estimated parameter at index {index}: {value}: {reason}")
            }
            OptError::MissingThetaHat => write!(f, "Missing estimated parameters (theta hat)"),

            // ---- Argmin ----
            OptError::InvalidParameter { text } => write!(f, "Invalid parameter: {text}"),
            OptError::NotImplemented { text } => write!(f, "Not implemented: {text}"),
            OptError::NotInitialized { text } => write!(f, "Not initialized: {text}"),
            OptError::ConditionViolated { text } => write!(f, "Condition violated: {text}"),
            OptError::CheckPointNotFound { text } => write!(f, "Checkpoint not found: {text}"),
            OptError::PotentialBug { text } => write!(f, "Potential bug: {text}"),
            OptError::ImpossibleError { text } => write!(f, "Impossible error: {text}"),
            OptError::BackendError { text } => write!(f, "Backend error: {text}"),

            // ---- Finite Diffs ----
            OptError::HessianDimMismatch { expected, found } => {
                write!(
                    f,
                    "Hessian dimension mismatch: expected ({expected}, {expected}), found {found:?}"
                )
            }
            OptError::InvalidHessian { row, col, value } => {
                write!(f, "Invalid Hessian at ({row}, {col}): {value}, must be finite")
            }

            // ---- Fallback ----
            OptError::UnknownError => write!(f, "Unknown error"),
        }
    }
}

impl From<Error> for OptError {
    fn from(original_err: Error) -> Self {
        // Errors raised by our own cost/gradient code travel through argmin
        // as `anyhow` payloads; recover them first.
        let original_err = match original_err.downcast::<OptError>() {
            Ok(opt_err) => return opt_err,
            Err(err) => err,
        };
        match original_err.downcast() {
            Ok(opt_err) => match opt_err {
                ArgminError::InvalidParameter { text } => OptError::InvalidParameter { text },
                ArgminError::NotImplemented { text } => OptError::NotImplemented { text },
                ArgminError::NotInitialized { text } => OptError::NotInitialized { text },
                ArgminError::ConditionViolated { text } => OptError::ConditionViolated { text },
                ArgminError::CheckpointNotFound { text } => OptError::CheckPointNotFound { text },
                ArgminError::PotentialBug { text } => OptError::PotentialBug { text },
                ArgminError::ImpossibleError { text } => OptError::ImpossibleError { text },
                _ => OptError::UnknownError,
            },
            Err(err) => OptError::BackendError { text: err.to_string() },
        }
    }
}

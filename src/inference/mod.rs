//! inference — uncertainty and fit quality for estimated network regressions.
//!
//! Purpose
//! -------
//! Everything computed after the optimizer has returned a point estimate:
//! the observed information and its inverse, Wald statistics on the raw
//! coefficients, and the information criteria used to compare fits.
//!
//! Key behaviors
//! -------------
//! - [`observed_information`] / [`calc_covariance`]: numerical Hessian of
//!   the analytic gradient, symmetric eigendecomposition, singularity check.
//! - [`calc_partial_covariance`]: on singular information, the covariance of
//!   the identified coefficients only.
//! - [`wald_table`]: standard errors, z values, two-sided normal p-values and
//!   confidence intervals (`statrs` normal distribution).
//! - [`aic`] and [`mcfadden_r2`]: pure functions of log-likelihoods and the
//!   coefficient count.
//!
//! Invariants & assumptions
//! ------------------------
//! - Coefficients are on the raw `c` scale used by the optimizer.
//! - A singular information matrix is never pseudo-inverted: it is either
//!   split into identified and unidentified coefficients or an error.
//!
//! Conventions
//! -----------
//! - Failures are reported through [`InferenceError`] / [`InferenceResult`].
//! - Pure numerical code: no logging and no global state.
//!
//! Downstream usage
//! ----------------
//! - `network::models::fit::NRMFit` stores the partial covariance (or the
//!   singularity error) and derives its coefficient table from [`wald_table`].
//! - The stepwise selector compares fits through [`aic`].
//!
//! Testing notes
//! -------------
//! - Each submodule carries unit tests against closed-form references.

pub mod criteria;
pub mod errors;
pub mod hessian;
pub mod wald;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::criteria::{aic, mcfadden_r2};
pub use self::errors::{InferenceError, InferenceResult};
pub use self::hessian::{
    PartialCovariance, calc_covariance, calc_partial_covariance, observed_information,
};
pub use self::wald::{WaldStat, critical_value, two_sided_p_value, wald_table};

pub mod prelude {
    pub use super::criteria::{aic, mcfadden_r2};
    pub use super::errors::{InferenceError, InferenceResult};
    pub use super::hessian::{
        PartialCovariance, calc_covariance, calc_partial_covariance, observed_information,
    };
    pub use super::wald::{WaldStat, wald_table};
}

//! models — network regression fits and stepwise selection.
//!
//! Purpose
//! -------
//! Sit on top of `network::core`: wire the ensemble likelihood to the
//! generic optimizer, package results as [`NRMFit`], and search over
//! predictor bundles by AIC.
//!
//! Key behaviors
//! -------------
//! - [`NRMModel`] implements `LogLikelihood` with an analytic gradient and
//!   fits any subset of its validated layers ([`nrm`] is the one-shot entry
//!   point).
//! - [`NRMFit`] is the immutable result object with inference, AIC,
//!   pseudo-R² and AIC rebasing ([`rebase_aic`]).
//! - [`stepwise`] / [`nrm_selection`] run forward selection and return a
//!   [`SelectionTrace`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Fits never mutate the model; one model can serve concurrent fits.
//! - Coefficient order always follows the order of the requested layers.

pub mod fit;
pub mod nrm;
pub mod selection;

pub use self::fit::{CoefficientRow, NRMFit, rebase_aic};
pub use self::nrm::{NRMModel, log_likelihood, nrm};
pub use self::selection::{
    CandidateFailure, SelectionStatus, SelectionTrace, Termination, nrm_selection, stepwise,
};

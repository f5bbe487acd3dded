//! optimization — likelihood maximization stack and numerical helpers.
//!
//! Purpose
//! -------
//! Provide the optimizer layer shared by every network regression fit: an
//! Argmin-backed L-BFGS maximizer for log-likelihoods, finite-difference
//! derivative helpers, numerically stable primitives for the ensemble
//! likelihood, and a single optimizer error surface.
//!
//! Key behaviors
//! -------------
//! - Maximize a user log-likelihood `ℓ(θ)` through [`loglik_optimizer`],
//!   which validates the start, builds an L-BFGS solver with the configured
//!   line search, runs it, and normalizes the result into an `OptimOutcome`.
//! - Supply the log-sum-exp and coefficient → effect transforms used by the
//!   likelihood engine through [`numerical_stability`].
//! - Collapse configuration mistakes, numerical failures, and Argmin backend
//!   errors into [`errors::OptError`] with the alias `OptResult<T>`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Optimization always happens in an unconstrained coefficient space; the
//!   model layer maps raw coefficients to positive multiplicative effects.
//! - Objective implementations report invalid inputs as `OptError` values,
//!   never panics.
//!
//! Conventions
//! -----------
//! - Solvers minimize the cost `c(θ) = -ℓ(θ)`; every user-facing value in
//!   this module is expressed on the log-likelihood scale.
//! - Vectors and matrices use the `ndarray` aliases from
//!   `loglik_optimizer::types`.
//! - The only logging performed here is `tracing` output at `debug`/`trace`
//!   level around solver runs; no subscriber is installed.
//!
//! Downstream usage
//! ----------------
//! - `network::models::nrm::NRMModel` implements `LogLikelihood` and calls
//!   `maximize` once per fit.
//! - `inference::hessian` reuses `finite_diff::compute_hessian` to build the
//!   observed information at the optimum.
//!
//! Testing notes
//! -------------
//! - Unit tests in the submodules cover tolerance validation, solver
//!   construction, finite-difference fallbacks, and stable transforms.
//! - End-to-end behavior is covered by the network integration tests.

pub mod errors;
pub mod loglik_optimizer;
pub mod numerical_stability;

// ---- Optional convenience prelude for downstream crates -------------------

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::loglik_optimizer::prelude::*;
    pub use super::numerical_stability::prelude::*;
}

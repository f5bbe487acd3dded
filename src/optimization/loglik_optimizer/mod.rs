//! loglik_optimizer — Argmin-backed maximum-likelihood optimizer.
//!
//! Purpose
//! -------
//! Maximize a log-likelihood `ℓ(θ)` over an unconstrained coefficient
//! vector. The network regression model implements [`LogLikelihood`] and
//! calls [`maximize`]; everything Argmin-specific stays inside this module.
//!
//! Key behaviors
//! -------------
//! - [`adapter::ArgMinAdapter`] exposes `c(θ) = -ℓ(θ)` to Argmin, negating
//!   analytic gradients and falling back to finite differences.
//! - [`builders`] construct L-BFGS with a More–Thuente or Hager–Zhang line
//!   search; [`run::run_lbfgs`] executes it.
//! - [`finite_diff`] also provides the Hessian routines used by the
//!   inference layer to form observed information.
//! - [`OptimOutcome::converged`] is `true` only when a gradient or cost
//!   stopping rule fired.
//!
//! Invariants & assumptions
//! ------------------------
//! - Models implement `ℓ` and `∇ℓ`, never the cost.
//! - Invalid inputs are reported as [`OptError`](crate::optimization::errors::OptError)
//!   values; nothing here panics on bad data.
//! - Runs are deterministic for identical inputs and options.
//!
//! Testing notes
//! -------------
//! - Submodules carry unit tests for validation, sign conventions,
//!   builders and toy end-to-end runs.
//! - NRM fits in `network::models` exercise the full path.

pub mod adapter;
pub mod api;
pub mod builders;
pub mod finite_diff;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::maximize;
pub use self::traits::{LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances};
pub use self::types::{Cost, Covariance, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Hessian, Theta};

pub mod prelude {
    pub use super::api::maximize;
    pub use super::traits::{LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances};
    pub use super::types::{Cost, Grad, Theta};
}

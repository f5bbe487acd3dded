//! numerical_stability — overflow-safe primitives for the ensemble likelihood.
//!
//! Purpose
//! -------
//! Keep the handful of numerically delicate operations of the network
//! regression likelihood in one place: normalizing log-weights over all
//! dyads, mapping raw coefficients to positive effects, and the shared
//! tolerances used when inspecting information matrices.
//!
//! Key behaviors
//! -------------
//! - [`log_sum_exp`] and [`softmax_from_logits`] normalize dyad log-weights
//!   with a max shift so large propensities never overflow.
//! - [`coef_to_effect`] maps `c ↦ β = exp(c)` with an upper clamp and returns
//!   the matching derivative, zero on the clamped branch.
//! - [`EIGEN_EPS`] and [`GENERAL_TOL`] are the crate-wide thresholds for
//!   singular information and near-zero denominators.
//!
//! Conventions
//! -----------
//! - Pure functions over `f64` and `ndarray` views; no logging, no I/O.
//! - Inputs are assumed finite; the network layer validates data before it
//!   reaches these helpers.

pub mod transformations;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::transformations::{
    EIGEN_EPS, GENERAL_TOL, MAX_LOG_EFFECT, coef_to_effect, log_sum_exp, softmax_from_logits,
};

pub mod prelude {
    pub use super::transformations::{
        EIGEN_EPS, GENERAL_TOL, coef_to_effect, log_sum_exp, softmax_from_logits,
    };
}

//! core — network data containers, options and the ensemble likelihood.
//!
//! Purpose
//! -------
//! Hold everything a network regression needs before any optimization runs:
//! validated matrices, named covariate layers and predictor bundles, the
//! configuration structs, and the dyad-level ensemble that evaluates the
//! log-likelihood and its gradient.
//!
//! Key behaviors
//! -------------
//! - [`NetworkMatrix`]: square matrix plus optional node labels.
//! - [`Layer`], [`LayerSet`], [`PredictorBundle`]: named covariates and the
//!   groups they are selected in.
//! - [`EnsembleConfig`], [`NRMOptions`], [`StepwiseOptions`]: validated
//!   settings.
//! - [`EnsembleData`] / [`LayerDesign`]: sufficient statistics of the
//!   observed network and the dense per-fit design.
//!
//! Invariants & assumptions
//! ------------------------
//! - All matrices of one analysis have the same size and, when labelled, the
//!   same node labels in the same order.
//! - Inputs are never mutated; every fit reads shared, immutable data.
//!
//! Conventions
//! -----------
//! - 0-based node indices; entry `(i, j)` is the dyad `i → j`.
//! - No I/O and no logging in this module.

pub mod ensemble;
pub mod layers;
pub mod matrix;
pub mod options;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::ensemble::{EnsembleData, LayerColumn, LayerDesign};
pub use self::layers::{Layer, LayerSet, PredictorBundle, validate_bundles};
pub use self::matrix::NetworkMatrix;
pub use self::options::{Combinatorics, EnsembleConfig, NRMOptions, StepwiseOptions};

//! network — multi-layer network regression models (gHypEG).
//!
//! Purpose
//! -------
//! Explain an observed interaction network by a combination of covariate
//! networks. Each layer scales the propensity of every dyad multiplicatively,
//! raised to an exponentiated coefficient, inside a generalized
//! hypergeometric ensemble that preserves the observed degrees. Coefficients
//! are estimated by maximum likelihood and layers are selected by AIC.
//!
//! Key behaviors
//! -------------
//! - [`core`]: validated matrices, layers and bundles, options, and the
//!   ensemble likelihood engine.
//! - [`models`]: [`NRMModel`], [`NRMFit`] and forward stepwise selection.
//! - [`errors`]: [`NRMError`] with its [`ErrorKind`] classification.
//!
//! Invariants & assumptions
//! ------------------------
//! - Adjacency entries are non-negative finite counts or indicators.
//! - Layer entries are finite and non-negative; zeros are only allowed on
//!   dyads without observed interactions.
//! - All matrices share one node order (and labels when present).
//!
//! Conventions
//! -----------
//! - Raw coefficients `c` live on the real line; the multiplicative exponent
//!   of a layer is `exp(c)`, so `c = 0` means the layer enters unscaled and
//!   the layer-free model is the null model.
//! - Wald inference is reported on the `c` scale.
//! - Logging goes through `tracing`; the library never installs a
//!   subscriber.
//!
//! Downstream usage
//! ----------------
//! 1. Build a [`NetworkMatrix`] of counts and a [`LayerSet`] of covariates.
//! 2. Call [`nrm`] for one fit, or [`nrm_selection`] with
//!    [`PredictorBundle`]s for stepwise selection.
//! 3. Read coefficients, [`NRMFit::summary`], AIC and pseudo-R² from the
//!    results; rebase AICs with [`rebase_aic`] for relative comparison.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each submodule; `tests/` holds end-to-end
//!   scenarios on a five-node network.

pub mod core;
pub mod errors;
pub mod models;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::core::{
    Combinatorics, EnsembleConfig, EnsembleData, Layer, LayerDesign, LayerSet, NRMOptions,
    NetworkMatrix, PredictorBundle, StepwiseOptions,
};

pub use self::errors::{ErrorKind, NRMError, NRMResult};

pub use self::models::{
    CandidateFailure, CoefficientRow, NRMFit, NRMModel, SelectionStatus, SelectionTrace,
    Termination, log_likelihood, nrm, nrm_selection, rebase_aic, stepwise,
};

// ---- Optional convenience prelude for downstream crates -------------------
//
//     use nrm_ghype::network::prelude::*;

pub mod prelude {
    pub use super::{
        Combinatorics, EnsembleConfig, ErrorKind, Layer, LayerSet, NRMError, NRMFit, NRMModel,
        NRMOptions, NRMResult, NetworkMatrix, PredictorBundle, SelectionStatus, SelectionTrace,
        StepwiseOptions, Termination, nrm, nrm_selection, rebase_aic,
    };
}

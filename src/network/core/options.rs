//! Network regression options — ensemble, estimation and selection settings.
//!
//! Purpose
//! -------
//! Collect every configuration knob of the network stack in validated
//! structs so fitting and selection entry points take explicit options
//! instead of loose flags.
//!
//! Key behaviors
//! -------------
//! - [`EnsembleConfig`] fixes how the adjacency matrix is read: directed or
//!   undirected dyads, whether self-loops are admissible, and which
//!   combinatorial weights ([`Combinatorics`]) enter the ensemble.
//! - [`NRMOptions`] bundles the ensemble, the optimizer settings
//!   ([`MLEOptions`]) and the confidence level used for Wald intervals.
//! - [`StepwiseOptions`] configures forward selection: forced baseline
//!   bundles, an optional step cap, and parallel candidate evaluation.
//!
//! Invariants & assumptions
//! ------------------------
//! - `NRMOptions::confidence_level` lies strictly in `(0, 1)`.
//! - `StepwiseOptions::max_steps`, when set, is positive.
//! - `MLEOptions` is validated by its own constructor.
//!
//! Conventions
//! -----------
//! - Defaults: undirected, no self-loops, degree combinatorics, default
//!   optimizer settings, 95% intervals, no forced bundles, no step cap,
//!   parallel candidates.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the documented defaults and every rejection path.
use crate::{
    network::errors::{NRMError, NRMResult},
    optimization::loglik_optimizer::MLEOptions,
};
use std::str::FromStr;

/// Combinatorial weights `Ξ` of the ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Combinatorics {
    /// `Ξ_ij = k_i^out · k_j^in` (directed) or `k_i · k_j` (undirected).
    #[default]
    Degree,
    /// `Ξ_ij = 1` for every admissible dyad.
    Regular,
}

impl FromStr for Combinatorics {
    type Err = NRMError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "degree" => Ok(Combinatorics::Degree),
            "regular" => Ok(Combinatorics::Regular),
            _ => Err(NRMError::UnknownCombinatorics { name: s.to_string() }),
        }
    }
}

/// How the adjacency matrix is turned into a dyad ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnsembleConfig {
    pub directed: bool,
    pub selfloops: bool,
    pub combinatorics: Combinatorics,
}

impl EnsembleConfig {
    pub fn new(directed: bool, selfloops: bool, combinatorics: Combinatorics) -> Self {
        Self { directed, selfloops, combinatorics }
    }
}

/// Options for a single network regression fit.
///
/// Fields
/// ------
/// - `ensemble`: dyad ensemble configuration.
/// - `mle`: optimizer tolerances, line search and L-BFGS memory.
/// - `confidence_level`: level of the Wald intervals reported by fits.
#[derive(Debug, Clone, PartialEq)]
pub struct NRMOptions {
    pub ensemble: EnsembleConfig,
    pub mle: MLEOptions,
    confidence_level: f64,
}

impl NRMOptions {
    /// Errors
    /// ------
    /// - [`NRMError::InvalidConfidenceLevel`] unless `0 < level < 1`.
    pub fn new(
        ensemble: EnsembleConfig, mle: MLEOptions, confidence_level: f64,
    ) -> NRMResult<Self> {
        validate_confidence_level(confidence_level)?;
        Ok(Self { ensemble, mle, confidence_level })
    }

    pub fn confidence_level(&self) -> f64 {
        self.confidence_level
    }

    /// Copy with a different ensemble configuration.
    pub fn with_ensemble(mut self, ensemble: EnsembleConfig) -> Self {
        self.ensemble = ensemble;
        self
    }
}

impl Default for NRMOptions {
    fn default() -> Self {
        Self {
            ensemble: EnsembleConfig::default(),
            mle: MLEOptions::default(),
            confidence_level: 0.95,
        }
    }
}

/// Options for forward stepwise selection.
///
/// Fields
/// ------
/// - `forced`: names of bundles always included in the baseline model.
/// - `max_steps`: cap on the number of inclusion steps (`None` = no cap).
/// - `parallel`: evaluate the candidates of one step on the rayon pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepwiseOptions {
    forced: Vec<String>,
    max_steps: Option<usize>,
    parallel: bool,
}

impl StepwiseOptions {
    /// Errors
    /// ------
    /// - [`NRMError::InvalidMaxSteps`] if `max_steps == Some(0)`.
    /// - [`NRMError::DuplicateBundle`] if a forced bundle is listed twice.
    pub fn new(forced: Vec<String>, max_steps: Option<usize>, parallel: bool) -> NRMResult<Self> {
        if let Some(0) = max_steps {
            return Err(NRMError::InvalidMaxSteps { max_steps: 0 });
        }
        for (i, name) in forced.iter().enumerate() {
            if forced[..i].contains(name) {
                return Err(NRMError::DuplicateBundle { name: name.clone() });
            }
        }
        Ok(Self { forced, max_steps, parallel })
    }

    pub fn forced(&self) -> &[String] {
        &self.forced
    }

    pub fn max_steps(&self) -> Option<usize> {
        self.max_steps
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }
}

impl Default for StepwiseOptions {
    fn default() -> Self {
        Self { forced: Vec::new(), max_steps: None, parallel: true }
    }
}

// ---- Helper methods ----

fn validate_confidence_level(level: f64) -> NRMResult<()> {
    if !(level.is_finite() && level > 0.0 && level < 1.0) {
        return Err(NRMError::InvalidConfidenceLevel { level });
    }
    Ok(())
}

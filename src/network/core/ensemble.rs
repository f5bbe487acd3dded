//! ensemble — dyad-level likelihood engine of the generalized hypergeometric
//! ensemble (gHypEG).
//!
//! Purpose
//! -------
//! Turn an adjacency matrix of interaction counts into the sufficient
//! statistics of the ensemble once, then evaluate the log-likelihood and its
//! gradient for any set of covariate layers and coefficients.
//!
//! Key behaviors
//! -------------
//! - [`EnsembleData::new`] enumerates admissible dyads, validates counts,
//!   computes combinatorial weights `Ξ`, the multinomial constant and the
//!   null log-likelihood `ℓ₀` (cached for every fit on this network).
//! - [`EnsembleData::layer_column`] validates a covariate layer against the
//!   network and reduces it to one value per admissible dyad.
//! - [`EnsembleData::design`] stacks layer columns into a [`LayerDesign`],
//!   dropping structural zeros, so each likelihood evaluation is a dense
//!   matrix-vector product.
//! - [`LayerDesign::log_likelihood`] and [`LayerDesign::gradient`] evaluate
//!   the model at a coefficient vector.
//!
//! Model
//! -----
//! With observed counts `A_p`, total `m = Σ A_p`, weights `Ξ_p` and layers
//! `w_l`:
//!
//! ```text
//! η_p = ln Ξ_p + Σ_l exp(c_l) ln w_l(p)
//! ℓ(c) = ln Γ(m+1) − Σ_p ln Γ(A_p+1) + Σ_p A_p η_p − m · ln Σ_q exp(η_q)
//! ∂ℓ/∂c_l = exp(c_l) · (Σ_p A_p ln w_l(p) − m Σ_p π_p ln w_l(p))
//! ```
//!
//! where `π = softmax(η)`. The effect `exp(c)` is capped through
//! `coef_to_effect`, with a zero derivative past the cap.
//!
//! Invariants & assumptions
//! ------------------------
//! - Directed ensembles use ordered dyads `i ≠ j`; undirected ensembles use
//!   `i < j` and require a symmetric adjacency. Self-loops add the diagonal.
//! - Undirected layers are symmetrized by the mean of both entries.
//! - A dyad with `Ξ = 0` or a zero layer value is a structural zero. It is
//!   dropped from the normalizer and must have no observed interactions.
//! - Every layer entry that is read must be finite and non-negative.
//!
//! Conventions
//! -----------
//! - Dyad order is row-major over the admissible upper (or full) pattern, so
//!   all per-dyad arrays share one index.
//! - No logging here: this is the inner loop of every fit.
//!
//! Testing notes
//! -------------
//! - Closed-form null log-likelihoods on small networks.
//! - The analytic gradient against a central difference of the likelihood.
//! - Every rejection path of counts and layers.
use crate::{
    network::{
        core::{layers::Layer, matrix::NetworkMatrix, options::{Combinatorics, EnsembleConfig}},
        errors::{NRMError, NRMResult},
    },
    optimization::{
        loglik_optimizer::{Grad, Theta},
        numerical_stability::{GENERAL_TOL, coef_to_effect, log_sum_exp, softmax_from_logits},
    },
};
use ndarray::{Array1, Array2};
use statrs::function::gamma::ln_gamma;

/// Sufficient statistics of one observed network under one ensemble
/// configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleData {
    config: EnsembleConfig,
    n_nodes: usize,
    labels: Option<Vec<String>>,
    pairs: Vec<(usize, usize)>,
    counts: Array1<f64>,
    log_xi: Array1<f64>,
    total: f64,
    log_const: f64,
    null_loglik: f64,
}

impl EnsembleData {
    /// Build the ensemble for `adjacency` under `config`.
    ///
    /// Errors
    /// ------
    /// - [`NRMError::EmptyNetwork`] for zero nodes or zero total count.
    /// - [`NRMError::NoAdmissiblePairs`] when no dyad is admissible (a single
    ///   node without self-loops).
    /// - [`NRMError::NonFiniteCount`] / [`NRMError::NegativeCount`] on a bad
    ///   entry of an admissible dyad.
    /// - [`NRMError::AsymmetricAdjacency`] for an undirected ensemble over a
    ///   non-symmetric matrix.
    pub fn new(adjacency: &NetworkMatrix, config: EnsembleConfig) -> NRMResult<Self> {
        let n_nodes = adjacency.n_nodes();
        if n_nodes == 0 {
            return Err(NRMError::EmptyNetwork { nodes: 0 });
        }
        let pairs = admissible_pairs(n_nodes, config);
        if pairs.is_empty() {
            return Err(NRMError::NoAdmissiblePairs { nodes: n_nodes });
        }

        let mut counts = Array1::<f64>::zeros(pairs.len());
        for (p, &(i, j)) in pairs.iter().enumerate() {
            let a_ij = validate_count(adjacency, i, j)?;
            if !config.directed && i != j {
                let a_ji = validate_count(adjacency, j, i)?;
                if (a_ij - a_ji).abs() > GENERAL_TOL * a_ij.abs().max(a_ji.abs()).max(1.0) {
                    return Err(NRMError::AsymmetricAdjacency { row: i, col: j });
                }
            }
            counts[p] = a_ij;
        }
        let total = counts.sum();
        if total <= 0.0 {
            return Err(NRMError::EmptyNetwork { nodes: n_nodes });
        }

        let log_xi = combinatorial_log_weights(n_nodes, &pairs, &counts, config);
        for (p, (&count, &lx)) in counts.iter().zip(log_xi.iter()).enumerate() {
            if count > 0.0 && lx == f64::NEG_INFINITY {
                let (row, col) = pairs[p];
                return Err(NRMError::ZeroPropensityOnObservedPair { layer: None, row, col, count });
            }
        }

        let log_const =
            ln_gamma(total + 1.0) - counts.iter().map(|&a| ln_gamma(a + 1.0)).sum::<f64>();
        let active: Vec<usize> = (0..pairs.len()).filter(|&p| log_xi[p].is_finite()).collect();
        let eta = Array1::from_iter(active.iter().map(|&p| log_xi[p]));
        let observed: f64 = active.iter().map(|&p| weighted(counts[p], log_xi[p])).sum();
        let null_loglik = log_const + observed - total * log_sum_exp(eta.view());

        Ok(Self {
            config,
            n_nodes,
            labels: adjacency.labels().map(<[String]>::to_vec),
            pairs,
            counts,
            log_xi,
            total,
            log_const,
            null_loglik,
        })
    }

    pub fn config(&self) -> EnsembleConfig {
        self.config
    }

    pub fn n_nodes(&self) -> usize {
        self.n_nodes
    }

    /// Number of admissible dyads.
    pub fn n_pairs(&self) -> usize {
        self.pairs.len()
    }

    /// Admissible dyads `(row, col)` in ensemble order.
    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    pub fn counts(&self) -> &Array1<f64> {
        &self.counts
    }

    /// Total number of observed interactions `m`.
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Log-likelihood of the null model `Ω ≡ 1`.
    pub fn null_loglik(&self) -> f64 {
        self.null_loglik
    }

    /// Validate `layer` against this network and reduce it to one value per
    /// admissible dyad.
    ///
    /// Errors
    /// ------
    /// - [`NRMError::DimensionMismatch`] / [`NRMError::LabelMismatch`] if the
    ///   layer does not describe the same nodes.
    /// - [`NRMError::InconsistentLabels`] if exactly one of the adjacency and
    ///   the layer carries node labels.
    /// - [`NRMError::InvalidLayerValue`] on a negative or non-finite entry.
    /// - [`NRMError::ZeroPropensityOnObservedPair`] if the layer is zero on a
    ///   dyad with observed interactions.
    pub fn layer_column(&self, layer: &Layer) -> NRMResult<LayerColumn> {
        let matrix = layer.matrix();
        if matrix.n_nodes() != self.n_nodes {
            return Err(NRMError::DimensionMismatch {
                layer: layer.name().to_string(),
                expected: self.n_nodes,
                found: matrix.n_nodes(),
            });
        }
        match (self.labels.as_deref(), matrix.labels()) {
            (Some(expected), Some(found)) => {
                if let Some(index) = expected.iter().zip(found).position(|(e, f)| e != f) {
                    return Err(NRMError::LabelMismatch {
                        layer: layer.name().to_string(),
                        index,
                        expected: expected[index].clone(),
                        found: found[index].clone(),
                    });
                }
            }
            (None, None) => {}
            (expected, _) => {
                return Err(NRMError::InconsistentLabels {
                    layer: layer.name().to_string(),
                    adjacency_labelled: expected.is_some(),
                });
            }
        }

        let mut values = Array1::<f64>::zeros(self.pairs.len());
        for (p, &(i, j)) in self.pairs.iter().enumerate() {
            let w_ij = validate_layer_value(layer, i, j)?;
            let w = if self.config.directed || i == j {
                w_ij
            } else {
                0.5 * (w_ij + validate_layer_value(layer, j, i)?)
            };
            if w == 0.0 && self.counts[p] > 0.0 {
                return Err(NRMError::ZeroPropensityOnObservedPair {
                    layer: Some(layer.name().to_string()),
                    row: i,
                    col: j,
                    count: self.counts[p],
                });
            }
            values[p] = w;
        }
        Ok(LayerColumn { name: layer.name().to_string(), values })
    }

    /// Assemble the dense design for the given layer columns, in order.
    ///
    /// Dyads that are structural zeros for the weights or for any of the
    /// columns are dropped. Observed dyads are never dropped: both
    /// constructors reject zeros on them.
    pub fn design(&self, columns: &[&LayerColumn]) -> LayerDesign {
        let active: Vec<usize> = (0..self.pairs.len())
            .filter(|&p| self.log_xi[p].is_finite() && columns.iter().all(|c| c.values[p] > 0.0))
            .collect();
        let k = columns.len();
        let counts = Array1::from_iter(active.iter().map(|&p| self.counts[p]));
        let log_xi = Array1::from_iter(active.iter().map(|&p| self.log_xi[p]));
        let log_w =
            Array2::from_shape_fn((active.len(), k), |(r, l)| columns[l].values[active[r]].ln());
        let observed = log_w.t().dot(&counts);
        LayerDesign {
            names: columns.iter().map(|c| c.name.clone()).collect(),
            counts,
            log_xi,
            log_w,
            observed,
            total: self.total,
            log_const: self.log_const,
        }
    }
}

/// One covariate layer reduced to the admissible dyads of an ensemble.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerColumn {
    name: String,
    values: Array1<f64>,
}

impl LayerColumn {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Layer value per admissible dyad (symmetrized when undirected).
    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }
}

/// Dense design over the non-structural-zero dyads for a fixed list of
/// layers. This is the data the optimizer sees.
///
/// `log_w` is `n_active × k`; `observed[l] = Σ_p A_p ln w_l(p)` is the
/// sufficient statistic of layer `l`.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerDesign {
    names: Vec<String>,
    counts: Array1<f64>,
    log_xi: Array1<f64>,
    log_w: Array2<f64>,
    observed: Array1<f64>,
    total: f64,
    log_const: f64,
}

impl LayerDesign {
    /// Layer names in coefficient order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of coefficients.
    pub fn n_layers(&self) -> usize {
        self.names.len()
    }

    /// Number of dyads entering the normalizer.
    pub fn n_active(&self) -> usize {
        self.counts.len()
    }

    /// Log-propensities `η` and the effect derivatives `dβ/dc`.
    fn linear_predictor(&self, coefficients: &Theta) -> (Array1<f64>, Array1<f64>) {
        let (beta, dbeta): (Vec<f64>, Vec<f64>) =
            coefficients.iter().map(|&c| coef_to_effect(c)).unzip();
        let eta = &self.log_xi + &self.log_w.dot(&Array1::from(beta));
        (eta, Array1::from(dbeta))
    }

    /// `ℓ(c)`. The caller guarantees `coefficients.len() == n_layers()`.
    pub fn log_likelihood(&self, coefficients: &Theta) -> f64 {
        let (eta, _) = self.linear_predictor(coefficients);
        let fit: f64 = self.counts.iter().zip(eta.iter()).map(|(&a, &e)| weighted(a, e)).sum();
        self.log_const + fit - self.total * log_sum_exp(eta.view())
    }

    /// `∇ℓ(c)`. The caller guarantees `coefficients.len() == n_layers()`.
    pub fn gradient(&self, coefficients: &Theta) -> Grad {
        let (eta, dbeta) = self.linear_predictor(coefficients);
        let (probs, _) = softmax_from_logits(eta.view());
        let expected = self.log_w.t().dot(&probs) * self.total;
        (&self.observed - &expected) * &dbeta
    }

    /// Expected count `m π_p` on every active dyad.
    pub fn expected_counts(&self, coefficients: &Theta) -> Array1<f64> {
        let (eta, _) = self.linear_predictor(coefficients);
        let (probs, _) = softmax_from_logits(eta.view());
        probs * self.total
    }
}

// ---- Helper methods ----

/// `a · x` with `0 · x = 0` even for infinite `x`.
#[inline]
fn weighted(a: f64, x: f64) -> f64 {
    if a == 0.0 { 0.0 } else { a * x }
}

fn admissible_pairs(n: usize, config: EnsembleConfig) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for i in 0..n {
        let start = if config.directed { 0 } else { i };
        for j in start..n {
            if i != j || config.selfloops {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

fn validate_count(adjacency: &NetworkMatrix, row: usize, col: usize) -> NRMResult<f64> {
    let value = adjacency.get(row, col);
    if !value.is_finite() {
        return Err(NRMError::NonFiniteCount { row, col, value });
    }
    if value < 0.0 {
        return Err(NRMError::NegativeCount { row, col, value });
    }
    Ok(value)
}

fn validate_layer_value(layer: &Layer, row: usize, col: usize) -> NRMResult<f64> {
    let value = layer.matrix().get(row, col);
    if !value.is_finite() || value < 0.0 {
        return Err(NRMError::InvalidLayerValue {
            layer: layer.name().to_string(),
            row,
            col,
            value,
        });
    }
    Ok(value)
}

/// `ln Ξ_p` per dyad, `-∞` where `Ξ_p = 0`.
///
/// Degrees are taken over admissible dyads only. In the undirected case a
/// self-loop contributes to its node twice, so `Σ_i k_i = 2m`.
fn combinatorial_log_weights(
    n: usize, pairs: &[(usize, usize)], counts: &Array1<f64>, config: EnsembleConfig,
) -> Array1<f64> {
    match config.combinatorics {
        Combinatorics::Regular => Array1::zeros(pairs.len()),
        Combinatorics::Degree => {
            let mut k_out = vec![0.0; n];
            let mut k_in = vec![0.0; n];
            for (&(i, j), &a) in pairs.iter().zip(counts.iter()) {
                k_out[i] += a;
                k_in[j] += a;
            }
            if !config.directed {
                for i in 0..n {
                    let k = k_out[i] + k_in[i];
                    k_out[i] = k;
                    k_in[i] = k;
                }
            }
            Array1::from_iter(pairs.iter().map(|&(i, j)| (k_out[i] * k_in[j]).ln()))
        }
    }
}

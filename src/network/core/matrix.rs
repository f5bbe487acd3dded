//! NetworkMatrix — square node-by-node matrix with optional node labels.
//!
//! Purpose
//! -------
//! Carry the adjacency matrix of interaction counts and every covariate layer
//! in one validated container. Construction checks only what the matrix can
//! know about itself (squareness and labels); cross-matrix checks (same size,
//! same labels) and value checks (non-negative counts, finite layers) happen
//! when the ensemble is assembled.
//!
//! Conventions
//! -----------
//! - Entry `(i, j)` describes dyad `i → j`. For undirected ensembles the
//!   matrix is read as symmetric.
//! - Labels, when present, have one entry per row and are unique.
//! - Within one model either every matrix carries labels or none does.
//!   Labelled matrices must agree position by position; unlabelled ones are
//!   matched by position alone.
use crate::network::errors::{NRMError, NRMResult};
use ndarray::Array2;
use std::collections::HashSet;

/// Square matrix of per-dyad values with optional node labels.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkMatrix {
    values: Array2<f64>,
    labels: Option<Vec<String>>,
}

impl NetworkMatrix {
    /// Validate and wrap a square matrix.
    ///
    /// Errors
    /// ------
    /// - [`NRMError::NonSquareMatrix`] if `values` is not `n × n`.
    /// - [`NRMError::LabelCountMismatch`] if `labels` does not have `n` entries.
    /// - [`NRMError::DuplicateLabel`] if two labels coincide.
    pub fn new(values: Array2<f64>, labels: Option<Vec<String>>) -> NRMResult<Self> {
        let (rows, cols) = values.dim();
        if rows != cols {
            return Err(NRMError::NonSquareMatrix { rows, cols });
        }
        if let Some(labels) = &labels {
            if labels.len() != rows {
                return Err(NRMError::LabelCountMismatch { expected: rows, found: labels.len() });
            }
            let mut seen = HashSet::with_capacity(labels.len());
            for label in labels {
                if !seen.insert(label.as_str()) {
                    return Err(NRMError::DuplicateLabel { label: label.clone() });
                }
            }
        }
        Ok(Self { values, labels })
    }

    /// Unlabelled matrix.
    pub fn from_array(values: Array2<f64>) -> NRMResult<Self> {
        Self::new(values, None)
    }

    /// Same values under new node labels.
    pub fn with_labels(self, labels: Vec<String>) -> NRMResult<Self> {
        Self::new(self.values, Some(labels))
    }

    /// Number of nodes.
    pub fn n_nodes(&self) -> usize {
        self.values.nrows()
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn labels(&self) -> Option<&[String]> {
        self.labels.as_deref()
    }

    /// Entry for dyad `i → j`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[[i, j]]
    }

    /// Reorder nodes so that new node `k` is old node `perm[k]`.
    ///
    /// Errors
    /// ------
    /// - [`NRMError::DimensionMismatch`] if `perm` has the wrong length or is
    ///   not a permutation of `0..n`.
    pub fn permuted(&self, perm: &[usize]) -> NRMResult<Self> {
        let n = self.n_nodes();
        let mut seen = vec![false; n];
        let valid = perm.len() == n
            && perm.iter().all(|&p| p < n && !std::mem::replace(&mut seen[p], true));
        if !valid {
            return Err(NRMError::DimensionMismatch {
                layer: "permutation".to_string(),
                expected: n,
                found: perm.len(),
            });
        }
        let values = Array2::from_shape_fn((n, n), |(i, j)| self.values[[perm[i], perm[j]]]);
        let labels = self.labels.as_ref().map(|l| perm.iter().map(|&p| l[p].clone()).collect());
        Ok(Self { values, labels })
    }
}

//! Covariate layers and predictor bundles.
//!
//! A [`Layer`] is a named [`NetworkMatrix`] of non-negative dyadic
//! covariates. A [`LayerSet`] keeps layers in insertion order with unique
//! names; that order fixes the coefficient order of every fit built from it.
//! A [`PredictorBundle`] groups layers that enter or leave a model together
//! during stepwise selection.
use crate::network::{
    core::matrix::NetworkMatrix,
    errors::{NRMError, NRMResult},
};
use std::collections::{HashMap, HashSet};

/// Named covariate matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    name: String,
    matrix: NetworkMatrix,
}

impl Layer {
    pub fn new(name: impl Into<String>, matrix: NetworkMatrix) -> Self {
        Self { name: name.into(), matrix }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matrix(&self) -> &NetworkMatrix {
        &self.matrix
    }
}

/// Ordered collection of layers with unique names.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayerSet {
    layers: Vec<Layer>,
}

impl LayerSet {
    /// Build a set, rejecting duplicate names.
    ///
    /// An empty set is allowed here; entry points that need at least one
    /// layer reject it with [`NRMError::EmptyLayerSet`].
    pub fn new(layers: Vec<Layer>) -> NRMResult<Self> {
        let mut set = Self { layers: Vec::with_capacity(layers.len()) };
        for layer in layers {
            set.push(layer)?;
        }
        Ok(set)
    }

    /// Append a layer.
    ///
    /// Errors
    /// ------
    /// - [`NRMError::DuplicateLayer`] if the name is already present.
    pub fn push(&mut self, layer: Layer) -> NRMResult<()> {
        if self.get(layer.name()).is_some() {
            return Err(NRMError::DuplicateLayer { name: layer.name.clone() });
        }
        self.layers.push(layer);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Layer> {
        self.layers.iter()
    }

    /// Layer names in insertion order.
    pub fn names(&self) -> Vec<String> {
        self.layers.iter().map(|l| l.name.clone()).collect()
    }
}

impl<'a> IntoIterator for &'a LayerSet {
    type Item = &'a Layer;
    type IntoIter = std::slice::Iter<'a, Layer>;

    fn into_iter(self) -> Self::IntoIter {
        self.layers.iter()
    }
}

/// Named group of layer names selected as a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictorBundle {
    name: String,
    layers: Vec<String>,
}

impl PredictorBundle {
    /// Errors
    /// ------
    /// - [`NRMError::EmptyBundle`] if `layers` is empty.
    /// - [`NRMError::DuplicateLayer`] if a layer is listed twice.
    pub fn new(name: impl Into<String>, layers: Vec<String>) -> NRMResult<Self> {
        let name = name.into();
        if layers.is_empty() {
            return Err(NRMError::EmptyBundle { name });
        }
        let mut seen = HashSet::with_capacity(layers.len());
        for layer in &layers {
            if !seen.insert(layer.as_str()) {
                return Err(NRMError::DuplicateLayer { name: layer.clone() });
            }
        }
        Ok(Self { name, layers })
    }

    /// Bundle holding exactly one layer, named after it.
    pub fn singleton(layer: impl Into<String>) -> Self {
        let layer = layer.into();
        Self { name: layer.clone(), layers: vec![layer] }
    }

    /// One singleton bundle per layer, in layer order.
    pub fn singletons(layers: &LayerSet) -> Vec<Self> {
        layers.iter().map(|l| Self::singleton(l.name())).collect()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layers(&self) -> &[String] {
        &self.layers
    }
}

/// Check a bundle family against the available layer names.
///
/// Errors
/// ------
/// - [`NRMError::EmptyLayerSet`] if `bundles` is empty.
/// - [`NRMError::DuplicateBundle`] on a repeated bundle name.
/// - [`NRMError::UnknownLayer`] if a bundle names a layer not in `layers`.
/// - [`NRMError::OverlappingBundles`] if a layer appears in two bundles.
pub fn validate_bundles(bundles: &[PredictorBundle], layers: &[String]) -> NRMResult<()> {
    if bundles.is_empty() {
        return Err(NRMError::EmptyLayerSet);
    }
    let mut bundle_names = HashSet::with_capacity(bundles.len());
    let mut owner: HashMap<&str, &str> = HashMap::new();
    for bundle in bundles {
        if !bundle_names.insert(bundle.name()) {
            return Err(NRMError::DuplicateBundle { name: bundle.name.clone() });
        }
        for layer in bundle.layers() {
            if !layers.contains(layer) {
                return Err(NRMError::UnknownLayer { name: layer.clone() });
            }
            if let Some(first) = owner.insert(layer.as_str(), bundle.name()) {
                return Err(NRMError::OverlappingBundles {
                    layer: layer.clone(),
                    first: first.to_string(),
                    second: bundle.name.clone(),
                });
            }
        }
    }
    Ok(())
}

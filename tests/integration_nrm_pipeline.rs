//! Integration tests for network regression fitting and stepwise selection.
//!
//! Purpose
//! -------
//! - Validate the end-to-end pipeline: from labelled adjacency and layer
//!   matrices, through ensemble construction and ML fitting, to Wald
//!   inference, AIC comparison and forward selection.
//! - Use a small network whose maximum-likelihood solution is known in
//!   closed form, so estimates and standard errors can be checked exactly.
//!
//! Coverage
//! --------
//! - `network::models::nrm`:
//!   - Recovery of a planted effect and its standard error.
//!   - A layer proportional to the counts, with unit effect.
//!   - A noise layer and a flat layer that carry no information, and keep
//!     the signal coefficient's inference intact when fitted beside it.
//!   - Invariance under node relabelling.
//! - `network::models::selection`:
//!   - Selection order, monotone likelihood along the trace, uninformative
//!     candidates losing on AIC without failing, and identical results for
//!     parallel and sequential candidate evaluation.
//! - `network::models::fit`:
//!   - AIC rebasing over a selection trace.
//! - `network::core`:
//!   - Degenerate networks reported as configuration errors.
//!
//! Exclusions
//! ----------
//! - Low-level building blocks (ensemble weights, numerically stable
//!   helpers, optimizer plumbing) are covered by unit tests.
//! - Python bindings.
use approx::assert_relative_eq;
use ndarray::Array2;
use nrm_ghype::network::{
    ErrorKind, Layer, LayerSet, NRMError, NRMModel, NRMOptions, NetworkMatrix, PredictorBundle,
    SelectionStatus, StepwiseOptions, Termination, nrm, nrm_selection,
};

const NODES: usize = 5;

/// Cycle edges (`near`) of the 5-node ring, then the chords (`far`).
const NEAR: [(usize, usize); 5] = [(0, 1), (1, 2), (2, 3), (3, 4), (0, 4)];
const FAR: [(usize, usize); 5] = [(0, 2), (0, 3), (1, 3), (1, 4), (2, 4)];

/// Symmetric matrix with `near[k]` on `NEAR[k]`, `far[k]` on `FAR[k]`, and
/// `diag` on the diagonal.
fn ring_matrix(near: [f64; 5], far: [f64; 5], diag: f64) -> Array2<f64> {
    let mut m = Array2::from_elem((NODES, NODES), diag);
    for (k, &(i, j)) in NEAR.iter().enumerate() {
        m[[i, j]] = near[k];
        m[[j, i]] = near[k];
    }
    for (k, &(i, j)) in FAR.iter().enumerate() {
        m[[i, j]] = far[k];
        m[[j, i]] = far[k];
    }
    m
}

fn labels() -> Vec<String> {
    ["a", "b", "c", "d", "e"].iter().map(|s| s.to_string()).collect()
}

/// 20 interactions on every cycle edge, 2 on every chord.
///
/// Every node has the same degree, so the combinatorial weights are
/// constant and the model reduces to a two-group multinomial.
fn ring_network() -> NetworkMatrix {
    NetworkMatrix::new(ring_matrix([20.0; 5], [2.0; 5], 0.0), Some(labels())).unwrap()
}

/// `e` on cycle edges, 1 on chords: the MLE satisfies exp(c) = ln 10.
fn signal_layer() -> Layer {
    let e = std::f64::consts::E;
    let values = ring_matrix([e; 5], [1.0; 5], 1.0);
    Layer::new("proximity", NetworkMatrix::new(values, Some(labels())).unwrap())
}

/// Values whose logs sum to zero within each group, so the layer is
/// uncorrelated with the counts.
fn noise_layer() -> Layer {
    let near = [2.0, 0.5, 1.0, 3.0, 1.0 / 3.0];
    let far = [3.0, 1.0 / 3.0, 2.0, 0.5, 1.0];
    Layer::new("noise", NetworkMatrix::new(ring_matrix(near, far, 1.0), Some(labels())).unwrap())
}

fn flat_layer() -> Layer {
    Layer::new("flat", NetworkMatrix::new(Array2::ones((NODES, NODES)), Some(labels())).unwrap())
}

/// The observed counts themselves (1 on the unused diagonal).
fn proportional_layer() -> Layer {
    let values = ring_matrix([20.0; 5], [2.0; 5], 1.0);
    Layer::new("volume", NetworkMatrix::new(values, Some(labels())).unwrap())
}

/// Closed-form SE of the signal coefficient on the ring network.
fn signal_se() -> f64 {
    1.0 / (10.0_f64.ln() * (110.0_f64 * 10.0 / 121.0).sqrt())
}

fn layer_names(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
// Purpose
// -------
// The fitted coefficient and its standard error match the closed form.
//
// Given
// -----
// - 100 interactions on cycle edges and 10 on chords; the signal layer is
//   `e` on cycle edges.
//
// Expect
// ------
// - exp(ĉ) = ln 10, i.e. ĉ = ln ln 10 ≈ 0.834032.
// - Information in β is m·q(1−q) with q = 10/11, so
//   SE(ĉ) = 1 / (ln 10 · sqrt(110 · 10/121)) ≈ 0.14404.
// - Highly significant, interval covers the estimate, ℓ > ℓ₀.
fn planted_effect_is_recovered_with_closed_form_se() {
    // Arrange
    let layers = LayerSet::new(vec![signal_layer()]).unwrap();
    let ln10 = 10.0_f64.ln();
    let expected_se = signal_se();

    // Act
    let fit = nrm(&ring_network(), &layers, None, &NRMOptions::default()).unwrap();

    // Assert
    assert!(fit.converged());
    assert_relative_eq!(fit.coefficients()[0], ln10.ln(), epsilon = 1e-4);
    assert_relative_eq!(fit.effects()[0], ln10, epsilon = 1e-3);
    let se = fit.std_errors()[0].expect("signal layer has positive information");
    assert_relative_eq!(se, expected_se, epsilon = 1e-3);
    assert_relative_eq!(expected_se, 0.14404, epsilon = 1e-4);

    let p = fit.p_values()[0].unwrap();
    assert!(p < 1e-6);
    let (lo, hi) = fit.confidence_intervals()[0].unwrap();
    assert!(lo < fit.coefficients()[0] && fit.coefficients()[0] < hi);
    assert!(fit.loglik() > fit.null_loglik());
    assert!(fit.mcfadden_r2() > 0.0 && fit.mcfadden_r2() < 1.0);
    assert_eq!(fit.summary()[0].layer, "proximity");
}

#[test]
// Purpose
// -------
// A layer proportional to the observed counts explains them with unit
// effect.
//
// Given
// -----
// - Layer values equal to the counts: 20 on cycle edges, 2 on chords.
//
// Expect
// ------
// - The group share 10^β / (10^β + 1) matches 10/11 at β = 1, so ĉ = 0 and
//   the effect is 1.
// - Information in β is m·q(1−q)·(ln 10)², the same SE as the signal layer
//   at β = 1, and the same log-likelihood (both saturate the two groups).
fn proportional_layer_has_unit_effect() {
    // Arrange
    let volume = LayerSet::new(vec![proportional_layer()]).unwrap();
    let signal = LayerSet::new(vec![signal_layer()]).unwrap();
    let opts = NRMOptions::default();

    // Act
    let fit = nrm(&ring_network(), &volume, None, &opts).unwrap();
    let reference = nrm(&ring_network(), &signal, None, &opts).unwrap();

    // Assert
    assert!(fit.converged());
    assert_relative_eq!(fit.coefficients()[0], 0.0, epsilon = 1e-4);
    assert_relative_eq!(fit.effects()[0], 1.0, epsilon = 1e-4);
    assert_relative_eq!(fit.std_errors()[0].unwrap(), signal_se(), epsilon = 1e-3);
    assert!(fit.p_values()[0].is_some());
    assert_relative_eq!(fit.loglik(), reference.loglik(), epsilon = 1e-6);
}

#[test]
// Purpose
// -------
// A layer uncorrelated with the counts is marked low-confidence without
// costing the signal coefficient its inference.
//
// Given
// -----
// - Signal and noise layers fitted jointly. The noise logs sum to zero in
//   each group, so its MLE sits at zero effect (c → −∞) and its
//   information vanishes.
//
// Expect
// ------
// - Signal: coefficient ln ln 10, SE equal to the single-layer closed form,
//   p < 1e-6.
// - Noise: effect below 0.1 and either unidentified (no SE, p-value or
//   interval) or insignificant.
// - No fit-level inference error.
fn noise_layer_is_not_significant() {
    // Arrange
    let layers = LayerSet::new(vec![signal_layer(), noise_layer()]).unwrap();

    // Act
    let fit = nrm(&ring_network(), &layers, None, &NRMOptions::default()).unwrap();

    // Assert
    assert!(fit.converged());
    assert_relative_eq!(fit.coefficients()[0], 10.0_f64.ln().ln(), epsilon = 1e-3);
    let se = fit.std_errors();
    assert_relative_eq!(se[0].expect("signal stays identified"), signal_se(), epsilon = 1e-3);
    assert!(fit.p_values()[0].expect("signal p-value") < 1e-6);
    assert!(fit.confidence_intervals()[0].is_some());
    assert!(fit.inference_error().is_none());

    assert!(fit.effects()[1] < 0.1);
    if fit.is_identified(1) {
        assert!(fit.p_values()[1].unwrap() > 0.05);
    } else {
        assert!(se[1].is_none());
        assert!(fit.p_values()[1].is_none());
        assert!(fit.confidence_intervals()[1].is_none());
        assert_eq!(fit.unidentified_layers(), vec!["noise"]);
        assert!(fit.summary()[1].wald.is_none());
    }
}

#[test]
// Purpose
// -------
// A flat layer reproduces the null model and costs one AIC parameter.
//
// Given
// -----
// - An all-ones layer on the ring network.
//
// Expect
// ------
// - ℓ = ℓ₀, AIC = AIC₀ + 2, R² = 0, inference unavailable.
fn flat_layer_costs_two_aic_points() {
    // Arrange
    let layers = LayerSet::new(vec![flat_layer()]).unwrap();
    let model = NRMModel::new(&ring_network(), &layers, NRMOptions::default()).unwrap();

    // Act
    let null = model.null_fit();
    let fit = model.fit_all(None).unwrap();

    // Assert
    assert_relative_eq!(fit.loglik(), null.loglik(), epsilon = 1e-10);
    assert_relative_eq!(fit.aic(), null.aic() + 2.0, epsilon = 1e-8);
    assert_relative_eq!(fit.mcfadden_r2(), 0.0, epsilon = 1e-12);
    assert_eq!(fit.inference_error().map(NRMError::kind), Some(ErrorKind::SingularInformation));
    assert_eq!(fit.std_errors(), vec![None]);
}

#[test]
// Purpose
// -------
// Relabelling nodes changes nothing about the fit.
//
// Given
// -----
// - The same node permutation applied to the adjacency and the layer.
//
// Expect
// ------
// - Identical log-likelihoods, pseudo-R², coefficient and standard error.
fn fit_is_invariant_under_node_permutation() {
    // Arrange
    let perm = [2, 4, 0, 1, 3];
    let signal = signal_layer();
    let adjacency = ring_network();
    let permuted_adj = adjacency.permuted(&perm).unwrap();
    let permuted_layer = Layer::new(signal.name(), signal.matrix().permuted(&perm).unwrap());
    let original = LayerSet::new(vec![signal]).unwrap();
    let permuted = LayerSet::new(vec![permuted_layer]).unwrap();
    let opts = NRMOptions::default();

    // Act
    let a = nrm(&adjacency, &original, None, &opts).unwrap();
    let b = nrm(&permuted_adj, &permuted, None, &opts).unwrap();

    // Assert
    assert_relative_eq!(a.loglik(), b.loglik(), epsilon = 1e-9);
    assert_relative_eq!(a.null_loglik(), b.null_loglik(), epsilon = 1e-9);
    assert_relative_eq!(a.coefficients()[0], b.coefficients()[0], epsilon = 1e-6);
    assert_relative_eq!(a.mcfadden_r2(), b.mcfadden_r2(), epsilon = 1e-9);
    assert_relative_eq!(a.std_errors()[0].unwrap(), b.std_errors()[0].unwrap(), epsilon = 1e-5);
}

#[test]
// Purpose
// -------
// Layers whose labels disagree with the adjacency are rejected.
//
// Given
// -----
// - The signal layer with its labels reversed.
//
// Expect
// ------
// - LabelMismatch, classified as a configuration error.
fn mismatched_layer_labels_are_rejected() {
    // Arrange
    let signal = signal_layer();
    let mut reversed = labels();
    reversed.reverse();
    let relabelled = Layer::new(
        "proximity",
        NetworkMatrix::new(signal.matrix().values().clone(), Some(reversed)).unwrap(),
    );
    let layers = LayerSet::new(vec![relabelled]).unwrap();

    // Act
    let err = NRMModel::new(&ring_network(), &layers, NRMOptions::default()).unwrap_err();

    // Assert
    assert!(matches!(err, NRMError::LabelMismatch { .. }));
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
// Purpose
// -------
// Selection picks the informative layer first and the log-likelihood
// never decreases along the trace.
//
// Given
// -----
// - Singleton bundles for the noise, signal, and flat layers (signal listed
//   second, so picking it is not a tie-break artefact).
//
// Expect
// ------
// - `included[0] == "proximity"`; neither noise nor flat is included.
// - ℓ is non-decreasing (within 1e-4) and AIC strictly decreasing along
//   the trace.
fn selection_picks_signal_and_likelihood_is_monotone() {
    // Arrange
    let layers = LayerSet::new(vec![noise_layer(), signal_layer(), flat_layer()]).unwrap();
    let bundles = PredictorBundle::singletons(&layers);
    let step = StepwiseOptions::new(vec![], None, false).unwrap();

    // Act
    let trace =
        nrm_selection(&ring_network(), &layers, &bundles, &NRMOptions::default(), &step).unwrap();

    // Assert
    assert_eq!(trace.included, layer_names(&["proximity"]));
    assert_eq!(trace.fits.len(), trace.included.len() + 1);
    assert_eq!(trace.termination, Termination::NoImprovement);
    assert_eq!(trace.final_fit().unwrap().layers(), layer_names(&["proximity"]).as_slice());
    for pair in trace.fits.windows(2) {
        assert!(pair[1].loglik() >= pair[0].loglik() - 1e-4);
        assert!(pair[1].aic() < pair[0].aic());
    }
    assert!(trace.failures.is_empty());
    assert_eq!(trace.status(), SelectionStatus::Complete);
}

#[test]
// Purpose
// -------
// An uninformative candidate loses on AIC instead of being recorded as a
// failure.
//
// Given
// -----
// - Singleton bundles for the signal and noise layers.
//
// Expect
// ------
// - Step 1 includes the signal; step 2 fits signal + noise, whose AIC is
//   not lower, so selection ends with NoImprovement.
// - No failures, status Complete.
fn uninformative_candidate_does_not_fail_selection() {
    // Arrange
    let layers = LayerSet::new(vec![signal_layer(), noise_layer()]).unwrap();
    let bundles = PredictorBundle::singletons(&layers);
    let step = StepwiseOptions::new(vec![], None, true).unwrap();

    // Act
    let trace =
        nrm_selection(&ring_network(), &layers, &bundles, &NRMOptions::default(), &step).unwrap();

    // Assert
    assert_eq!(trace.included, layer_names(&["proximity"]));
    assert_eq!(trace.termination, Termination::NoImprovement);
    assert!(trace.failures.is_empty());
    assert_eq!(trace.status(), SelectionStatus::Complete);
    let selected = trace.final_fit().unwrap();
    assert!(selected.std_errors()[0].is_some());
}

#[test]
// Purpose
// -------
// Parallel and sequential candidate evaluation give the same trace, and
// repeated runs agree.
//
// Given
// -----
// - Named bundles over the three layers, evaluated with and without rayon,
//   twice each.
//
// Expect
// ------
// - Same included bundles, same failures, same AIC at every step.
fn selection_is_deterministic_across_schedules() {
    // Arrange
    let layers = LayerSet::new(vec![signal_layer(), noise_layer(), flat_layer()]).unwrap();
    let bundles = vec![
        PredictorBundle::new("structure", layer_names(&["proximity"])).unwrap(),
        PredictorBundle::new("nuisance", layer_names(&["noise", "flat"])).unwrap(),
    ];
    let opts = NRMOptions::default();
    let sequential = StepwiseOptions::new(vec![], None, false).unwrap();
    let parallel = StepwiseOptions::new(vec![], None, true).unwrap();
    let net = ring_network();

    // Act
    let runs: Vec<_> = [&sequential, &parallel, &sequential, &parallel]
        .iter()
        .map(|s| nrm_selection(&net, &layers, &bundles, &opts, s).unwrap())
        .collect();

    // Assert
    let reference = &runs[0];
    assert_eq!(reference.included, layer_names(&["structure"]));
    for run in &runs[1..] {
        assert_eq!(run.included, reference.included);
        assert_eq!(run.termination, reference.termination);
        assert_eq!(run.failures.len(), reference.failures.len());
        for (a, b) in run.fits.iter().zip(&reference.fits) {
            assert_relative_eq!(a.aic(), b.aic(), epsilon = 1e-10);
        }
    }
}

#[test]
// Purpose
// -------
// Forcing a bundle makes it the baseline and leaves nothing to add when the
// rest carries no information.
//
// Given
// -----
// - "proximity" forced; noise and flat remain.
//
// Expect
// ------
// - Baseline contains the signal coefficient; no further inclusion.
fn forced_signal_forms_the_baseline() {
    // Arrange
    let layers = LayerSet::new(vec![signal_layer(), noise_layer(), flat_layer()]).unwrap();
    let bundles = PredictorBundle::singletons(&layers);
    let step = StepwiseOptions::new(layer_names(&["proximity"]), None, true).unwrap();

    // Act
    let trace =
        nrm_selection(&ring_network(), &layers, &bundles, &NRMOptions::default(), &step).unwrap();

    // Assert
    let baseline = trace.baseline().unwrap();
    assert_eq!(baseline.layers(), layer_names(&["proximity"]).as_slice());
    assert_relative_eq!(baseline.coefficients()[0], 10.0_f64.ln().ln(), epsilon = 1e-4);
    assert!(trace.included.is_empty());
}

#[test]
// Purpose
// -------
// Rebasing a trace on its baseline is cosmetic and idempotent.
//
// Given
// -----
// - A selection trace rebased on fit 0 once and then again.
//
// Expect
// ------
// - Relative AIC 0 for the baseline, negative for the selected model,
//   identical after the second rebase; absolute AIC untouched.
fn rebasing_a_trace_is_idempotent() {
    // Arrange
    let layers = LayerSet::new(vec![signal_layer()]).unwrap();
    let bundles = PredictorBundle::singletons(&layers);
    let mut trace = nrm_selection(
        &ring_network(),
        &layers,
        &bundles,
        &NRMOptions::default(),
        &StepwiseOptions::default(),
    )
    .unwrap();
    let absolute: Vec<f64> = trace.fits.iter().map(|f| f.aic()).collect();

    // Act
    trace.rebase_aic(0).unwrap();
    let once = trace.clone();
    trace.rebase_aic(0).unwrap();

    // Assert
    assert_eq!(trace, once);
    assert_eq!(trace.fits[0].relative_aic(), 0.0);
    assert!(trace.fits[1].relative_aic() < 0.0);
    assert_relative_eq!(
        trace.fits[1].relative_aic(),
        absolute[1] - absolute[0],
        epsilon = 1e-12
    );
    assert_eq!(trace.fits.iter().map(|f| f.aic()).collect::<Vec<_>>(), absolute);
    assert!(matches!(trace.rebase_aic(9), Err(NRMError::InvalidReferenceFit { .. })));
}

#[test]
// Purpose
// -------
// Degenerate networks are configuration errors, not numerical failures.
//
// Given
// -----
// - A 0-node matrix, an all-zero 5-node matrix, and a single node without
//   self-loops.
//
// Expect
// ------
// - EmptyNetwork, EmptyNetwork, NoAdmissiblePairs; all Configuration.
fn degenerate_networks_are_configuration_errors() {
    // Arrange
    let empty_layers = LayerSet::default();
    let opts = NRMOptions::default();
    let cases = [
        Array2::<f64>::zeros((0, 0)),
        Array2::<f64>::zeros((NODES, NODES)),
        Array2::from_elem((1, 1), 3.0),
    ];

    // Act
    let errors: Vec<NRMError> = cases
        .into_iter()
        .map(|m| {
            NRMModel::new(&NetworkMatrix::from_array(m).unwrap(), &empty_layers, opts.clone())
                .unwrap_err()
        })
        .collect();

    // Assert
    assert_eq!(errors[0], NRMError::EmptyNetwork { nodes: 0 });
    assert_eq!(errors[1], NRMError::EmptyNetwork { nodes: NODES });
    assert_eq!(errors[2], NRMError::NoAdmissiblePairs { nodes: 1 });
    assert!(errors.iter().all(|e| e.kind() == ErrorKind::Configuration));
}

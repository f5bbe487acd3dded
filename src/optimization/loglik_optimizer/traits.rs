//! Public optimizer surface.
//!
//! - [`LogLikelihood`]: implemented by the network regression model.
//! - [`Tolerances`] and [`MLEOptions`]: validated solver configuration.
//! - [`LineSearcher`]: line search used inside L-BFGS.
//! - [`OptimOutcome`]: what a finished run reports back.
//!
//! The optimizer maximizes `ℓ(θ)` by minimizing `c(θ) = -ℓ(θ)`. Analytic
//! gradients supplied through [`LogLikelihood::grad`] are gradients of `ℓ`;
//! the adapter flips their sign.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        Cost, FnEvalMap, Grad, Theta,
        validation::{validate_theta_hat, validate_value, verify_tol_cost, verify_tol_grad},
    },
};
use argmin::core::{TerminationReason, TerminationStatus};
use argmin_math::ArgminL2Norm;
use std::str::FromStr;

/// Log-likelihood interface consumed by [`maximize`](super::maximize).
///
/// `value` and `check` are required. `grad` is optional; when it returns
/// [`OptError::GradientNotImplemented`] the adapter differentiates the cost
/// numerically.
pub trait LogLikelihood {
    type Data: 'static;

    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<Cost>;
    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()>;

    fn grad(&self, _theta: &Theta, _data: &Self::Data) -> OptResult<Grad> {
        Err(OptError::GradientNotImplemented)
    }
}

/// Line search used inside the L-BFGS solver.
///
/// Parses case-insensitively from `"MoreThuente"` or `"HagerZhang"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineSearcher {
    #[default]
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(OptError::InvalidLineSearch {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'MoreThuente' or 'HagerZhang'.",
            }),
        }
    }
}

/// Numerical tolerances and iteration cap.
///
/// Any field may be `None` but at least one must be set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Errors
    /// - [`OptError::NoTolerancesProvided`] if all three are `None`.
    /// - [`OptError::InvalidTolGrad`] / [`OptError::InvalidTolCost`] for
    ///   non-finite or non-positive tolerances.
    /// - [`OptError::InvalidMaxIter`] if `max_iter == 0`.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    ) -> OptResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
            return Err(OptError::NoTolerancesProvided);
        }
        verify_tol_grad(tol_grad)?;
        verify_tol_cost(tol_cost)?;
        if let Some(max_iter) = max_iter {
            if max_iter == 0 {
                return Err(OptError::InvalidMaxIter {
                    max_iter,
                    reason: "Maximum iterations must be greater than zero.",
                });
            }
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

impl Default for Tolerances {
    /// `tol_grad = 1e-8`, `tol_cost = None`, `max_iter = 500`.
    fn default() -> Self {
        Self { tol_grad: Some(1e-8), tol_cost: None, max_iter: Some(500) }
    }
}

/// Solver configuration.
///
/// - `tols`: stopping rules.
/// - `line_searcher`: line search inside L-BFGS.
/// - `verbose`: attach the slog observer (only with the `obs_slog` feature).
/// - `lbfgs_mem`: history length; `None` means [`DEFAULT_LBFGS_MEM`](super::DEFAULT_LBFGS_MEM).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MLEOptions {
    pub tols: Tolerances,
    pub line_searcher: LineSearcher,
    pub verbose: bool,
    pub lbfgs_mem: Option<usize>,
}

impl MLEOptions {
    /// Build options, rejecting a zero L-BFGS memory.
    pub fn new(
        tols: Tolerances, line_searcher: LineSearcher, verbose: bool, lbfgs_mem: Option<usize>,
    ) -> OptResult<Self> {
        if let Some(m) = lbfgs_mem {
            if m == 0 {
                return Err(OptError::InvalidLBFGSMem {
                    mem: m,
                    reason: "L-BFGS memory must be greater than zero.",
                });
            }
        }
        Ok(Self { tols, line_searcher, verbose, lbfgs_mem })
    }
}

/// Result of a finished solver run.
///
/// - `theta_hat`: best coefficients found.
/// - `value`: `ℓ(θ̂)`, the log-likelihood rather than the cost.
/// - `converged`: `true` only when a stopping rule on the gradient or cost
///   fired. Running out of iterations is not convergence.
/// - `status`: termination status rendered for diagnostics.
/// - `iterations`, `fn_evals`: Argmin counters.
/// - `grad_norm`: norm of the last cost gradient, if the solver kept one.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimOutcome {
    pub theta_hat: Theta,
    pub value: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
}

impl OptimOutcome {
    /// Build a validated outcome from raw solver state.
    ///
    /// # Errors
    /// Propagates validation failures for `theta_hat` and `value`.
    pub fn new(
        theta_hat_opt: Option<Theta>, value: f64, termination: TerminationStatus, iterations: u64,
        fn_evals: FnEvalMap, grad: Option<Grad>,
    ) -> OptResult<Self> {
        let theta_hat = validate_theta_hat(theta_hat_opt)?;
        validate_value(value)?;
        let converged = is_converged(&termination);
        let status = match &termination {
            TerminationStatus::NotTerminated => "Not terminated".to_string(),
            TerminationStatus::Terminated(reason) => format!("{reason:?}"),
        };
        let grad_norm = grad.map(|g| g.l2_norm());
        Ok(Self {
            theta_hat,
            value,
            converged,
            status,
            iterations: iterations as usize,
            fn_evals,
            grad_norm,
        })
    }
}

fn is_converged(termination: &TerminationStatus) -> bool {
    matches!(
        termination,
        TerminationStatus::Terminated(
            TerminationReason::SolverConverged | TerminationReason::TargetCostReached
        )
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Option validation and the mapping from Argmin termination status to
    // the `converged` flag.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Tolerances must reject an all-empty configuration and bad values.
    //
    // Given
    // -----
    // - All-`None` tolerances, a negative gradient tolerance, zero max_iter.
    //
    // Expect
    // ------
    // - The matching `OptError` variant for each case.
    fn tolerances_reject_invalid_configurations() {
        // Act / Assert
        assert_eq!(Tolerances::new(None, None, None), Err(OptError::NoTolerancesProvided));
        assert!(matches!(
            Tolerances::new(Some(-1.0), None, None),
            Err(OptError::InvalidTolGrad { .. })
        ));
        assert!(matches!(
            Tolerances::new(None, Some(f64::NAN), None),
            Err(OptError::InvalidTolCost { .. })
        ));
        assert!(matches!(
            Tolerances::new(None, None, Some(0)),
            Err(OptError::InvalidMaxIter { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Zero L-BFGS memory is a configuration error.
    //
    // Given
    // -----
    // - `MLEOptions::new` with `lbfgs_mem = Some(0)`.
    //
    // Expect
    // ------
    // - `OptError::InvalidLBFGSMem`.
    fn mle_options_reject_zero_memory() {
        // Act
        let res = MLEOptions::new(Tolerances::default(), LineSearcher::HagerZhang, false, Some(0));

        // Assert
        assert!(matches!(res, Err(OptError::InvalidLBFGSMem { mem: 0, .. })));
    }

    #[test]
    // Purpose
    // -------
    // Line search names parse case-insensitively.
    //
    // Given
    // -----
    // - Mixed-case valid names and one unknown name.
    //
    // Expect
    // ------
    // - Valid names map to their variant; unknown names fail.
    fn line_searcher_parses_case_insensitively() {
        // Act / Assert
        assert_eq!("morethuente".parse::<LineSearcher>(), Ok(LineSearcher::MoreThuente));
        assert_eq!("HAGERZHANG".parse::<LineSearcher>(), Ok(LineSearcher::HagerZhang));
        assert!(matches!(
            "newton".parse::<LineSearcher>(),
            Err(OptError::InvalidLineSearch { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Only genuine convergence sets `converged`; an exhausted iteration
    // budget does not.
    //
    // Given
    // -----
    // - Outcomes built with SolverConverged, MaxItersReached, NotTerminated.
    //
    // Expect
    // ------
    // - `converged` is true, false, false respectively.
    fn outcome_converged_flag_follows_termination_reason() {
        // Arrange
        let build = |status: TerminationStatus| {
            OptimOutcome::new(Some(array![0.5]), -3.0, status, 4, FnEvalMap::new(), None)
        };

        // Act
        let ok = build(TerminationStatus::Terminated(TerminationReason::SolverConverged)).unwrap();
        let capped =
            build(TerminationStatus::Terminated(TerminationReason::MaxItersReached)).unwrap();
        let open = build(TerminationStatus::NotTerminated).unwrap();

        // Assert
        assert!(ok.converged);
        assert!(!capped.converged);
        assert!(!open.converged);
        assert_eq!(open.status, "Not terminated");
        assert_eq!(ok.iterations, 4);
    }

    #[test]
    // Purpose
    // -------
    // Non-finite log-likelihood values are rejected when building an outcome.
    //
    // Given
    // -----
    // - `value = NaN`.
    //
    // Expect
    // ------
    // - `OptError::NonFiniteCost`.
    fn outcome_rejects_non_finite_value() {
        // Act
        let res = OptimOutcome::new(
            Some(array![0.0]),
            f64::NAN,
            TerminationStatus::NotTerminated,
            0,
            FnEvalMap::new(),
            None,
        );

        // Assert
        assert!(matches!(res, Err(OptError::NonFiniteCost { .. })));
    }
}

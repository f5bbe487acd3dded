//! Bridge from a [`LogLikelihood`] to Argmin's `CostFunction` / `Gradient`.
//!
//! Cost is `c(θ) = -ℓ(θ)`. Analytic gradients are negated; when none is
//! available the cost itself is differenced, so no sign flip is needed on
//! that path.
use std::cell::RefCell;

use crate::optimization::{
    errors::OptError,
    loglik_optimizer::{
        finite_diff::run_fd_diff,
        traits::LogLikelihood,
        types::{Cost, Grad, Theta},
        validation::validate_grad,
    },
};
use argmin::core::{CostFunction, Error, Gradient};
use finitediff::FiniteDiff;

/// Argmin problem wrapping a model and the data it is evaluated on.
#[derive(Debug, Clone)]
pub struct ArgMinAdapter<'a, F: LogLikelihood> {
    pub f: &'a F,
    pub data: &'a F::Data,
}

impl<'a, F: LogLikelihood> ArgMinAdapter<'a, F> {
    pub fn new(f: &'a F, data: &'a F::Data) -> Self {
        Self { f, data }
    }
}

impl<F: LogLikelihood> CostFunction for ArgMinAdapter<'_, F> {
    type Param = Theta;
    type Output = Cost;

    /// `-ℓ(θ)`, rejecting non-finite log-likelihoods.
    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let output = self.f.value(theta, self.data)?;
        if !output.is_finite() {
            return Err(OptError::NonFiniteCost { value: output }.into());
        }
        Ok(-output)
    }
}

impl<F: LogLikelihood> Gradient for ArgMinAdapter<'_, F> {
    type Param = Theta;
    type Gradient = Grad;

    /// `-∇ℓ(θ)` when the model supplies it, otherwise a numerical gradient
    /// of the cost.
    ///
    /// The numerical path tries central differences and drops to forward
    /// differences if a cost evaluation failed or the result is not finite.
    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        let dim = theta.len();
        match self.f.grad(theta, self.data) {
            Ok(g) => {
                validate_grad(&g, dim)?;
                Ok(-g)
            }
            Err(OptError::GradientNotImplemented) => {
                let closure_err: RefCell<Option<Error>> = RefCell::new(None);
                let cost_func = |theta: &Theta| -> f64 {
                    match self.cost(theta) {
                        Ok(val) => val,
                        Err(e) => {
                            let mut slot = closure_err.borrow_mut();
                            if slot.is_none() {
                                *slot = Some(e);
                            }
                            f64::NAN
                        }
                    }
                };
                let fd_grad = theta.central_diff(&cost_func);
                if closure_err.borrow().is_none() && validate_grad(&fd_grad, dim).is_ok() {
                    return Ok(fd_grad);
                }
                Ok(run_fd_diff(theta, &cost_func, &closure_err)?)
            }
            Err(e) => Err(e.into()),
        }
    }
}

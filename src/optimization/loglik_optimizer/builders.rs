//! loglik_optimizer::builders — L-BFGS construction.
//!
//! Purpose
//! -------
//! Turn an [`MLEOptions`] into a ready-to-run L-BFGS solver for one of the
//! two supported line searches. Initial coefficients and the iteration cap
//! are runtime concerns handled by [`run_lbfgs`](super::run::run_lbfgs).
//!
//! Conventions
//! -----------
//! - History length is `opts.lbfgs_mem` or [`DEFAULT_LBFGS_MEM`].
//! - Absent tolerances leave Argmin's defaults in place.
//! - Argmin rejections of a tolerance surface as [`OptError`](crate::optimization::errors::OptError)
//!   through the crate's `From<argmin::core::Error>` conversion.
use argmin::solver::quasinewton::LBFGS;

use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        traits::MLEOptions,
        types::{
            Cost, DEFAULT_LBFGS_MEM, Grad, HagerZhangLS, LbfgsHagerZhang, LbfgsMoreThuente,
            MoreThuenteLS, Theta,
        },
    },
};

/// L-BFGS with a Hager–Zhang line search.
///
/// # Errors
/// Tolerances rejected by Argmin.
pub fn build_optimizer_hager_zhang(opts: &MLEOptions) -> OptResult<LbfgsHagerZhang> {
    configure_lbfgs(LBFGS::new(HagerZhangLS::new(), history_len(opts)), opts)
}

/// L-BFGS with a More–Thuente line search.
///
/// # Errors
/// Tolerances rejected by Argmin.
pub fn build_optimizer_more_thuente(opts: &MLEOptions) -> OptResult<LbfgsMoreThuente> {
    configure_lbfgs(LBFGS::new(MoreThuenteLS::new(), history_len(opts)), opts)
}

/// Apply the optional gradient and cost tolerances to any L-BFGS variant.
pub fn configure_lbfgs<L>(
    mut solver: LBFGS<L, Theta, Grad, Cost>, opts: &MLEOptions,
) -> OptResult<LBFGS<L, Theta, Grad, Cost>> {
    if let Some(g) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(g)?;
    }
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(c)?;
    }
    Ok(solver)
}

fn history_len(opts: &MLEOptions) -> usize {
    opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM)
}

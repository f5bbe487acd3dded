//! High-level entry point for maximizing a [`LogLikelihood`].
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        OptimOutcome, Theta,
        adapter::ArgMinAdapter,
        builders::{build_optimizer_hager_zhang, build_optimizer_more_thuente},
        run::run_lbfgs,
        traits::{LineSearcher, LogLikelihood, MLEOptions},
    },
};
use tracing::debug;

/// Maximize `ℓ(θ)` with L-BFGS and the configured line search.
///
/// Parameters
/// ----------
/// - `f`: model implementing [`LogLikelihood`].
/// - `theta0`: starting coefficients; consumed by the solver state.
/// - `data`: payload handed to `f` on every evaluation.
/// - `opts`: tolerances, line search, memory and verbosity.
///
/// Returns
/// -------
/// An [`OptimOutcome`]. A returned outcome may still have
/// `converged == false` (iteration cap hit); deciding whether that is an
/// error belongs to the caller.
///
/// Errors
/// ------
/// - Whatever `f.check` rejects about `theta0`.
/// - Solver construction and runtime failures.
///
/// Examples
/// --------
/// ```
/// use ndarray::{array, Array1};
/// use nrm_ghype::optimization::errors::OptResult;
/// use nrm_ghype::optimization::loglik_optimizer::{maximize, LogLikelihood, MLEOptions};
///
/// struct Bowl;
/// impl LogLikelihood for Bowl {
///     type Data = ();
///     fn value(&self, theta: &Array1<f64>, _: &()) -> OptResult<f64> {
///         Ok(-theta.mapv(|x| (x - 2.0).powi(2)).sum())
///     }
///     fn check(&self, _: &Array1<f64>, _: &()) -> OptResult<()> {
///         Ok(())
///     }
/// }
///
/// let out = maximize(&Bowl, array![0.0], &(), &MLEOptions::default())?;
/// assert!((out.theta_hat[0] - 2.0).abs() < 1e-4);
/// # Ok::<(), nrm_ghype::optimization::errors::OptError>(())
/// ```
pub fn maximize<F: LogLikelihood>(
    f: &F, theta0: Theta, data: &F::Data, opts: &MLEOptions,
) -> OptResult<OptimOutcome> {
    f.check(&theta0, data)?;
    debug!(k = theta0.len(), line_search = ?opts.line_searcher, "maximizing log-likelihood");
    let problem = ArgMinAdapter::new(f, data);
    match opts.line_searcher {
        LineSearcher::MoreThuente => {
            let solver = build_optimizer_more_thuente(opts)?;
            run_lbfgs(theta0, opts, problem, solver)
        }
        LineSearcher::HagerZhang => {
            let solver = build_optimizer_hager_zhang(opts)?;
            run_lbfgs(theta0, opts, problem, solver)
        }
    }
}

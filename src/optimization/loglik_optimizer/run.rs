//! Executor wiring: run a configured L-BFGS solver and normalize its final
//! state into an [`OptimOutcome`].
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        Grad, LogLikelihood, MLEOptions, OptimOutcome, Theta, adapter::ArgMinAdapter,
    },
};
use argmin::core::{CostFunction, Executor, Gradient, State};
use argmin_math::ArgminL2Norm;
use tracing::{debug, trace};

/// Run `solver` on `problem` from `theta0`.
///
/// Behavior
/// --------
/// - Sets the initial coefficients and, if configured, the iteration cap.
/// - With the `obs_slog` feature and `opts.verbose`, attaches a terminal
///   slog observer.
/// - Reads the best coefficients seen; if Argmin kept none, falls back to
///   the last iterate.
///
/// # Errors
/// - Any runtime error from Argmin (line search failures included),
///   converted to [`OptError`](crate::optimization::errors::OptError).
/// - Validation errors from [`OptimOutcome::new`].
pub fn run_lbfgs<'a, F, S>(
    theta0: Theta, opts: &MLEOptions, problem: ArgMinAdapter<'a, F>, solver: S,
) -> OptResult<OptimOutcome>
where
    F: LogLikelihood,
    S: argmin::core::Solver<
            ArgMinAdapter<'a, F>,
            argmin::core::IterState<Theta, Grad, (), (), (), f64>,
        > + Send
        + 'static,
{
    log_initial_state(&theta0, &problem);
    let mut optimizer = Executor::new(problem, solver);
    optimizer = optimizer.configure(|state| state.param(theta0));
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }
    if let Some(max_iter) = opts.tols.max_iter {
        optimizer = optimizer.configure(|state| state.max_iters(max_iter as u64));
    }

    let mut result = optimizer.run()?.state().clone();
    let iterations = result.get_iter();
    let function_counts = result.get_func_counts().clone();
    let termination = result.get_termination_status().clone();
    let grad = result.take_gradient();
    let best_cost = result.get_best_cost();
    let theta_hat = result.take_best_param().or_else(|| result.take_param());
    debug!(iterations, best_cost, status = ?termination, "L-BFGS finished");
    OptimOutcome::new(theta_hat, -best_cost, termination, iterations, function_counts, grad)
}

// ---- Helper Methods ----

/// Trace ℓ(θ₀) and the starting gradient norm. Evaluation failures are left
/// for the solver to report.
fn log_initial_state<F>(theta0: &Theta, problem: &ArgMinAdapter<'_, F>)
where
    F: LogLikelihood,
{
    if !tracing::enabled!(tracing::Level::TRACE) {
        return;
    }
    let ll0 = problem.cost(theta0).map(|c| -c).ok();
    let g0n = problem.gradient(theta0).ok().map(|g| g.l2_norm());
    trace!(?ll0, ?g0n, k = theta0.len(), "L-BFGS starting point");
}

//! loglik_optimizer::types — numeric aliases shared by the NRM optimizer.
//!
//! Purpose
//! -------
//! Pin the concrete `ndarray` and Argmin types used when maximizing a
//! network regression log-likelihood over layer coefficients. Everything
//! else in the optimizer (and the inference layer that consumes its
//! output) refers to these aliases rather than to raw generics.
//!
//! Conventions
//! -----------
//! - [`Theta`] holds one unconstrained coefficient `c_l` per active layer,
//!   in layer order. The model layer maps it to effects `β_l = exp(c_l)`.
//! - [`Hessian`] and [`Covariance`] are dense `k × k` matrices with
//!   `k = Theta.len()`.
//! - [`Cost`] is the negated log-likelihood handed to Argmin.
use argmin::solver::{
    linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
    quasinewton::LBFGS,
};
use ndarray::{Array1, Array2};
use std::collections::HashMap;

/// Coefficient vector `c` in optimizer space.
pub type Theta = Array1<f64>;

/// Gradient vector, same length as [`Theta`].
pub type Grad = Array1<f64>;

/// Dense second-derivative matrix of the log-likelihood or of the cost.
pub type Hessian = Array2<f64>;

/// Asymptotic covariance of the coefficient estimates.
pub type Covariance = Array2<f64>;

/// Scalar objective `c(θ) = -ℓ(θ)` seen by Argmin.
pub type Cost = f64;

/// Function-evaluation counters keyed by Argmin's counter names
/// (e.g. `"cost_count"`, `"gradient_count"`).
pub type FnEvalMap = HashMap<String, u64>;

/// Default L-BFGS history length.
pub const DEFAULT_LBFGS_MEM: usize = 7;

pub type HagerZhangLS = HagerZhangLineSearch<Theta, Grad, Cost>;
pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;

pub type LbfgsHagerZhang = LBFGS<HagerZhangLS, Theta, Grad, Cost>;
pub type LbfgsMoreThuente = LBFGS<MoreThuenteLS, Theta, Grad, Cost>;

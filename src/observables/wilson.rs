// src/observables/wilson.rs
//! Rectangular Wilson loops.

use crate::math::su3::{LinkAlgebra, Su3Matrix, NC};
use crate::space::configuration::LatticeConfiguration;
use crate::space::coordinate::LatticeCoordinate;

/// `Re Tr(W) / 3` of the `n_mu × n_nu` loop in the `(μ, ν)` plane with corner `x`.
///
/// The path runs `n_mu` links forward along μ, `n_nu` forward along ν, then back along μ
/// and back along ν to `x`, multiplying adjoints on the backward legs.
pub fn wilson_loop(
    config: &LatticeConfiguration,
    n_mu: usize,
    n_nu: usize,
    mu: usize,
    nu: usize,
    x: &LatticeCoordinate,
) -> f64 {
    let mut w = Su3Matrix::identity();
    let mut y = *x;
    for _ in 0..n_mu {
        w = w * config.link(&y, mu);
        y.move_by(1, mu);
    }
    for _ in 0..n_nu {
        w = w * config.link(&y, nu);
        y.move_by(1, nu);
    }
    for _ in 0..n_mu {
        y.move_by(-1, mu);
        w = w * config.link(&y, mu).adjoint();
    }
    for _ in 0..n_nu {
        y.move_by(-1, nu);
        w = w * config.link(&y, nu).adjoint();
    }
    w.re_trace() / NC as f64
}

// src/observables/smearing.rs
/*!
Gauge-covariant spatial smearing of an ensemble.

One smearing step replaces every spatial link by
`U_μ(x) + ε a² Δ_μ(x)`, where `Δ` is the discretised gauge-covariant second derivative

`Δ_μ(x) = Σ_ρ 1/(u₀a)² [ U_ρ(x) U_μ(x+ρ) U_ρ†(x+μ) − 2u₀² U_μ(x) + U_ρ†(x−ρ) U_μ(x−ρ) U_ρ(x−ρ+μ) ]`

summed over all four `ρ`. Time-like links are left untouched and the smeared links are not
projected back onto SU(3).
*/

use log::debug;

use crate::math::su3::{LinkAlgebra, Su3Matrix};
use crate::space::configuration::LatticeConfiguration;
use crate::space::coordinate::{sites, NDIM};

/// Number of spatial directions; direction `3` is time.
const SPATIAL_DIMS: usize = 3;

/// Gauge-covariant derivative of every link of `config`, stored link-wise in a configuration
/// of the same grid.
pub fn gauge_derivative(config: &LatticeConfiguration, u0: f64, a: f64) -> LatticeConfiguration {
    let norm = 1.0 / (u0 * a).powi(2);
    let two_u0_sq = 2.0 * u0 * u0;
    let mut out = LatticeConfiguration::new(config.grid());

    for x in sites(config.grid()) {
        for mu in 0..NDIM {
            let u_mu = config.link(&x, mu);
            let x_p_mu = x.offset(1, mu);
            let mut d = Su3Matrix::ZERO;
            for rho in 0..NDIM {
                let x_p_rho = x.offset(1, rho);
                let x_m_rho = x.offset(-1, rho);
                let x_m_rho_p_mu = x_m_rho.offset(1, mu);

                let forward =
                    config.link(&x, rho) * config.link(&x_p_rho, mu) * config.link(&x_p_mu, rho).adjoint();
                let backward = config.link(&x_m_rho, rho).adjoint()
                    * config.link(&x_m_rho, mu)
                    * config.link(&x_m_rho_p_mu, rho);
                d += (forward - u_mu.scale(two_u0_sq) + backward).scale(norm);
            }
            out.set_link(&x, mu, d);
        }
    }
    out
}

/// Apply `times` smearing steps to every configuration of `ensemble`.
///
/// `times = 0` leaves the ensemble bit-for-bit unchanged.
pub fn spatial_smearing(
    ensemble: &mut [LatticeConfiguration],
    times: usize,
    parameter: f64,
    u0: f64,
    a: f64,
) {
    let weight = parameter * a * a;
    for step in 0..times {
        for config in ensemble.iter_mut() {
            let derivative = gauge_derivative(config, u0, a);
            for x in sites(config.grid()) {
                for mu in 0..SPATIAL_DIMS {
                    let smeared = config.link(&x, mu).add_scaled(&derivative.link(&x, mu), weight);
                    config.set_link(&x, mu, smeared);
                }
            }
        }
        debug!("smearing step {}/{} done", step + 1, times);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::coordinate::LatticeCoordinate;

    #[test]
    fn derivative_of_identity_lattice() {
        let (u0, a) = (0.8, 0.25);
        let cfg = LatticeConfiguration::new([2, 2, 2, 2]);
        let d = gauge_derivative(&cfg, u0, a);
        // Each ρ contributes (2 − 2u₀²)·I/(u₀a)².
        let expected = Su3Matrix::IDENTITY.scale(4.0 * (2.0 - 2.0 * u0 * u0) / (u0 * a).powi(2));
        assert!(d.links().all(|(_, _, m)| m.max_abs_diff(&expected) < 1e-10));
    }

    #[test]
    fn only_spatial_links_move() {
        let grid = [2, 2, 2, 2];
        let mut ensemble = vec![LatticeConfiguration::new(grid)];
        spatial_smearing(&mut ensemble, 2, 0.1, 0.8, 0.25);
        let x = LatticeCoordinate::origin(grid).unwrap();
        assert_eq!(ensemble[0].link(&x, 3), Su3Matrix::IDENTITY);
        assert_ne!(ensemble[0].link(&x, 0), Su3Matrix::IDENTITY);
    }
}

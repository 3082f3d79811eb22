// src/gauge/action.rs
/*!
Local Wilson gauge action of a single link.

For the link `U_μ(x)` everything in the action that does not depend on the link itself is
collected once into a [`LinkEnvironment`]:

- `gamma`: sum of the 6 plaquette staples,
  Σ_{ν≠μ} [U_ν(x+μ) U_μ†(x+ν) U_ν†(x) + U_ν†(x+μ−ν) U_μ†(x−ν) U_ν(x−ν)];
- `gamma_improved`: sum of the 18 rectangle (1×2) staples, only for the improved action.

The local action is then
- standard: `S = −(β/3) Re Tr(U Γ)`
- improved: `S = −(β̃/3) [ 5/(3u₀⁴) Re Tr(U Γ) − 1/(12u₀⁶) Re Tr(U Γ_imp) ]`.

The environment must belong to the same `(x, μ)` as the link it is paired with. This is not
checked.
*/

use serde::{Deserialize, Serialize};

use crate::math::su3::{LinkAlgebra, Su3Matrix};
use crate::space::configuration::LatticeConfiguration;
use crate::space::coordinate::{LatticeCoordinate, NDIM};

/// Which discretisation of the gauge action to sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    Standard,
    Improved,
}

/// Couplings entering the action.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaugeCouplings {
    /// Standard-action coupling `β`.
    pub beta: f64,
    /// Improved-action coupling `β̃`.
    pub beta_tilde: f64,
    /// Tadpole factor (mean link) `u₀`.
    pub u0: f64,
}

/// Link-independent part of the local action at `(x, μ)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkEnvironment {
    pub gamma: Su3Matrix,
    /// Zero for the standard action.
    pub gamma_improved: Su3Matrix,
}

/// Evaluates environments and local actions for one action kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaugeAction {
    pub kind: ActionKind,
    pub couplings: GaugeCouplings,
}

impl GaugeAction {
    pub fn new(kind: ActionKind, couplings: GaugeCouplings) -> Self {
        Self { kind, couplings }
    }

    /// Environment of `U_μ(x)`; the rectangle staples are only built for the improved action.
    pub fn environment(
        &self,
        config: &LatticeConfiguration,
        x: &LatticeCoordinate,
        mu: usize,
    ) -> LinkEnvironment {
        let gamma_improved = match self.kind {
            ActionKind::Standard => Su3Matrix::ZERO,
            ActionKind::Improved => gamma_improved(config, x, mu),
        };
        LinkEnvironment {
            gamma: gamma(config, x, mu),
            gamma_improved,
        }
    }

    /// Local action of `link` in environment `env`.
    #[inline]
    pub fn local_action(&self, link: &Su3Matrix, env: &LinkEnvironment) -> f64 {
        let GaugeCouplings { beta, beta_tilde, u0 } = self.couplings;
        match self.kind {
            ActionKind::Standard => -beta / 3.0 * link.re_trace_mul(&env.gamma),
            ActionKind::Improved => {
                let plaq = 5.0 / (3.0 * u0.powi(4)) * link.re_trace_mul(&env.gamma);
                let rect = 1.0 / (12.0 * u0.powi(6)) * link.re_trace_mul(&env.gamma_improved);
                -beta_tilde / 3.0 * (plaq - rect)
            }
        }
    }
}

/// Plaquette staple sum at `(x, μ)`.
pub fn gamma(config: &LatticeConfiguration, x: &LatticeCoordinate, mu: usize) -> Su3Matrix {
    let u = |y: &LatticeCoordinate, d: usize| config.link(y, d);
    let x_p_mu = x.offset(1, mu);

    let mut g = Su3Matrix::ZERO;
    for nu in (0..NDIM).filter(|&nu| nu != mu) {
        let x_p_nu = x.offset(1, nu);
        let x_m_nu = x.offset(-1, nu);
        let x_p_mu_m_nu = x_p_mu.offset(-1, nu);

        g += u(&x_p_mu, nu) * u(&x_p_nu, mu).adjoint() * u(x, nu).adjoint();
        g += u(&x_p_mu_m_nu, nu).adjoint() * u(&x_m_nu, mu).adjoint() * u(&x_m_nu, nu);
    }
    g
}

/// Rectangle staple sum at `(x, μ)`: six 1×2 staples per `ν ≠ μ`.
pub fn gamma_improved(config: &LatticeConfiguration, x: &LatticeCoordinate, mu: usize) -> Su3Matrix {
    let u = |y: &LatticeCoordinate, d: usize| config.link(y, d);
    let ud = |y: &LatticeCoordinate, d: usize| config.link(y, d).adjoint();

    let x_p_mu = x.offset(1, mu);
    let x_p_2mu = x.offset(2, mu);
    let x_m_mu = x.offset(-1, mu);

    let mut g = Su3Matrix::ZERO;
    for nu in (0..NDIM).filter(|&nu| nu != mu) {
        let x_p_nu = x.offset(1, nu);
        let x_m_nu = x.offset(-1, nu);
        let x_p_2nu = x.offset(2, nu);
        let x_m_2nu = x.offset(-2, nu);
        let x_p_mu_p_nu = x_p_mu.offset(1, nu);
        let x_p_mu_m_nu = x_p_mu.offset(-1, nu);
        let x_p_mu_m_2nu = x_p_mu.offset(-2, nu);
        let x_p_2mu_m_nu = x_p_2mu.offset(-1, nu);
        let x_m_mu_p_nu = x_m_mu.offset(1, nu);
        let x_m_mu_m_nu = x_m_mu.offset(-1, nu);

        // 2×1 in μ, upper and lower
        g += u(&x_p_mu, mu) * u(&x_p_2mu, nu) * ud(&x_p_mu_p_nu, mu) * ud(&x_p_nu, mu) * ud(x, nu);
        g += u(&x_p_mu, mu)
            * ud(&x_p_2mu_m_nu, nu)
            * ud(&x_p_mu_m_nu, mu)
            * ud(&x_m_nu, mu)
            * u(&x_m_nu, nu);
        // 1×2 in ν, upper and lower
        g += u(&x_p_mu, nu) * u(&x_p_mu_p_nu, nu) * ud(&x_p_2nu, mu) * ud(&x_p_nu, nu) * ud(x, nu);
        g += ud(&x_p_mu_m_nu, nu)
            * ud(&x_p_mu_m_2nu, nu)
            * ud(&x_m_2nu, mu)
            * u(&x_m_2nu, nu)
            * u(&x_m_nu, nu);
        // 2×1 extending backwards in μ, upper and lower
        g += u(&x_p_mu, nu) * ud(&x_p_nu, mu) * ud(&x_m_mu_p_nu, mu) * ud(&x_m_mu, nu) * u(&x_m_mu, mu);
        g += ud(&x_p_mu_m_nu, nu)
            * ud(&x_m_nu, mu)
            * ud(&x_m_mu_m_nu, mu)
            * u(&x_m_mu_m_nu, nu)
            * u(&x_m_mu, mu);
    }
    g
}

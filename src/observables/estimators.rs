// src/observables/estimators.rs
/*!
Ensemble estimators for Wilson-loop and custom observables.

Every analysis reduces each configuration to one lattice-averaged number `m_i` and then
reports
- `mean  = Σ m_i / N`
- `error = sqrt((Σ m_i² / N − mean²) / N)`

i.e. the direct standard error of the per-configuration means. Rounding can push the
variance slightly below zero for a constant sample; it is clamped to `0`.

# Analyses
- [`Analysis::PlaquetteRectangle`]: ⟨W(1,1)⟩ and ⟨W(2,1)⟩ over every site and every plane
  `ν < μ`.
- [`Analysis::QuarkPotential`]: the R×T loop table in the (space, time) planes, the ratios
  `W(R,T)/W(R,T+1)` and the potential estimate `W(R,nT−1)/W(R,nT)`.
- [`Analysis::Custom`]: any per-link function, see [`CustomObservable`].
*/

use std::fmt;
use std::path::PathBuf;

use log::{debug, info};

use super::report::{AnalysisReport, LoopTable, PotentialReport};
use super::wilson::wilson_loop;
use crate::error::{LatticeError, Result};
use crate::math::su3::{LinkAlgebra, NC};
use crate::space::configuration::LatticeConfiguration;
use crate::space::coordinate::{sites, LatticeCoordinate, NDIM};

/// Time direction.
const TIME: usize = 3;

// ======================================================================================
// ----------------------------------- Reduction ----------------------------------------
// ======================================================================================

/// Mean and standard error of an ensemble observable.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize)]
pub struct Estimate {
    pub mean: f64,
    pub error: f64,
}

impl fmt::Display for Estimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  +/-  {}", self.mean, self.error)
    }
}

/// Running sums of per-configuration means.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanAccumulator {
    sum: f64,
    sum_sq: f64,
    count: usize,
}

impl MeanAccumulator {
    #[inline]
    pub fn push(&mut self, m: f64) {
        self.sum += m;
        self.sum_sq += m * m;
        self.count += 1;
    }

    /// Mean and standard error; `NaN` on an empty accumulator.
    pub fn finish(&self) -> Estimate {
        let n = self.count as f64;
        let mean = self.sum / n;
        let variance = (self.sum_sq / n - mean * mean).max(0.0);
        Estimate {
            mean,
            error: (variance / n).sqrt(),
        }
    }
}

// ======================================================================================
// ---------------------------------- Custom Observable ---------------------------------
// ======================================================================================

type LinkFunction = dyn Fn(&LatticeConfiguration, &LatticeCoordinate, usize) -> f64 + Send + Sync;

/// A user-defined function of the links, evaluated at every `(x, μ)`.
///
/// The lattice average divides the sum over all sites and directions by
/// `V · multiplicity`, so `multiplicity` is the number of equivalent terms summed per site.
pub struct CustomObservable {
    pub name: String,
    pub multiplicity: f64,
    f: Box<LinkFunction>,
}

impl CustomObservable {
    pub fn new<F>(name: impl Into<String>, multiplicity: f64, f: F) -> Self
    where
        F: Fn(&LatticeConfiguration, &LatticeCoordinate, usize) -> f64 + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            multiplicity,
            f: Box::new(f),
        }
    }

    /// ⟨Re Tr U_μ(x) / 3⟩ averaged over the four directions.
    pub fn mean_link() -> Self {
        Self::new("mean link", NDIM as f64, |cfg, x, mu| {
            cfg.link(x, mu).re_trace() / NC as f64
        })
    }

    #[inline]
    pub fn evaluate(&self, config: &LatticeConfiguration, x: &LatticeCoordinate, mu: usize) -> f64 {
        (self.f)(config, x, mu)
    }

    /// Lattice average of the observable on one configuration.
    pub fn lattice_average(&self, config: &LatticeConfiguration) -> f64 {
        let total: f64 = sites(config.grid())
            .map(|x| (0..NDIM).map(|mu| self.evaluate(config, &x, mu)).sum::<f64>())
            .sum();
        total / (config.volume() as f64 * self.multiplicity)
    }
}

impl fmt::Debug for CustomObservable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomObservable")
            .field("name", &self.name)
            .field("multiplicity", &self.multiplicity)
            .finish_non_exhaustive()
    }
}

// ======================================================================================
// ------------------------------------ Dispatch ----------------------------------------
// ======================================================================================

/// Analysis to run on an ensemble.
#[derive(Debug)]
pub enum Analysis {
    PlaquetteRectangle,
    /// Tables are written to `output_dir` when set.
    QuarkPotential { output_dir: Option<PathBuf> },
    Custom(CustomObservable),
}

/// Compute the requested analysis. `banner` heads every table written to disk.
pub fn compute_statistics(
    ensemble: &[LatticeConfiguration],
    analysis: &Analysis,
    banner: &str,
) -> Result<AnalysisReport> {
    if ensemble.is_empty() {
        return Err(LatticeError::InvalidParameters(
            "cannot compute statistics on an empty ensemble".into(),
        ));
    }
    info!("computing statistics on {} configurations", ensemble.len());
    let report = match analysis {
        Analysis::PlaquetteRectangle => {
            let (plaquette, rectangle) = plaquette_rectangle(ensemble);
            AnalysisReport::PlaquetteRectangle { plaquette, rectangle }
        }
        Analysis::QuarkPotential { output_dir } => {
            let report = quark_potential(ensemble)?;
            if let Some(dir) = output_dir {
                report.write_tables(dir, banner)?;
                info!("R×T tables written to {}", dir.display());
            }
            AnalysisReport::QuarkPotential(report)
        }
        Analysis::Custom(obs) => AnalysisReport::Custom {
            name: obs.name.clone(),
            estimate: custom(ensemble, obs),
        },
    };
    Ok(report)
}

// ======================================================================================
// ------------------------------------ Analyses ----------------------------------------
// ======================================================================================

/// ⟨W(1,1)⟩ and ⟨W(2,1)⟩ over all sites and the 6 planes `ν < μ`.
pub fn plaquette_rectangle(ensemble: &[LatticeConfiguration]) -> (Estimate, Estimate) {
    let mut plaq = MeanAccumulator::default();
    let mut rect = MeanAccumulator::default();
    for (i, cfg) in ensemble.iter().enumerate() {
        let (mut p, mut r) = (0.0, 0.0);
        for x in sites(cfg.grid()) {
            for mu in 0..NDIM {
                for nu in 0..mu {
                    p += wilson_loop(cfg, 1, 1, mu, nu, &x);
                    r += wilson_loop(cfg, 2, 1, mu, nu, &x);
                }
            }
        }
        let norm = 6.0 * cfg.volume() as f64;
        plaq.push(p / norm);
        rect.push(r / norm);
        debug!("configuration {}/{} reduced", i + 1, ensemble.len());
    }
    (plaq.finish(), rect.finish())
}

/// Loop extents `(nR, nT)` used by the potential analysis on `grid`.
pub fn loop_extents(grid: [usize; NDIM]) -> (usize, usize) {
    let n_r = grid[0].min(grid[1]).min(grid[2]) / 2;
    let n_t = grid[TIME] / 2;
    (n_r, n_t)
}

/// R×T loops in (space, time) planes, their ratios and the potential estimate.
pub fn quark_potential(ensemble: &[LatticeConfiguration]) -> Result<PotentialReport> {
    let grid = ensemble
        .first()
        .map(LatticeConfiguration::grid)
        .ok_or_else(|| LatticeError::InvalidParameters("empty ensemble".into()))?;
    let (n_r, n_t) = loop_extents(grid);
    if n_r < 1 || n_t < 2 {
        return Err(LatticeError::InvalidParameters(format!(
            "quark potential needs nR >= 1 and nT >= 2, grid {grid:?} gives nR = {n_r}, nT = {n_t}"
        )));
    }

    let mut acc = vec![MeanAccumulator::default(); n_t * n_r];
    for (i, cfg) in ensemble.iter().enumerate() {
        let norm = 6.0 * cfg.volume() as f64;
        for t in 1..=n_t {
            for r in 1..=n_r {
                let mut w = 0.0;
                for x in sites(cfg.grid()) {
                    for s in 0..TIME {
                        w += wilson_loop(cfg, t, r, TIME, s, &x) + wilson_loop(cfg, r, t, s, TIME, &x);
                    }
                }
                acc[(t - 1) * n_r + (r - 1)].push(w / norm);
            }
        }
        debug!("configuration {}/{} reduced", i + 1, ensemble.len());
    }

    let mut loops = LoopTable::new(n_t, n_r);
    for t in 1..=n_t {
        for r in 1..=n_r {
            loops.set(t, r, acc[(t - 1) * n_r + (r - 1)].finish());
        }
    }

    let mut ratios = LoopTable::new(n_t - 1, n_r);
    for t in 1..n_t {
        for r in 1..=n_r {
            let w0 = loops.get(t, r);
            let w1 = loops.get(t + 1, r);
            let ratio = w0.mean / w1.mean;
            let error = ratio.abs()
                * ((w0.error / w0.mean).powi(2) + (w1.error / w1.mean).powi(2)).sqrt();
            ratios.set(t, r, Estimate { mean: ratio, error });
        }
    }

    let potential = (1..=n_r).map(|r| ratios.get(n_t - 1, r)).collect();
    Ok(PotentialReport {
        n_r,
        n_t,
        loops,
        ratios,
        potential,
    })
}

/// Ensemble estimate of a custom observable.
pub fn custom(ensemble: &[LatticeConfiguration], obs: &CustomObservable) -> Estimate {
    let mut acc = MeanAccumulator::default();
    for cfg in ensemble {
        acc.push(obs.lattice_average(cfg));
    }
    acc.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn accumulator_matches_hand_computation() {
        let mut acc = MeanAccumulator::default();
        for m in [1.0, 2.0, 3.0, 6.0] {
            acc.push(m);
        }
        let e = acc.finish();
        assert_abs_diff_eq!(e.mean, 3.0, epsilon = 1e-15);
        // Σm²/N = 50/4 = 12.5; variance 3.5; error sqrt(3.5/4)
        assert_abs_diff_eq!(e.error, (3.5_f64 / 4.0).sqrt(), epsilon = 1e-14);
    }

    #[test]
    fn constant_sample_has_zero_error() {
        let mut acc = MeanAccumulator::default();
        for _ in 0..7 {
            acc.push(0.1);
        }
        assert_eq!(acc.finish().error, 0.0);
    }

    #[test]
    fn loop_extents_follow_the_grid() {
        assert_eq!(loop_extents([8, 6, 10, 9]), (3, 4));
        assert_eq!(loop_extents([2, 2, 2, 2]), (1, 1));
    }

    #[test]
    fn potential_rejects_short_time_extent() {
        let ensemble = vec![LatticeConfiguration::new([2, 2, 2, 3])];
        assert!(matches!(
            quark_potential(&ensemble),
            Err(LatticeError::InvalidParameters(_))
        ));
    }

    #[test]
    fn empty_ensemble_is_rejected() {
        let r = compute_statistics(&[], &Analysis::PlaquetteRectangle, "");
        assert!(r.is_err());
    }

    #[test]
    fn custom_observable_normalises_by_multiplicity() {
        let ensemble = vec![LatticeConfiguration::new([2, 1, 1, 2]); 3];
        let e = custom(&ensemble, &CustomObservable::mean_link());
        assert_abs_diff_eq!(e.mean, 1.0, epsilon = 1e-15);
        let counting = CustomObservable::new("count", 2.0, |_, _, _| 1.0);
        assert_abs_diff_eq!(custom(&ensemble, &counting).mean, 2.0, epsilon = 1e-15);
    }
}

// src/gauge/metropolis.rs
/*!
Link-by-link Metropolis sampler for SU(3) gauge configurations.

# Sweep
Sites are visited in lexicographic order (index 0 slowest) and, at each site, directions
`0..4`. For every link the environment (staple sums) is computed once, then `InnerCycles`
proposals `U' = C U` are tried with `C` drawn uniformly from the candidate pool. A proposal
is accepted if `ΔS < 0` or `exp(−ΔS) > u`, `u ~ U(0, 1)`.

# Run
`run()` rebuilds the candidate pool, clears the ensemble, performs `10 · Ncorr`
thermalisation sweeps and then stores `Ncf` configurations, each followed by `Ncorr`
decorrelation sweeps. The sampler moves through
`Uninitialized → Thermalizing → Sampling → Idle`.

# Randomness
The sampler owns one random stream `R` (default [`ChaCha8Rng`]) seeded according to
[`SeedPolicy`]. With `SeedPolicy::ReseedPerCall` the stream is reseeded from OS entropy at
the start of every sweep and every candidate build.
*/

use std::path::Path;

use log::{debug, info, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use super::action::GaugeAction;
use super::candidates::CandidateSet;
use super::persistence::{
    read_compact, settings_banner, write_compact, write_configuration_dump, write_verbose,
};
use super::settings::{SamplerSettings, SeedPolicy};
use crate::error::{LatticeError, Result};
use crate::observables::estimators::{self, Analysis};
use crate::observables::report::AnalysisReport;
use crate::observables::{smearing, wilson};
use crate::space::configuration::LatticeConfiguration;
use crate::space::coordinate::{check_direction, sites, LatticeCoordinate, NDIM};

/// Thermalisation length in units of `Ncorr`.
const THERMALIZATION_FACTOR: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SamplerState {
    Uninitialized,
    Thermalizing,
    Sampling,
    Idle,
}

/// Outcome of [`GaugeMetropolis::run`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunSummary {
    /// Mean acceptance over the sampling sweeps; `0.0` if there were none.
    pub mean_acceptance: f64,
    pub sampling_sweeps: usize,
}

#[derive(Debug, Clone)]
pub struct GaugeMetropolis<R = ChaCha8Rng> {
    settings: SamplerSettings,
    action: GaugeAction,
    candidates: CandidateSet,
    current: LatticeConfiguration,
    ensemble: Vec<LatticeConfiguration>,
    state: SamplerState,
    rng: R,
}

//===================================================================
// ------------------------- Construction ---------------------------
//===================================================================

impl GaugeMetropolis<ChaCha8Rng> {
    /// Build from the positional parameter vectors, see [`SamplerSettings::from_vectors`].
    pub fn new(
        grid: &[usize],
        int_params: &[i64],
        float_params: &[f64],
        improved: bool,
    ) -> Result<Self> {
        Self::with_rng(SamplerSettings::from_vectors(grid, int_params, float_params, improved)?)
    }

    pub fn from_settings(settings: SamplerSettings) -> Result<Self> {
        Self::with_rng(settings)
    }

    /// Restore settings and ensemble from a compact file.
    pub fn load(path: &Path) -> Result<Self> {
        let (settings, ensemble) = read_compact(path)?;
        let mut sampler = Self::with_rng(settings)?;
        info!(
            "loaded {} configurations on grid {:?} from {}",
            ensemble.len(),
            sampler.grid(),
            path.display()
        );
        let non_finite = ensemble.iter().filter(|c| !c.is_finite()).count();
        if non_finite > 0 {
            warn!("{non_finite} loaded configurations contain non-finite link elements");
        }
        sampler.ensemble = ensemble;
        Ok(sampler)
    }
}

impl<R: Rng + SeedableRng> GaugeMetropolis<R> {
    /// Sampler with any seedable random stream.
    pub fn with_rng(settings: SamplerSettings) -> Result<Self> {
        settings.validate()?;
        let rng = match settings.seed {
            SeedPolicy::Fixed(seed) => R::seed_from_u64(seed),
            SeedPolicy::Entropy | SeedPolicy::ReseedPerCall => R::from_os_rng(),
        };
        Ok(Self {
            action: GaugeAction::new(settings.action_kind(), settings.couplings()),
            current: LatticeConfiguration::new(settings.grid),
            candidates: CandidateSet::new(),
            ensemble: Vec::new(),
            state: SamplerState::Uninitialized,
            settings,
            rng,
        })
    }

    #[inline]
    fn reseed_if_requested(&mut self) {
        if self.settings.seed == SeedPolicy::ReseedPerCall {
            self.rng = R::from_os_rng();
        }
    }
}

//===================================================================
// --------------------------- Sampling -----------------------------
//===================================================================

impl<R: Rng + SeedableRng> GaugeMetropolis<R> {
    /// Rebuild the pool of `2 · NofSU3` proposal matrices.
    pub fn randomize_candidates(&mut self) -> Result<()> {
        self.reseed_if_requested();
        self.candidates
            .randomize(self.settings.nof_su3, self.settings.epsilon, &mut self.rng)?;
        debug!("candidate pool rebuilt with {} elements", self.candidates.len());
        Ok(())
    }

    /// One full sweep over the current configuration; returns the acceptance ratio.
    pub fn update_current_path(&mut self) -> Result<f64> {
        if self.candidates.is_empty() {
            return Err(LatticeError::EmptyCandidateSet);
        }
        self.reseed_if_requested();

        let inner = self.settings.inner_cycles;
        let mut accepted = 0usize;
        for x in sites(self.current.grid()) {
            for mu in 0..NDIM {
                let env = self.action.environment(&self.current, &x, mu);
                for _ in 0..inner {
                    let old = self.current.link(&x, mu);
                    let proposal = *self.candidates.choose(&mut self.rng) * old;
                    let delta = self.action.local_action(&proposal, &env)
                        - self.action.local_action(&old, &env);
                    if delta < 0.0 || (-delta).exp() > self.rng.random::<f64>() {
                        self.current.set_link(&x, mu, proposal);
                        accepted += 1;
                    }
                }
            }
        }
        Ok(accepted as f64 / (self.current.volume() * NDIM * inner) as f64)
    }

    /// Thermalise, then collect `Ncf` configurations.
    ///
    /// The sampler is left [`SamplerState::Idle`] whether or not the run succeeds; after a
    /// failed sweep the ensemble holds the configurations stored so far.
    pub fn run(&mut self) -> Result<RunSummary> {
        let outcome = self.run_chain();
        self.state = SamplerState::Idle;
        if let Err(e) = &outcome {
            warn!("run aborted: {e}");
        }
        outcome
    }

    fn run_chain(&mut self) -> Result<RunSummary> {
        let ncorr = self.settings.ncorr;
        let ncf = self.settings.ncf;

        self.randomize_candidates()?;
        self.ensemble.clear();

        self.state = SamplerState::Thermalizing;
        let thermalization = THERMALIZATION_FACTOR * ncorr;
        info!("thermalizing with {thermalization} sweeps");
        for sweep in 0..thermalization {
            let acceptance = self.update_current_path()?;
            debug!("thermalization sweep {}/{thermalization}: acceptance {acceptance:.4}", sweep + 1);
        }

        self.state = SamplerState::Sampling;
        let mut acceptance_sum = 0.0;
        let mut sampling_sweeps = 0usize;
        for i in 0..ncf {
            self.ensemble.push(self.current.clone());
            for _ in 0..ncorr {
                acceptance_sum += self.update_current_path()?;
                sampling_sweeps += 1;
            }
            info!("configuration {}/{ncf} stored", i + 1);
        }

        let mean_acceptance = if sampling_sweeps == 0 {
            0.0
        } else {
            acceptance_sum / sampling_sweeps as f64
        };
        info!("run finished: mean acceptance {mean_acceptance:.4} over {sampling_sweeps} sweeps");
        Ok(RunSummary {
            mean_acceptance,
            sampling_sweeps,
        })
    }
}

//===================================================================
// ------------------------ Ensemble & I/O --------------------------
//===================================================================

impl<R> GaugeMetropolis<R> {
    /// Reset every stored configuration to identity on the current grid.
    pub fn clear_result(&mut self) {
        let grid = self.settings.grid;
        for config in &mut self.ensemble {
            config.reshape(grid);
        }
    }

    /// Wilson loop on the `j`-th stored configuration.
    pub fn wilson_loop(
        &self,
        n_mu: usize,
        n_nu: usize,
        mu: usize,
        nu: usize,
        x: &LatticeCoordinate,
        j: usize,
    ) -> Result<f64> {
        let config = self.ensemble.get(j).ok_or(LatticeError::EnsembleIndex {
            index: j,
            len: self.ensemble.len(),
        })?;
        check_direction(mu)?;
        check_direction(nu)?;
        if x.grid() != config.grid() {
            return Err(LatticeError::ShapeMismatch {
                coordinate: x.grid(),
                configuration: config.grid(),
            });
        }
        Ok(wilson::wilson_loop(config, n_mu, n_nu, mu, nu, x))
    }

    /// Smear the spatial links of every stored configuration `times` times.
    pub fn spatial_smearing(&mut self, times: usize, parameter: f64) {
        info!("applying {times} spatial smearing steps with parameter {parameter}");
        smearing::spatial_smearing(
            &mut self.ensemble,
            times,
            parameter,
            self.settings.u0,
            self.settings.spacing,
        );
    }

    /// Run an analysis on the stored ensemble.
    pub fn compute_statistics(&self, analysis: &Analysis) -> Result<AnalysisReport> {
        estimators::compute_statistics(&self.ensemble, analysis, &self.banner())
    }

    /// Settings header used by the text outputs.
    pub fn banner(&self) -> String {
        settings_banner(&self.settings)
    }

    /// Write settings and ensemble in the compact format.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_compact(path, &self.settings, &self.ensemble)?;
        info!("ensemble written to {}", path.display());
        Ok(())
    }

    /// Write settings and ensemble in the human-readable format.
    pub fn save_verbose(&self, path: &Path) -> Result<()> {
        write_verbose(path, &self.settings, &self.ensemble)
    }

    /// Dump the current configuration element by element.
    pub fn dump_current(&self, path: &Path) -> Result<()> {
        write_configuration_dump(path, &self.current)
    }

    // ---- getters ----

    pub fn state(&self) -> SamplerState {
        self.state
    }
    pub fn settings(&self) -> &SamplerSettings {
        &self.settings
    }
    pub fn grid(&self) -> [usize; NDIM] {
        self.settings.grid
    }
    pub fn ncorr(&self) -> usize {
        self.settings.ncorr
    }
    pub fn ncf(&self) -> usize {
        self.settings.ncf
    }
    pub fn epsilon(&self) -> f64 {
        self.settings.epsilon
    }
    pub fn beta(&self) -> f64 {
        self.settings.beta
    }
    pub fn beta_tilde(&self) -> f64 {
        self.settings.beta_tilde
    }
    pub fn u0(&self) -> f64 {
        self.settings.u0
    }
    pub fn spacing(&self) -> f64 {
        self.settings.spacing
    }
    pub fn is_improved(&self) -> bool {
        self.settings.improved
    }
    pub fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }
    pub fn current(&self) -> &LatticeConfiguration {
        &self.current
    }
    pub fn ensemble(&self) -> &[LatticeConfiguration] {
        &self.ensemble
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_settings() -> SamplerSettings {
        SamplerSettings {
            grid: [2, 2, 2, 2],
            nof_su3: 10,
            ncorr: 1,
            inner_cycles: 2,
            ncf: 2,
            seed: SeedPolicy::Fixed(2024),
            ..SamplerSettings::default()
        }
    }

    #[test]
    fn fresh_sampler_is_uninitialized_identity() {
        let s = GaugeMetropolis::from_settings(small_settings()).unwrap();
        assert_eq!(s.state(), SamplerState::Uninitialized);
        assert!(s.candidates().is_empty());
        assert!(s.ensemble().is_empty());
        assert_eq!(s.current(), &LatticeConfiguration::new([2, 2, 2, 2]));
    }

    #[test]
    fn sweep_without_candidates_fails() {
        let mut s = GaugeMetropolis::from_settings(small_settings()).unwrap();
        assert!(matches!(
            s.update_current_path(),
            Err(LatticeError::EmptyCandidateSet)
        ));
    }

    #[test]
    fn sweep_acceptance_is_a_ratio() {
        let mut s = GaugeMetropolis::from_settings(small_settings()).unwrap();
        s.randomize_candidates().unwrap();
        assert_eq!(s.candidates().len(), 20);
        for _ in 0..3 {
            let acc = s.update_current_path().unwrap();
            assert!((0.0..=1.0).contains(&acc));
        }
        assert_ne!(s.current(), &LatticeConfiguration::new([2, 2, 2, 2]));
    }

    #[test]
    fn failed_run_returns_to_idle() {
        let mut s = GaugeMetropolis::from_settings(small_settings()).unwrap();
        s.settings.nof_su3 = 0;
        assert!(matches!(s.run(), Err(LatticeError::EmptyCandidateSet)));
        assert_eq!(s.state(), SamplerState::Idle);
        assert!(s.ensemble().is_empty());
    }

    #[test]
    fn acceptance_is_a_ratio_across_seeds_grids_and_couplings() {
        let grids = [[2, 2, 2, 2], [3, 2, 4, 2]];
        for seed in [1, 7, 42, 31337] {
            for grid in grids {
                for improved in [false, true] {
                    for (epsilon, beta) in [(0.05, 5.5), (0.24, 1.0), (0.8, 12.0)] {
                        let settings = SamplerSettings {
                            grid,
                            nof_su3: 6,
                            inner_cycles: 2,
                            epsilon,
                            beta,
                            improved,
                            seed: SeedPolicy::Fixed(seed),
                            ..SamplerSettings::default()
                        };
                        let mut s = GaugeMetropolis::from_settings(settings).unwrap();
                        s.randomize_candidates().unwrap();
                        for _ in 0..2 {
                            let acc = s.update_current_path().unwrap();
                            assert!(
                                (0.0..=1.0).contains(&acc),
                                "acceptance {acc} for seed {seed}, grid {grid:?}, improved {improved}"
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn fixed_seed_reproduces_runs() {
        let mut a = GaugeMetropolis::from_settings(small_settings()).unwrap();
        let mut b = GaugeMetropolis::from_settings(small_settings()).unwrap();
        let ra = a.run().unwrap();
        let rb = b.run().unwrap();
        assert_eq!(ra, rb);
        assert_eq!(a.ensemble(), b.ensemble());
        assert_eq!(a.state(), SamplerState::Idle);
    }

    #[test]
    fn zero_ncorr_reports_zero_acceptance() {
        let settings = SamplerSettings {
            ncorr: 0,
            ..small_settings()
        };
        let mut s = GaugeMetropolis::from_settings(settings).unwrap();
        let summary = s.run().unwrap();
        assert_eq!(summary.sampling_sweeps, 0);
        assert_eq!(summary.mean_acceptance, 0.0);
        // Without sweeps every stored configuration is the identity start.
        assert_eq!(s.ensemble().len(), 2);
        assert!(s
            .ensemble()
            .iter()
            .all(|c| c == &LatticeConfiguration::new([2, 2, 2, 2])));
    }

    #[test]
    fn wilson_loop_checks_index_and_grid() {
        let mut s = GaugeMetropolis::from_settings(small_settings()).unwrap();
        s.run().unwrap();
        let x = LatticeCoordinate::origin([2, 2, 2, 2]).unwrap();
        assert!(s.wilson_loop(1, 1, 0, 1, &x, 1).is_ok());
        assert!(matches!(
            s.wilson_loop(1, 1, 0, 1, &x, 2),
            Err(LatticeError::EnsembleIndex { index: 2, len: 2 })
        ));
        let foreign = LatticeCoordinate::origin([3, 2, 2, 2]).unwrap();
        assert!(s.wilson_loop(1, 1, 0, 1, &foreign, 0).is_err());

        s.clear_result();
        assert_eq!(s.wilson_loop(1, 1, 0, 1, &x, 0).unwrap(), 1.0);
    }

    #[test]
    fn reseed_per_call_still_samples() {
        let settings = SamplerSettings {
            seed: SeedPolicy::ReseedPerCall,
            ..small_settings()
        };
        let mut s = GaugeMetropolis::from_settings(settings).unwrap();
        let summary = s.run().unwrap();
        assert!((0.0..=1.0).contains(&summary.mean_acceptance));
        assert_eq!(s.ensemble().len(), 2);
    }
}

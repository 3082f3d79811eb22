// src/gauge/settings.rs
/*!
Run settings for the sampler and for post-processing, (de)serialised with serde.

# Settings files
Both binaries take one JSON file:
- `ExperimentSettings`: the `SamplerSettings` (flattened) plus the output ensemble path.
- `PostSettings`: input ensemble, output directory, optional smearing and the analysis kind.

Missing sampler fields take the defaults of [`SamplerSettings::default`].
*/

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::action::{ActionKind, GaugeCouplings};
use crate::error::{LatticeError, Result};
use crate::space::coordinate::NDIM;

/// How the sampler seeds its random stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SeedPolicy {
    /// Seed once from a fixed value; runs are reproducible.
    Fixed(u64),
    /// Seed once from OS entropy.
    #[default]
    Entropy,
    /// Reseed from OS entropy at the start of every sweep and every candidate-set build.
    ReseedPerCall,
}

/// Physical and algorithmic parameters of one Metropolis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerSettings {
    /// Lattice extents `[n0, n1, n2, n3]`; index 3 is time.
    pub grid: [usize; NDIM],
    /// Number of random SU(3) elements; the candidate pool holds twice as many.
    pub nof_su3: usize,
    /// Sweeps between stored configurations.
    pub ncorr: usize,
    /// Proposals per link before moving on.
    pub inner_cycles: usize,
    /// Number of stored configurations.
    pub ncf: usize,
    /// Lattice spacing `a` in fm.
    pub spacing: f64,
    pub beta: f64,
    pub beta_tilde: f64,
    pub u0: f64,
    /// Size of a proposal step.
    pub epsilon: f64,
    pub improved: bool,
    pub seed: SeedPolicy,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            grid: [8; NDIM],
            nof_su3: 100,
            ncorr: 50,
            inner_cycles: 10,
            ncf: 10,
            spacing: 0.25,
            beta: 5.5,
            beta_tilde: 1.719,
            u0: 0.797,
            epsilon: 0.24,
            improved: false,
            seed: SeedPolicy::Entropy,
        }
    }
}

impl SamplerSettings {
    /// Build from the positional vectors `grid = {n0..n3}`,
    /// `int_params = {NofSU3, Ncorr, InnerCycles, Ncf}` and
    /// `float_params = {a, β, β̃, u₀, ε}`.
    pub fn from_vectors(
        grid: &[usize],
        int_params: &[i64],
        float_params: &[f64],
        improved: bool,
    ) -> Result<Self> {
        let grid: [usize; NDIM] = grid.try_into().map_err(|_| {
            LatticeError::InvalidParameters(format!(
                "grid must have 4 extents, got {}",
                grid.len()
            ))
        })?;
        if int_params.len() != 4 {
            return Err(LatticeError::InvalidParameters(format!(
                "expected 4 integer parameters {{NofSU3, Ncorr, InnerCycles, Ncf}}, got {}",
                int_params.len()
            )));
        }
        if float_params.len() != 5 {
            return Err(LatticeError::InvalidParameters(format!(
                "expected 5 floating parameters {{a, beta, beta_tilde, u0, epsilon}}, got {}",
                float_params.len()
            )));
        }
        let count = |k: usize, name: &str| -> Result<usize> {
            usize::try_from(int_params[k]).map_err(|_| {
                LatticeError::InvalidParameters(format!(
                    "{name} must be non-negative, got {}",
                    int_params[k]
                ))
            })
        };
        let settings = Self {
            grid,
            nof_su3: count(0, "NofSU3")?,
            ncorr: count(1, "Ncorr")?,
            inner_cycles: count(2, "InnerCycles")?,
            ncf: count(3, "Ncf")?,
            spacing: float_params[0],
            beta: float_params[1],
            beta_tilde: float_params[2],
            u0: float_params[3],
            epsilon: float_params[4],
            improved,
            seed: SeedPolicy::default(),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the sampler cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.grid.iter().any(|&n| n == 0) {
            return Err(LatticeError::InvalidParameters(format!(
                "grid extents must be positive, got {:?}",
                self.grid
            )));
        }
        if self.nof_su3 == 0 {
            return Err(LatticeError::InvalidParameters("NofSU3 must be at least 1".into()));
        }
        if self.inner_cycles == 0 {
            return Err(LatticeError::InvalidParameters(
                "InnerCycles must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn couplings(&self) -> GaugeCouplings {
        GaugeCouplings {
            beta: self.beta,
            beta_tilde: self.beta_tilde,
            u0: self.u0,
        }
    }

    pub fn action_kind(&self) -> ActionKind {
        if self.improved {
            ActionKind::Improved
        } else {
            ActionKind::Standard
        }
    }
}

/// Settings of the `qcd_exp` binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentSettings {
    #[serde(flatten)]
    pub sampler: SamplerSettings,
    /// Compact ensemble file to write.
    pub output: PathBuf,
    /// Optional human-readable dump next to the compact file.
    #[serde(default)]
    pub verbose_output: Option<PathBuf>,
    /// Optional JSON file receiving the run summary.
    #[serde(default)]
    pub summary_output: Option<PathBuf>,
}

/// Gauge-covariant smearing applied before the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmearingSettings {
    pub times: usize,
    pub parameter: f64,
}

/// Analysis selected in `PostSettings`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    PlaquetteRectangle,
    QuarkPotential,
    MeanLink,
}

/// Settings of the `qcd_post` binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSettings {
    /// Compact ensemble file to read.
    pub input: PathBuf,
    /// Directory receiving the R×T tables.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub smearing: Option<SmearingSettings>,
    pub analysis: AnalysisKind,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Read a JSON settings file.
pub fn from_json_file<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Write any serialisable value as pretty JSON.
pub fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, value)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_vectors_checks_lengths_and_signs() {
        let ok = SamplerSettings::from_vectors(
            &[2, 2, 2, 2],
            &[10, 1, 2, 3],
            &[0.25, 5.5, 1.719, 0.797, 0.24],
            true,
        )
        .unwrap();
        assert_eq!(ok.inner_cycles, 2);
        assert_eq!(ok.action_kind(), ActionKind::Improved);
        assert_eq!(ok.couplings().u0, 0.797);

        let floats = [0.25, 5.5, 1.719, 0.797, 0.24];
        assert!(SamplerSettings::from_vectors(&[2, 2, 2], &[10, 1, 2, 3], &floats, false).is_err());
        assert!(SamplerSettings::from_vectors(&[2; 4], &[10, 1, 2], &floats, false).is_err());
        assert!(SamplerSettings::from_vectors(&[2; 4], &[10, 1, 2, 3], &floats[..4], false).is_err());
        assert!(SamplerSettings::from_vectors(&[2; 4], &[10, -1, 2, 3], &floats, false).is_err());
        assert!(SamplerSettings::from_vectors(&[2; 4], &[0, 1, 2, 3], &floats, false).is_err());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let json = r#"{ "grid": [4, 4, 4, 8], "improved": true, "seed": { "fixed": 7 }, "output": "out.dat" }"#;
        let exp: ExperimentSettings = serde_json::from_str(json).unwrap();
        assert_eq!(exp.sampler.grid, [4, 4, 4, 8]);
        assert_eq!(exp.sampler.ncorr, 50);
        assert_eq!(exp.sampler.seed, SeedPolicy::Fixed(7));
        assert!(exp.verbose_output.is_none());
    }

    #[test]
    fn post_settings_parse() {
        let json = r#"{ "input": "ens.dat", "smearing": { "times": 4, "parameter": 0.0833 }, "analysis": "quark_potential" }"#;
        let post: PostSettings = serde_json::from_str(json).unwrap();
        assert_eq!(post.analysis, AnalysisKind::QuarkPotential);
        assert_eq!(post.output_dir, PathBuf::from("."));
        assert_eq!(post.smearing.map(|s| s.times), Some(4));
    }
}

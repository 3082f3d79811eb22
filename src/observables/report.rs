// src/observables/report.rs
//! Analysis results and the R×T table files.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::estimators::Estimate;
use crate::math::tensor::dense::Tensor;

pub const LOOPS_FILE: &str = "RXT_loops_file.dat";
pub const POTENTIAL_FILE: &str = "RXT_potential_file.dat";
pub const POTENTIAL_PLOT_FILE: &str = "RXT_potential_plot_file.dat";

/// `(T, R) → Estimate` with 1-based `T` and `R`.
///
/// Stored as a `[rows, n_r, 2]` tensor holding `(mean, error)` pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopTable {
    values: Tensor<f64>,
}

impl LoopTable {
    /// # Panics
    /// Panics if `rows` or `n_r` is zero.
    pub fn new(rows: usize, n_r: usize) -> Self {
        Self {
            values: Tensor::new(vec![rows, n_r, 2]),
        }
    }

    pub fn rows(&self) -> usize {
        self.values.shape()[0]
    }

    pub fn n_r(&self) -> usize {
        self.values.shape()[1]
    }

    pub fn get(&self, t: usize, r: usize) -> Estimate {
        let cell = self.values.block(&[t - 1, r - 1]);
        Estimate {
            mean: cell[0],
            error: cell[1],
        }
    }

    pub fn set(&mut self, t: usize, r: usize, e: Estimate) {
        self.values
            .block_mut(&[t - 1, r - 1])
            .copy_from_slice(&[e.mean, e.error]);
    }

    fn write_grid<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        write!(out, "T\\R")?;
        for r in 1..=self.n_r() {
            write!(out, "\t{r}")?;
        }
        writeln!(out)?;
        for t in 1..=self.rows() {
            write!(out, "{t}")?;
            for r in 1..=self.n_r() {
                let e = self.get(t, r);
                write!(out, "\t{}:{}", e.mean, e.error)?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

/// Result of the quark-potential analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct PotentialReport {
    pub n_r: usize,
    pub n_t: usize,
    /// `W(R, T)` for `1 ≤ T ≤ nT`.
    pub loops: LoopTable,
    /// `W(R, T) / W(R, T+1)` for `1 ≤ T < nT`.
    pub ratios: LoopTable,
    /// Ratio at `T = nT − 1`, indexed by `R − 1`.
    pub potential: Vec<Estimate>,
}

impl PotentialReport {
    /// Write the three R×T tables into `dir`, each headed by `banner`.
    pub fn write_tables(&self, dir: &Path, banner: &str) -> std::io::Result<()> {
        std::fs::create_dir_all(dir)?;

        let mut out = BufWriter::new(File::create(dir.join(LOOPS_FILE))?);
        out.write_all(banner.as_bytes())?;
        self.loops.write_grid(&mut out)?;
        out.flush()?;

        let mut out = BufWriter::new(File::create(dir.join(POTENTIAL_FILE))?);
        out.write_all(banner.as_bytes())?;
        self.ratios.write_grid(&mut out)?;
        out.flush()?;

        let mut out = BufWriter::new(File::create(dir.join(POTENTIAL_PLOT_FILE))?);
        out.write_all(banner.as_bytes())?;
        for (k, e) in self.potential.iter().enumerate() {
            writeln!(out, "{}\t{}\t{}", k + 1, e.mean, e.error)?;
        }
        out.flush()
    }
}

/// Outcome of `compute_statistics`.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisReport {
    PlaquetteRectangle { plaquette: Estimate, rectangle: Estimate },
    QuarkPotential(PotentialReport),
    Custom { name: String, estimate: Estimate },
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlaquetteRectangle { plaquette, rectangle } => {
                writeln!(f, "<W(1x1)> = {plaquette}")?;
                write!(f, "<W(2x1)> = {rectangle}")
            }
            Self::QuarkPotential(report) => {
                writeln!(f, "R\tW(R,nT-1)/W(R,nT)\terror")?;
                for (k, e) in report.potential.iter().enumerate() {
                    writeln!(f, "{}\t{}\t{}", k + 1, e.mean, e.error)?;
                }
                Ok(())
            }
            Self::Custom { name, estimate } => write!(f, "<{name}> = {estimate}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_cells_are_one_based() {
        let mut table = LoopTable::new(2, 3);
        table.set(2, 3, Estimate { mean: 0.5, error: 0.01 });
        assert_eq!(table.get(2, 3).mean, 0.5);
        assert_eq!(table.get(1, 1), Estimate::default());
        let mut buf = Vec::new();
        table.write_grid(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().nth(2).unwrap().ends_with("\t0.5:0.01"));
    }
}

// src/gauge/persistence.rs
/*!
On-disk formats for sampler settings and ensembles.

# Compact format (read + write)
```text
NofSU3
Ncorr
InnerCycles
Ncf
a
beta
beta_tilde
u0
epsilon
improved            (0 or 1)
n0  n1  n2  n3
re im re im ...     (one line per configuration: site × direction × row × column)
```
Floats are written with `{:e}`, the shortest representation that parses back to the same
bits. The reader splits on whitespace only, so line breaks are not significant, and also
accepts `true` / `false` for the flag.

# Write-only formats
- verbose: settings banner, then `index; (i0, i1, i2, i3, mu), (i, j), re+iim` per element;
- single configuration: `i0  i1  i2  i3  mu  i  j  re  im` per element.
*/

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::{FromStr, SplitWhitespace};

use num_complex::Complex64;

use super::settings::{SamplerSettings, SeedPolicy};
use crate::error::{LatticeError, Result};
use crate::math::su3::NC;
use crate::space::configuration::LatticeConfiguration;
use crate::space::coordinate::NDIM;

/// Fixed-height settings header for the table and verbose outputs.
///
/// The second line is `Lattice size:  n0 n1 n2 n3`; the banner always spans 15 lines.
pub fn settings_banner(s: &SamplerSettings) -> String {
    let seed = match s.seed {
        SeedPolicy::Fixed(seed) => format!("fixed({seed})"),
        SeedPolicy::Entropy => "entropy".to_string(),
        SeedPolicy::ReseedPerCall => "reseed per call".to_string(),
    };
    format!(
        "#################### SETTINGS ####################\n\
         Lattice size:  {} {} {} {}\n\
         Grid spacing a [fm]:  {}\n\
         beta:  {}\n\
         beta_tilde:  {}\n\
         u0:  {}\n\
         epsilon:  {}\n\
         NofSU3:  {}\n\
         Ncorr:  {}\n\
         InnerCycles:  {}\n\
         Ncf:  {}\n\
         Improved action:  {}\n\
         Seed policy:  {seed}\n\
         ##################################################\n\
         \n",
        s.grid[0],
        s.grid[1],
        s.grid[2],
        s.grid[3],
        s.spacing,
        s.beta,
        s.beta_tilde,
        s.u0,
        s.epsilon,
        s.nof_su3,
        s.ncorr,
        s.inner_cycles,
        s.ncf,
        if s.improved { "yes" } else { "no" },
    )
}

// ======================================================================================
// ---------------------------------- Compact Format ------------------------------------
// ======================================================================================

/// Write settings and ensemble in the compact format.
///
/// Fails with `InvalidParameters` if the ensemble does not hold `settings.ncf` configurations
/// on `settings.grid`.
pub fn write_compact(
    path: &Path,
    settings: &SamplerSettings,
    ensemble: &[LatticeConfiguration],
) -> Result<()> {
    if ensemble.len() != settings.ncf {
        return Err(LatticeError::InvalidParameters(format!(
            "ensemble holds {} configurations but Ncf = {}",
            ensemble.len(),
            settings.ncf
        )));
    }
    if let Some(bad) = ensemble.iter().find(|c| c.grid() != settings.grid) {
        return Err(LatticeError::InvalidParameters(format!(
            "configuration grid {:?} differs from settings grid {:?}",
            bad.grid(),
            settings.grid
        )));
    }

    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "{}", settings.nof_su3)?;
    writeln!(out, "{}", settings.ncorr)?;
    writeln!(out, "{}", settings.inner_cycles)?;
    writeln!(out, "{}", settings.ncf)?;
    for v in [
        settings.spacing,
        settings.beta,
        settings.beta_tilde,
        settings.u0,
        settings.epsilon,
    ] {
        writeln!(out, "{v:e}")?;
    }
    writeln!(out, "{}", u8::from(settings.improved))?;
    let g = settings.grid;
    writeln!(out, "{}  {}  {}  {}", g[0], g[1], g[2], g[3])?;
    for config in ensemble {
        for z in config.as_slice() {
            write!(out, "{:e} {:e} ", z.re, z.im)?;
        }
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

/// Read settings and ensemble written by [`write_compact`].
///
/// The returned settings use [`SeedPolicy::Entropy`]; the seed is not part of the format.
pub fn read_compact(path: &Path) -> Result<(SamplerSettings, Vec<LatticeConfiguration>)> {
    let text = fs::read_to_string(path)?;
    let mut tokens = Tokens::new(&text);

    let nof_su3 = tokens.parse("NofSU3")?;
    let ncorr = tokens.parse("Ncorr")?;
    let inner_cycles = tokens.parse("InnerCycles")?;
    let ncf: usize = tokens.parse("Ncf")?;
    let spacing = tokens.parse("a")?;
    let beta = tokens.parse("beta")?;
    let beta_tilde = tokens.parse("beta_tilde")?;
    let u0 = tokens.parse("u0")?;
    let epsilon = tokens.parse("epsilon")?;
    let improved = tokens.flag("improved")?;
    let mut grid = [0usize; NDIM];
    for (d, n) in grid.iter_mut().enumerate() {
        *n = tokens.parse(&format!("grid extent {d}"))?;
    }
    if grid.iter().any(|&n| n == 0) {
        return Err(LatticeError::Parse(format!("grid extents must be positive, got {grid:?}")));
    }

    let settings = SamplerSettings {
        grid,
        nof_su3,
        ncorr,
        inner_cycles,
        ncf,
        spacing,
        beta,
        beta_tilde,
        u0,
        epsilon,
        improved,
        seed: SeedPolicy::Entropy,
    };

    let values = grid
        .iter()
        .try_fold(NDIM * NC * NC, |acc, &n| acc.checked_mul(n))
        .ok_or_else(|| LatticeError::Parse(format!("grid {grid:?} is too large")))?;
    // Header counts are untrusted: buffers grow with the data actually read.
    let mut ensemble = Vec::new();
    for k in 0..ncf {
        let mut data = Vec::new();
        for _ in 0..values {
            let re = tokens.parse_in::<f64>("link element", k)?;
            let im = tokens.parse_in::<f64>("link element", k)?;
            data.push(Complex64::new(re, im));
        }
        ensemble.push(LatticeConfiguration::from_flat(grid, &data)?);
    }
    Ok((settings, ensemble))
}

/// Whitespace tokenizer with field-named parse errors.
struct Tokens<'a> {
    inner: SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            inner: text.split_whitespace(),
        }
    }

    fn parse<T: FromStr>(&mut self, field: &str) -> Result<T> {
        let tok = self
            .inner
            .next()
            .ok_or_else(|| LatticeError::Parse(format!("missing field `{field}`")))?;
        tok.parse()
            .map_err(|_| LatticeError::Parse(format!("field `{field}`: cannot parse `{tok}`")))
    }

    fn parse_in<T: FromStr>(&mut self, field: &str, configuration: usize) -> Result<T> {
        self.parse(field).map_err(|e| match e {
            LatticeError::Parse(msg) => {
                LatticeError::Parse(format!("configuration {configuration}: {msg}"))
            }
            other => other,
        })
    }

    fn flag(&mut self, field: &str) -> Result<bool> {
        let tok: String = self.parse(field)?;
        match tok.as_str() {
            "0" | "false" => Ok(false),
            "1" | "true" => Ok(true),
            _ => Err(LatticeError::Parse(format!(
                "field `{field}`: expected 0/1/true/false, got `{tok}`"
            ))),
        }
    }
}

// ======================================================================================
// ---------------------------------- Readable Dumps ------------------------------------
// ======================================================================================

/// Settings banner followed by one labelled line per matrix element of every configuration.
pub fn write_verbose(
    path: &Path,
    settings: &SamplerSettings,
    ensemble: &[LatticeConfiguration],
) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    out.write_all(settings_banner(settings).as_bytes())?;
    for (k, config) in ensemble.iter().enumerate() {
        for (x, mu, u) in config.links() {
            let p = x.position();
            for i in 0..NC {
                for j in 0..NC {
                    let z = u.m[i][j];
                    writeln!(
                        out,
                        "{k}; ({}, {}, {}, {}, {mu}), ({i}, {j}), {}{:+}i",
                        p[0], p[1], p[2], p[3], z.re, z.im
                    )?;
                }
            }
        }
    }
    out.flush()?;
    Ok(())
}

/// One line `i0  i1  i2  i3  mu  i  j  re  im` per matrix element of `config`.
pub fn write_configuration_dump(path: &Path, config: &LatticeConfiguration) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for (x, mu, u) in config.links() {
        let p = x.position();
        for i in 0..NC {
            for j in 0..NC {
                let z = u.m[i][j];
                writeln!(
                    out,
                    "{}  {}  {}  {}  {mu}  {i}  {j}  {:e}  {:e}",
                    p[0], p[1], p[2], p[3], z.re, z.im
                )?;
            }
        }
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_has_fixed_height_and_lattice_line() {
        let b = settings_banner(&SamplerSettings::default());
        assert_eq!(b.lines().count(), 15);
        let second: Vec<_> = b.lines().nth(1).unwrap().split_whitespace().collect();
        assert_eq!(second, ["Lattice", "size:", "8", "8", "8", "8"]);
        assert_eq!(b.lines().nth(12), Some("Seed policy:  entropy"));
        assert!(b.ends_with("#\n\n"));
    }

    #[test]
    fn tokens_report_missing_and_bad_fields() {
        let mut t = Tokens::new("3 x\n true 2");
        assert_eq!(t.parse::<usize>("a").unwrap(), 3);
        assert!(matches!(t.parse::<usize>("b"), Err(LatticeError::Parse(_))));
        assert!(t.flag("c").unwrap());
        assert!(t.flag("d").is_err());
        assert!(matches!(t.parse::<f64>("e"), Err(LatticeError::Parse(_))));
    }
}

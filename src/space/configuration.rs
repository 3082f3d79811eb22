// src/space/configuration.rs
/*!
A full gauge-field configuration: one SU(3) link per site and direction.

Storage is a single flat [`Tensor<Complex64>`] of shape `[n0, n1, n2, n3, 4, 3, 3]`, so the
link `U_μ(x)` is the contiguous 9-element block addressed by `[x0, x1, x2, x3, μ]`.

# Access
- `at` / `set`: checked. Reject a coordinate bound to a different grid (`ShapeMismatch`)
  and a direction outside `0..4` (`InvalidDirection`).
- `link` / `set_link`: unchecked variants for the sweep and observable loops. Grid agreement
  is only debug-asserted there.
*/

use std::fmt;

use num_complex::Complex64;

use crate::error::{LatticeError, Result};
use crate::math::su3::{LinkAlgebra, Su3Matrix, NC};
use crate::math::tensor::dense::Tensor;
use crate::space::coordinate::{check_direction, sites, LatticeCoordinate, NDIM};

#[derive(Debug, Clone, PartialEq)]
pub struct LatticeConfiguration {
    grid: [usize; NDIM],
    links: Tensor<Complex64>,
}

impl Default for LatticeConfiguration {
    fn default() -> Self {
        Self::new([1; NDIM])
    }
}

impl LatticeConfiguration {
    /// Identity links everywhere on a `grid[0] × … × grid[3]` lattice.
    ///
    /// # Panics
    /// Panics if any extent is zero.
    pub fn new(grid: [usize; NDIM]) -> Self {
        let mut links = Tensor::new(storage_shape(grid));
        for block in links.as_mut_slice().chunks_mut(NC * NC) {
            Su3Matrix::IDENTITY.write_to(block);
        }
        Self { grid, links }
    }

    /// Configuration from flat storage in traversal order (site, direction, row, column).
    pub fn from_flat(grid: [usize; NDIM], data: &[Complex64]) -> Result<Self> {
        let mut config = Self::new(grid);
        if data.len() != config.links.len() {
            return Err(LatticeError::InvalidParameters(format!(
                "{} complex values given, grid {grid:?} needs {}",
                data.len(),
                config.links.len()
            )));
        }
        config.links.as_mut_slice().copy_from_slice(data);
        Ok(config)
    }

    /// Discard the contents and re-initialise to identity on `grid`.
    pub fn reshape(&mut self, grid: [usize; NDIM]) {
        *self = Self::new(grid);
    }

    #[inline(always)]
    pub fn grid(&self) -> [usize; NDIM] {
        self.grid
    }

    /// Number of sites.
    #[inline]
    pub fn volume(&self) -> usize {
        self.grid.iter().product()
    }

    /// Link-level shape `[n0, n1, n2, n3, 4]`.
    pub fn shape(&self) -> [usize; NDIM + 1] {
        [self.grid[0], self.grid[1], self.grid[2], self.grid[3], NDIM]
    }

    /// Flat complex storage in traversal order (site, direction, row, column).
    #[inline]
    pub fn as_slice(&self) -> &[Complex64] {
        self.links.as_slice()
    }

    /// True iff every link element is finite.
    pub fn is_finite(&self) -> bool {
        self.links.all_finite()
    }

    /// Largest elementwise distance to `other`.
    ///
    /// # Panics
    /// Panics if the grids differ.
    pub fn max_abs_diff(&self, other: &Self) -> f64 {
        self.links.max_abs_diff(&other.links)
    }

    /// Checked read of `U_μ(x)`.
    pub fn at(&self, x: &LatticeCoordinate, mu: usize) -> Result<Su3Matrix> {
        self.check_access(x, mu)?;
        Ok(self.link(x, mu))
    }

    /// Checked write of `U_μ(x)`.
    pub fn set(&mut self, x: &LatticeCoordinate, mu: usize, link: Su3Matrix) -> Result<()> {
        self.check_access(x, mu)?;
        self.set_link(x, mu, link);
        Ok(())
    }

    /// Unchecked read of `U_μ(x)`.
    #[inline]
    pub fn link(&self, x: &LatticeCoordinate, mu: usize) -> Su3Matrix {
        debug_assert_eq!(x.grid(), self.grid);
        Su3Matrix::from_slice(self.links.block(&link_prefix(x, mu)))
    }

    /// Unchecked write of `U_μ(x)`.
    #[inline]
    pub fn set_link(&mut self, x: &LatticeCoordinate, mu: usize, link: Su3Matrix) {
        debug_assert_eq!(x.grid(), self.grid);
        link.write_to(self.links.block_mut(&link_prefix(x, mu)));
    }

    /// Every link in traversal order: sites lexicographically, then direction `0..4`.
    pub fn links(&self) -> impl Iterator<Item = (LatticeCoordinate, usize, Su3Matrix)> + '_ {
        sites(self.grid).flat_map(move |x| (0..NDIM).map(move |mu| (x, mu, self.link(&x, mu))))
    }

    fn check_access(&self, x: &LatticeCoordinate, mu: usize) -> Result<()> {
        if x.grid() != self.grid {
            return Err(LatticeError::ShapeMismatch {
                coordinate: x.grid(),
                configuration: self.grid,
            });
        }
        check_direction(mu)
    }
}

#[inline(always)]
fn link_prefix(x: &LatticeCoordinate, mu: usize) -> [usize; NDIM + 1] {
    let p = x.position();
    [p[0], p[1], p[2], p[3], mu]
}

fn storage_shape(grid: [usize; NDIM]) -> Vec<usize> {
    vec![grid[0], grid[1], grid[2], grid[3], NDIM, NC, NC]
}

impl fmt::Display for LatticeConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (x, mu, u) in self.links() {
            let d = u.det();
            writeln!(f, "{:?} mu={mu}  det = {:+.6}{:+.6}i", x.position(), d.re, d.im)?;
            write!(f, "{u}")?;
        }
        Ok(())
    }
}

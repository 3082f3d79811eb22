// src/space/coordinate.rs
/*!
Periodic 4-D lattice coordinates.

A [`LatticeCoordinate`] is a site position bound to the grid it lives on. Every offset
wraps periodically, so walking off one face of the lattice re-enters on the opposite face.

> **Semantics (Important!)**
> - Directions `0, 1, 2` are spatial, direction `3` is Euclidean time.
> - `move_by` / `offset` panic on a direction outside `0..4`; use `try_offset` when the
>   direction comes from a caller.
> - Sites are enumerated by [`sites`] in lexicographic order (index 0 slowest).
*/

use crate::error::{LatticeError, Result};

/// Number of space-time dimensions.
pub const NDIM: usize = 4;

/// A site on a periodic `n0 × n1 × n2 × n3` lattice.
///
/// # Invariants
/// - every extent of `grid` is `> 0`.
/// - `position[d] < grid[d]` for every `d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LatticeCoordinate {
    position: [usize; NDIM],
    grid: [usize; NDIM],
}

impl LatticeCoordinate {
    /// Build a coordinate from a position and grid size, both of length 4.
    ///
    /// Fails with `InvalidCoordinate` on a wrong length, a non-positive size, or a component
    /// outside `[0, size)`.
    pub fn new(position: &[i64], grid: &[usize]) -> Result<Self> {
        if position.len() != NDIM || grid.len() != NDIM {
            return Err(LatticeError::InvalidCoordinate(format!(
                "expected 4 components and 4 sizes, got {} and {}",
                position.len(),
                grid.len()
            )));
        }
        let mut g = [0usize; NDIM];
        let mut p = [0usize; NDIM];
        for d in 0..NDIM {
            if grid[d] == 0 {
                return Err(LatticeError::InvalidCoordinate(format!(
                    "grid size along axis {d} must be positive, got {grid:?}"
                )));
            }
            if position[d] < 0 || position[d] as u64 >= grid[d] as u64 {
                return Err(LatticeError::InvalidCoordinate(format!(
                    "component {} along axis {d} outside [0, {})",
                    position[d], grid[d]
                )));
            }
            g[d] = grid[d];
            p[d] = position[d] as usize;
        }
        Ok(Self { position: p, grid: g })
    }

    /// The origin of `grid`. Sizes are validated like in [`LatticeCoordinate::new`].
    pub fn origin(grid: [usize; NDIM]) -> Result<Self> {
        Self::new(&[0; NDIM], &grid)
    }

    /// Position vector.
    #[inline(always)]
    pub fn position(&self) -> [usize; NDIM] {
        self.position
    }

    /// Grid size this coordinate is bound to.
    #[inline(always)]
    pub fn grid(&self) -> [usize; NDIM] {
        self.grid
    }

    /// Component along `direction`.
    pub fn component(&self, direction: usize) -> Result<usize> {
        check_direction(direction)?;
        Ok(self.position[direction])
    }

    /// Overwrite the component along `direction`, bounds-checked against the grid.
    pub fn set(&mut self, value: usize, direction: usize) -> Result<()> {
        check_direction(direction)?;
        if value >= self.grid[direction] {
            return Err(LatticeError::InvalidCoordinate(format!(
                "component {value} along axis {direction} outside [0, {})",
                self.grid[direction]
            )));
        }
        self.position[direction] = value;
        Ok(())
    }

    /// Shift by `steps` (any sign, any magnitude) along `direction`, wrapping periodically.
    ///
    /// # Panics
    /// Panics if `direction >= 4`.
    #[inline]
    pub fn move_by(&mut self, steps: i64, direction: usize) {
        assert!(direction < NDIM, "direction {direction} outside 0..4");
        let n = self.grid[direction];
        let reduced = wrap_axis_index(steps, n) as i64;
        self.position[direction] = wrap_axis_index(self.position[direction] as i64 + reduced, n);
    }

    /// Non-mutating counterpart of [`LatticeCoordinate::move_by`].
    #[inline]
    #[must_use]
    pub fn offset(&self, steps: i64, direction: usize) -> Self {
        let mut out = *self;
        out.move_by(steps, direction);
        out
    }

    /// Checked [`LatticeCoordinate::offset`] for caller-provided directions.
    pub fn try_offset(&self, steps: i64, direction: usize) -> Result<Self> {
        check_direction(direction)?;
        Ok(self.offset(steps, direction))
    }

    /// Lexicographic site index (index 0 slowest).
    #[inline]
    pub fn linear_index(&self) -> usize {
        self.position
            .iter()
            .zip(self.grid.iter())
            .fold(0usize, |acc, (&p, &n)| acc * n + p)
    }
}

/// Euclidean modulo into `[0, n)`.
#[inline(always)]
fn wrap_axis_index(c: i64, n: usize) -> usize {
    c.rem_euclid(n as i64) as usize
}

#[inline]
pub(crate) fn check_direction(direction: usize) -> Result<()> {
    if direction < NDIM {
        Ok(())
    } else {
        Err(LatticeError::InvalidDirection(direction))
    }
}

//===================================================================
// ------------------------- Site Iteration -------------------------
//===================================================================

/// Iterator over every site of a grid in lexicographic order.
#[derive(Debug, Clone)]
pub struct Sites {
    next: Option<LatticeCoordinate>,
}

/// Every site of `grid`, index 0 slowest and index 3 fastest.
///
/// # Panics
/// Panics if any extent of `grid` is zero.
pub fn sites(grid: [usize; NDIM]) -> Sites {
    assert!(grid.iter().all(|&n| n > 0), "All dimensions must be > 0; got {grid:?}");
    Sites {
        next: Some(LatticeCoordinate {
            position: [0; NDIM],
            grid,
        }),
    }
}

impl Iterator for Sites {
    type Item = LatticeCoordinate;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        let mut succ = current;
        let mut axis = NDIM;
        self.next = loop {
            if axis == 0 {
                break None;
            }
            axis -= 1;
            succ.position[axis] += 1;
            if succ.position[axis] < succ.grid[axis] {
                break Some(succ);
            }
            succ.position[axis] = 0;
        };
        Some(current)
    }
}

// src/gauge/candidates.rs
/*!
The pool of random SU(3) elements used as Metropolis proposals `U' = C · U`.

Construction of one element:
1. draw a 3×3 complex matrix `M` with real and imaginary parts uniform in `(-1, 1)`;
2. Hermitian part `H = (M + M†) / 2`;
3. `C = exp(iεH)`, then divide by the principal cube root of `det C`.

After the `N` random elements come their `N` adjoints, so `C[i + N] = C[i]†` and the
proposal distribution is symmetric under inversion.
*/

use num_complex::Complex64;
use rand::Rng;
use rand_distr::{Distribution, Uniform};

use crate::error::{LatticeError, Result};
use crate::math::su3::{LinkAlgebra, Su3Matrix};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateSet {
    elements: Vec<Su3Matrix>,
}

impl CandidateSet {
    /// Empty set. Sweeping with it fails with `EmptyCandidateSet`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with `n` fresh random elements near the identity plus their adjoints.
    pub fn randomize<R: Rng + ?Sized>(&mut self, n: usize, epsilon: f64, rng: &mut R) -> Result<()> {
        let dist = Uniform::new(-1.0, 1.0)
            .map_err(|e| LatticeError::InvalidParameters(format!("uniform sampler: {e}")))?;
        let i_eps = Complex64::new(0.0, epsilon);

        self.elements.clear();
        self.elements.reserve(2 * n);
        for _ in 0..n {
            let mut m = Su3Matrix::ZERO;
            for z in m.m.iter_mut().flatten() {
                *z = Complex64::new(dist.sample(rng), dist.sample(rng));
            }
            let c = m.hermitian_part().scale_complex(i_eps).exp().project_unit_det();
            self.elements.push(c);
        }
        for i in 0..n {
            let adj = self.elements[i].adjoint();
            self.elements.push(adj);
        }
        Ok(())
    }

    /// Uniformly chosen element.
    ///
    /// # Panics
    /// Panics if the set is empty; callers check [`CandidateSet::is_empty`] first.
    #[inline]
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> &Su3Matrix {
        &self.elements[rng.random_range(0..self.elements.len())]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&Su3Matrix> {
        self.elements.get(i)
    }

    pub fn as_slice(&self) -> &[Su3Matrix] {
        &self.elements
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn second_half_holds_adjoints_with_unit_determinant() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut set = CandidateSet::new();
        set.randomize(20, 0.24, &mut rng).unwrap();
        assert_eq!(set.len(), 40);
        for i in 0..20 {
            let c = set.as_slice()[i];
            assert_eq!(set.as_slice()[i + 20], c.adjoint());
            assert_abs_diff_eq!(c.det().re, 1.0, epsilon = 1e-10);
            assert_abs_diff_eq!(c.det().im, 0.0, epsilon = 1e-10);
            assert!((c * c.adjoint()).max_abs_diff(&Su3Matrix::IDENTITY) < 1e-10);
        }
    }

    #[test]
    fn small_epsilon_stays_near_identity() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut set = CandidateSet::new();
        set.randomize(5, 1e-3, &mut rng).unwrap();
        assert!(set
            .as_slice()
            .iter()
            .all(|c| c.max_abs_diff(&Su3Matrix::IDENTITY) < 1e-2));
    }

    #[test]
    fn randomize_replaces_previous_contents() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut set = CandidateSet::new();
        set.randomize(4, 0.2, &mut rng).unwrap();
        set.randomize(2, 0.2, &mut rng).unwrap();
        assert_eq!(set.len(), 4);
        assert!(set.get(4).is_none());
    }
}

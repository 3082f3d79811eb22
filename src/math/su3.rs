// src/math/su3.rs
/*!
SU(3) link matrices: 3×3 complex matrices, near-unitary with unit determinant.

In lattice gauge theory each link variable `U_μ(x)` is the parallel transporter along
direction `μ` from site `x`. The sampler never re-projects existing links, so products of
many links drift slightly off the group manifold; only freshly generated proposals are
projected to `det = 1`.

The algebra the rest of the crate relies on is captured by [`LinkAlgebra`]
{multiply, adjoint, trace, exponential, determinant}. It is implemented by hand for the
row-major [`Su3Matrix`]; 3×3 is small enough that a linear-algebra backend buys nothing.
*/

use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub};

use num_complex::Complex64;

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);

/// Number of colours.
pub const NC: usize = 3;

// ======================================================================================
// ----------------------------------- Capability ---------------------------------------
// ======================================================================================

/// Matrix capability used by the action, loop and smearing code.
pub trait LinkAlgebra: Copy + Mul<Output = Self> + Add<Output = Self> {
    /// Multiplicative identity.
    fn identity() -> Self;

    /// Conjugate transpose.
    fn adjoint(&self) -> Self;

    /// Trace.
    fn trace(&self) -> Complex64;

    /// Determinant.
    fn det(&self) -> Complex64;

    /// Matrix exponential.
    fn exp(&self) -> Self;

    /// `Re Tr(self · rhs)` without forming the product.
    fn re_trace_mul(&self, rhs: &Self) -> f64;

    /// `Re Tr(self)`.
    #[inline]
    fn re_trace(&self) -> f64 {
        self.trace().re
    }
}

// ======================================================================================
// ------------------------------------ Su3Matrix ---------------------------------------
// ======================================================================================

/// 3×3 complex matrix holding one SU(3) link variable. Row-major: `m[row][col]`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[must_use]
pub struct Su3Matrix {
    pub m: [[Complex64; NC]; NC],
}

impl Default for Su3Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Su3Matrix {
    pub const IDENTITY: Self = Self {
        m: [[ONE, ZERO, ZERO], [ZERO, ONE, ZERO], [ZERO, ZERO, ONE]],
    };

    pub const ZERO: Self = Self { m: [[ZERO; NC]; NC] };

    /// Build from a row-major slice of 9 elements.
    ///
    /// # Panics
    /// Panics if `elements.len() != 9`.
    pub fn from_slice(elements: &[Complex64]) -> Self {
        assert_eq!(elements.len(), NC * NC, "an SU(3) matrix has 9 elements");
        let mut r = Self::ZERO;
        for (k, &z) in elements.iter().enumerate() {
            r.m[k / NC][k % NC] = z;
        }
        r
    }

    /// Write into a row-major slice of 9 elements.
    pub fn write_to(&self, out: &mut [Complex64]) {
        debug_assert_eq!(out.len(), NC * NC);
        for (k, z) in out.iter_mut().enumerate() {
            *z = self.m[k / NC][k % NC];
        }
    }

    /// Scale by a real number.
    pub fn scale(self, s: f64) -> Self {
        self.map(|z| z * s)
    }

    /// Scale by a complex number.
    pub fn scale_complex(self, s: Complex64) -> Self {
        self.map(|z| z * s)
    }

    /// Frobenius norm squared.
    #[must_use]
    pub fn norm_sq(&self) -> f64 {
        self.m.iter().flatten().map(|z| z.norm_sqr()).sum()
    }

    /// `self + a · rhs` for real `a`.
    pub fn add_scaled(self, rhs: &Self, a: f64) -> Self {
        let mut r = self;
        for i in 0..NC {
            for j in 0..NC {
                r.m[i][j] += rhs.m[i][j] * a;
            }
        }
        r
    }

    /// Hermitian part `(M + M†) / 2`.
    pub fn hermitian_part(self) -> Self {
        (self + self.adjoint()).scale(0.5)
    }

    /// Divide by the principal cube root of the determinant, so that `det = 1`
    /// up to rounding for any non-singular input.
    pub fn project_unit_det(self) -> Self {
        let root = self.det().powf(1.0 / 3.0);
        self.scale_complex(root.inv())
    }

    /// Largest elementwise distance to `other`.
    #[must_use]
    pub fn max_abs_diff(&self, other: &Self) -> f64 {
        self.m
            .iter()
            .flatten()
            .zip(other.m.iter().flatten())
            .map(|(a, b)| (a - b).norm())
            .fold(0.0, f64::max)
    }

    #[inline]
    fn map(self, f: impl Fn(Complex64) -> Complex64) -> Self {
        let mut r = self;
        r.m.iter_mut().flatten().for_each(|z| *z = f(*z));
        r
    }
}

impl LinkAlgebra for Su3Matrix {
    #[inline]
    fn identity() -> Self {
        Self::IDENTITY
    }

    #[inline]
    fn adjoint(&self) -> Self {
        let mut r = Self::ZERO;
        for i in 0..NC {
            for j in 0..NC {
                r.m[i][j] = self.m[j][i].conj();
            }
        }
        r
    }

    #[inline]
    fn trace(&self) -> Complex64 {
        self.m[0][0] + self.m[1][1] + self.m[2][2]
    }

    fn det(&self) -> Complex64 {
        let m = &self.m;
        let a = m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1]);
        let b = m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0]);
        let c = m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0]);
        a - b + c
    }

    /// Scaling and squaring around a truncated Taylor series.
    fn exp(&self) -> Self {
        let norm = self.norm_sq().sqrt();
        let squarings = if norm > 0.5 {
            (norm / 0.5).log2().ceil() as u32
        } else {
            0
        };
        let a = self.scale(0.5_f64.powi(squarings as i32));

        let mut result = Self::IDENTITY;
        let mut term = Self::IDENTITY;
        for k in 1..=TAYLOR_TERMS {
            term = (term * a).scale(1.0 / k as f64);
            result = result + term;
            if term.norm_sq() < TAYLOR_TOLERANCE {
                break;
            }
        }
        for _ in 0..squarings {
            result = result * result;
        }
        result
    }

    #[inline]
    fn re_trace_mul(&self, rhs: &Self) -> f64 {
        let mut s = 0.0;
        for i in 0..NC {
            for k in 0..NC {
                let a = self.m[i][k];
                let b = rhs.m[k][i];
                s += a.re * b.re - a.im * b.im;
            }
        }
        s
    }
}

const TAYLOR_TERMS: usize = 30;
const TAYLOR_TOLERANCE: f64 = 1e-34;

impl Mul for Su3Matrix {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        let mut r = Self::ZERO;
        for i in 0..NC {
            for j in 0..NC {
                let mut s = ZERO;
                for k in 0..NC {
                    s += self.m[i][k] * rhs.m[k][j];
                }
                r.m[i][j] = s;
            }
        }
        r
    }
}

impl Add for Su3Matrix {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        self.add_scaled(&rhs, 1.0)
    }
}

impl AddAssign for Su3Matrix {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Su3Matrix {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        self.add_scaled(&rhs, -1.0)
    }
}

impl fmt::Display for Su3Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.m {
            for z in row {
                write!(f, "  ({:+.6}{:+.6}i)", z.re, z.im)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sample_hermitian() -> Su3Matrix {
        let mut m = Su3Matrix::ZERO;
        let vals = [
            (0.3, 0.1),
            (-0.7, 0.4),
            (0.2, -0.9),
            (0.5, 0.5),
            (-0.1, 0.8),
            (0.6, -0.3),
            (0.9, 0.0),
            (-0.4, -0.6),
            (0.25, 0.75),
        ];
        for (k, &(re, im)) in vals.iter().enumerate() {
            m.m[k / 3][k % 3] = Complex64::new(re, im);
        }
        m.hermitian_part()
    }

    #[test]
    fn identity_properties() {
        let i = Su3Matrix::IDENTITY;
        assert_abs_diff_eq!(i.det().re, 1.0, epsilon = 1e-15);
        assert_abs_diff_eq!(i.re_trace(), 3.0, epsilon = 1e-15);
        assert_eq!(i.adjoint(), i);
    }

    #[test]
    fn exp_of_zero_is_identity() {
        assert_eq!(Su3Matrix::ZERO.exp(), Su3Matrix::IDENTITY);
    }

    #[test]
    fn exp_of_diagonal_matches_scalar_exponentials() {
        let mut d = Su3Matrix::ZERO;
        d.m[0][0] = Complex64::new(0.0, 1.3);
        d.m[1][1] = Complex64::new(0.0, -0.4);
        d.m[2][2] = Complex64::new(2.0, 0.0);
        let e = d.exp();
        for k in 0..3 {
            let expected = d.m[k][k].exp();
            assert_abs_diff_eq!(e.m[k][k].re, expected.re, epsilon = 1e-12);
            assert_abs_diff_eq!(e.m[k][k].im, expected.im, epsilon = 1e-12);
        }
        assert_abs_diff_eq!(e.m[0][1].norm(), 0.0, epsilon = 1e-14);
    }

    #[test]
    fn exp_of_anti_hermitian_is_unitary() {
        let a = sample_hermitian().scale_complex(Complex64::new(0.0, 2.0));
        let u = a.exp();
        let prod = u * u.adjoint();
        assert!(prod.max_abs_diff(&Su3Matrix::IDENTITY) < 1e-12);
    }

    #[test]
    fn projection_gives_unit_determinant() {
        let u = sample_hermitian()
            .scale_complex(Complex64::new(0.0, 0.7))
            .exp()
            .scale(1.3)
            .project_unit_det();
        let d = u.det();
        assert_abs_diff_eq!(d.re, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(d.im, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn re_trace_mul_matches_product() {
        let a = sample_hermitian().scale_complex(Complex64::new(0.3, 1.1));
        let b = sample_hermitian().adjoint().scale(0.8) + Su3Matrix::IDENTITY;
        assert_abs_diff_eq!(a.re_trace_mul(&b), (a * b).re_trace(), epsilon = 1e-13);
    }

    #[test]
    fn slice_round_trip() {
        let a = sample_hermitian();
        let mut buf = [Complex64::new(0.0, 0.0); 9];
        a.write_to(&mut buf);
        assert_eq!(Su3Matrix::from_slice(&buf), a);
    }
}

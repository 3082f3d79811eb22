// src/math/scalar.rs
//! A single minimal `Scalar` trait that unifies the real and complex floats stored in
//! lattice buffers and result tables.
//!
//! Design goals:
//! - One public trait (`Scalar`) the dense tensor can bound on.
//! - Works for `f32`/`f64` and `Complex<f32>`/`Complex<f64>`.
//! - Minimal shared bounds (no `PartialOrd`, since complex lacks it).
//! - Uniform API: magnitude as a real, finite check.
//!
//! Conventions:
//! - For reals, `Real = Self`.
//! - For complex, `Real` is the underlying float.

use core::fmt::{Debug, Display};
use core::iter::Sum;
use num_complex::Complex;
use num_traits::{Float, Num, NumCast, One, Zero};

// ==============================================================================
// ------------------- Sealing: keep impl surface controlled --------------------
// ==============================================================================

mod sealed {
    pub trait Sealed {}
    macro_rules! impl_sealed_for {
        ($($t:ty),* $(,)?) => { $(impl Sealed for $t {})* };
    }
    impl_sealed_for!(f32, f64, num_complex::Complex<f32>, num_complex::Complex<f64>);
}
use sealed::Sealed;

// ==============================================================================
// --------------------------------- Trait Def ----------------------------------
// ==============================================================================

/// A minimal, unified scalar trait for floating reals and complex numbers.
pub trait Scalar:
    Num + NumCast + Zero + One + Copy + Default + PartialEq + Debug + Display + Sum<Self> + Sealed
{
    /// The associated *real* type:
    /// - reals: `Real = Self`
    /// - complex: `Real = f32` or `f64`
    type Real: Float + Default + Debug + Display + Sum<Self::Real>;

    /// Magnitude as a real: `|x|` for reals, `|z|` for complex.
    fn abs_real(self) -> Self::Real;

    /// Finite check (every part finite).
    fn is_finite(self) -> bool;
}

// ==============================================================================
// -------------------------------- IMPL: Real ----------------------------------
// ==============================================================================

macro_rules! impl_scalar_float {
    ($($t:ty),* $(,)?) => {$(
        impl Scalar for $t {
            type Real = $t;

            #[inline] fn abs_real(self) -> Self::Real { self.abs() }
            #[inline] fn is_finite(self) -> bool { <$t>::is_finite(self) }
        }
    )*}
}
impl_scalar_float!(f32, f64);

// ==============================================================================
// ------------------------------- IMPL: Complex --------------------------------
// ==============================================================================

macro_rules! impl_scalar_complex {
    ($($t:ty),* $(,)?) => {$(
        impl Scalar for Complex<$t> {
            type Real = $t;

            #[inline] fn abs_real(self) -> Self::Real { self.norm() }
            #[inline] fn is_finite(self) -> bool { self.re.is_finite() && self.im.is_finite() }
        }
    )*}
}
impl_scalar_complex!(f32, f64);

// src/math/tensor/dense.rs
/*!
A **general-purpose N-dimensional dense tensor** backed by a flat `Vec<T>`.

Goals:
- **Performance-first**: contiguous memory layout with cache-friendly row-major indexing.
- **Ergonomics**: multi-index accessors plus raw contiguous block access, so that small
  fixed-size objects (e.g. a 3×3 link matrix) can be read and written as one slice.
- **Type-agnostic**: generic over the crate-wide `Scalar` trait (real or complex).

# Highlights

- `Tensor<T>::new(shape)`: zero-initialized tensor of shape `shape`.
- `Tensor<T>::filled(shape, value)`: constant-initialized tensor.
- `index`, `get`, `set`: strict multi-index access (**no wrapping**; periodicity is the job
  of the coordinate type that produces the indices).
- `try_index`: non-panicking variant returning `None` on rank or bound violations.
- `block`, `block_mut`: contiguous sub-slices addressed by a leading multi-index.
- `all_finite`, `max_abs_diff`: elementwise checks.

> **Semantics (Important!)**
> - Row-major: the last axis is contiguous.
> - Out-of-range indices are a programming error and panic; callers validate first.
*/

use num_traits::{Float, Zero};

use super::super::scalar::Scalar;

//===================================================================
// -------------------------- Basic Struct --------------------------
//===================================================================

/// A dense N-D tensor with row-major (C-style) linearization.
///
/// # Invariants
/// - `data.len() == shape.iter().product()`.
/// - every extent is `> 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<T: Scalar> {
    /// The extents along each axis.
    shape: Vec<usize>,
    /// Flat, row-major storage of all elements.
    data: Vec<T>,
}

impl<T: Scalar> Tensor<T> {
    /// Create a new tensor with the given `shape`, filled with zero.
    ///
    /// # Panics
    /// Panics if `shape` contains a zero dimension.
    #[inline]
    pub fn new(shape: Vec<usize>) -> Self {
        Self::filled(shape, T::zero())
    }

    /// Create a new tensor with every element equal to `value`.
    ///
    /// # Panics
    /// Panics if `shape` contains a zero dimension.
    pub fn filled(shape: Vec<usize>, value: T) -> Self {
        assert!(
            shape.iter().all(|&d| d > 0),
            "All dimensions must be > 0; got {shape:?}"
        );
        let size = shape.iter().product::<usize>();
        Self {
            shape,
            data: vec![value; size],
        }
    }

    /// Shape vector.
    #[inline(always)]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of elements.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True iff there are zero elements (never true given the shape assertion).
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrow the flat storage.
    #[inline(always)]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Mutably borrow the flat storage.
    #[inline(always)]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}

//===================================================================
// --------------------------- Indexing -----------------------------
//===================================================================

impl<T: Scalar> Tensor<T> {
    /// Row-major flat index of a (possibly partial) leading multi-index.
    ///
    /// A partial index of rank `k < rank` addresses the first element of the contiguous
    /// block spanned by the trailing `rank - k` axes.
    #[inline]
    pub fn try_index(&self, indices: &[usize]) -> Option<usize> {
        if indices.len() > self.shape.len() {
            return None;
        }
        let mut flat = 0usize;
        for (axis, &dim) in self.shape.iter().enumerate() {
            let a = match indices.get(axis) {
                Some(&a) if a < dim => a,
                Some(_) => return None,
                None => 0,
            };
            flat = flat * dim + a;
        }
        Some(flat)
    }

    /// Row-major flat index.
    ///
    /// # Panics
    /// Panics on rank overflow or an out-of-range component.
    #[inline]
    pub fn index(&self, indices: &[usize]) -> usize {
        match self.try_index(indices) {
            Some(k) => k,
            None => panic!("index {indices:?} out of range for shape {:?}", self.shape),
        }
    }

    /// Get by multi-index (by copy).
    #[inline]
    pub fn get(&self, indices: &[usize]) -> T {
        self.data[self.index(indices)]
    }

    /// Set value at multi-index.
    #[inline]
    pub fn set(&mut self, indices: &[usize], val: T) {
        let k = self.index(indices);
        self.data[k] = val;
    }

    /// Length of the contiguous block addressed by a leading index of rank `prefix_rank`.
    #[inline]
    pub fn block_len(&self, prefix_rank: usize) -> usize {
        self.shape[prefix_rank.min(self.shape.len())..].iter().product()
    }

    /// Contiguous block spanned by the trailing axes after `prefix`.
    #[inline]
    pub fn block(&self, prefix: &[usize]) -> &[T] {
        let start = self.index(prefix);
        let len = self.block_len(prefix.len());
        &self.data[start..start + len]
    }

    /// Mutable contiguous block spanned by the trailing axes after `prefix`.
    #[inline]
    pub fn block_mut(&mut self, prefix: &[usize]) -> &mut [T] {
        let start = self.index(prefix);
        let len = self.block_len(prefix.len());
        &mut self.data[start..start + len]
    }
}

//===================================================================
// ----------------------- Elementwise Checks -----------------------
//===================================================================

impl<T: Scalar> Tensor<T> {
    /// True iff every element is finite.
    pub fn all_finite(&self) -> bool {
        self.data.iter().all(|&x| x.is_finite())
    }

    /// Largest elementwise magnitude of `self - other`.
    ///
    /// # Panics
    /// Panics on shape mismatch.
    pub fn max_abs_diff(&self, other: &Self) -> T::Real {
        assert_eq!(self.shape, other.shape, "Tensor shape mismatch");
        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(&a, &b)| (a - b).abs_real())
            .fold(T::Real::zero(), |acc, d| acc.max(d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    #[test]
    fn row_major_index_and_blocks() {
        let mut t: Tensor<f64> = Tensor::new(vec![2, 3, 4]);
        assert_eq!(t.len(), 24);
        assert_eq!(t.index(&[1, 2, 3]), 23);
        assert_eq!(t.index(&[1]), 12);
        assert_eq!(t.block_len(1), 12);

        t.set(&[1, 0, 2], 7.0);
        assert_eq!(t.get(&[1, 0, 2]), 7.0);
        assert_eq!(t.block(&[1, 0])[2], 7.0);

        t.block_mut(&[0, 2]).copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(t.get(&[0, 2, 3]), 4.0);
    }

    #[test]
    fn out_of_range_is_rejected() {
        let t: Tensor<f64> = Tensor::new(vec![2, 2]);
        assert_eq!(t.try_index(&[2, 0]), None);
        assert_eq!(t.try_index(&[0, 0, 0]), None);
        assert_eq!(t.try_index(&[1, 1]), Some(3));
    }

    #[test]
    #[should_panic]
    fn zero_dimension_panics() {
        let _t: Tensor<f64> = Tensor::new(vec![2, 0]);
    }

    #[test]
    fn elementwise_checks_on_complex() {
        let a = Tensor::filled(vec![3], Complex64::new(1.0, 2.0));
        let mut b = a.clone();
        b.set(&[1], Complex64::new(4.0, 6.0));
        assert_eq!(a.max_abs_diff(&b), 5.0);
        assert!(b.all_finite());
        b.as_mut_slice()[2] = Complex64::new(f64::NAN, 0.0);
        assert!(!b.all_finite());
    }
}

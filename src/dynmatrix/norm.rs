use crate::traits::{FloatScalar, MatrixRef, Scalar};

use super::vector::DynVector;
use super::DynMatrix;

// ── Vector norms ────────────────────────────────────────────────────

impl<T: Scalar> DynVector<T> {
    /// Squared L2 norm (dot product with self).
    ///
    /// ```
    /// use eigenkit::DynVector;
    /// let v = DynVector::from_slice(&[3.0, 4.0]);
    /// assert_eq!(v.norm_squared(), 25.0);
    /// ```
    pub fn norm_squared(&self) -> T {
        self.dot(self)
    }
}

impl<T: FloatScalar> DynVector<T> {
    /// L2 (Euclidean) norm.
    ///
    /// ```
    /// use eigenkit::DynVector;
    /// let v = DynVector::from_slice(&[3.0_f64, 4.0]);
    /// assert!((v.norm() - 5.0).abs() < 1e-12);
    /// ```
    pub fn norm(&self) -> T {
        norm2(self.as_slice())
    }

    /// Scale in place to unit L2 norm. A zero vector is left unchanged.
    pub fn normalize(&mut self) {
        normalize_slice(self.as_mut_slice());
    }
}

/// L2 norm of a slice.
#[inline]
pub(crate) fn norm2<T: FloatScalar>(x: &[T]) -> T {
    x.iter().fold(T::zero(), |acc, &v| acc + v * v).sqrt()
}

/// Scale a slice in place to unit L2 norm; zero slices are left alone.
pub(crate) fn normalize_slice<T: FloatScalar>(x: &mut [T]) {
    let nrm = norm2(x);
    if nrm > T::zero() {
        for v in x.iter_mut() {
            *v = *v / nrm;
        }
    }
}

// ── Matrix norms ────────────────────────────────────────────────────

impl<T: FloatScalar> DynMatrix<T> {
    /// Frobenius norm: square root of the sum of squared entries.
    ///
    /// ```
    /// use eigenkit::DynMatrix;
    /// let m = DynMatrix::from_rows(2, 2, &[1.0_f64, 2.0, 2.0, 4.0]);
    /// assert!((m.frobenius_norm() - 5.0).abs() < 1e-12);
    /// ```
    pub fn frobenius_norm(&self) -> T {
        norm2(self.as_slice())
    }

    /// Largest absolute entry.
    pub fn max_abs(&self) -> T {
        self.as_slice()
            .iter()
            .fold(T::zero(), |acc, &v| acc.max(v.abs()))
    }
}

/// Frobenius norm of any matrix-like block, views included.
pub(crate) fn frobenius<T: FloatScalar>(m: &impl MatrixRef<T>) -> T {
    let mut sum = T::zero();
    for j in 0..m.ncols() {
        for &v in m.col_as_slice(j, 0) {
            sum = sum + v * v;
        }
    }
    sum.sqrt()
}

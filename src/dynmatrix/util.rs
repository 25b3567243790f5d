use core::fmt;

use crate::traits::{FloatScalar, MatrixMut, MatrixRef, Scalar};

use super::vector::DynVector;
use super::DynMatrix;

impl<T: Scalar> DynMatrix<T> {
    /// Overwrite with the identity (ones on the main diagonal, zeros elsewhere).
    ///
    /// Works for rectangular matrices too.
    pub fn set_identity(&mut self) {
        let (m, n) = self.shape();
        for j in 0..n {
            for i in 0..m {
                self[(i, j)] = if i == j { T::one() } else { T::zero() };
            }
        }
    }

    /// Copy all entries from a matrix-like source of the same shape.
    ///
    /// Panics on a shape mismatch.
    pub fn copy_from(&mut self, src: &impl MatrixRef<T>) {
        assert_eq!(
            (src.nrows(), src.ncols()),
            self.shape(),
            "copy_from shape mismatch"
        );
        for j in 0..self.ncols() {
            self.col_as_mut_slice(j, 0)
                .copy_from_slice(src.col_as_slice(j, 0));
        }
    }

    /// Transpose: returns an `ncols x nrows` matrix.
    ///
    /// ```
    /// use eigenkit::DynMatrix;
    /// let m = DynMatrix::from_rows(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    /// let t = m.transpose();
    /// assert_eq!(t.nrows(), 3);
    /// assert_eq!(t[(2, 1)], 6.0);
    /// ```
    pub fn transpose(&self) -> Self {
        DynMatrix::from_fn(self.ncols(), self.nrows(), |i, j| self[(j, i)])
    }

    /// Main diagonal as a vector of length `min(nrows, ncols)`.
    pub fn diagonal(&self) -> DynVector<T> {
        let k = self.nrows().min(self.ncols());
        DynVector::from_vec((0..k).map(|i| self[(i, i)]).collect())
    }

    /// Square matrix with `d` on the main diagonal.
    pub fn from_diagonal(d: &[T]) -> Self {
        let mut m = Self::zeros(d.len(), d.len(), T::zero());
        for (i, &v) in d.iter().enumerate() {
            m[(i, i)] = v;
        }
        m
    }

    /// Column `j` copied into a vector.
    pub fn col(&self, j: usize) -> DynVector<T> {
        DynVector::from_slice(self.col_as_slice(j, 0))
    }

    /// Reorder columns so that new column `k` is old column `perm[k]`.
    ///
    /// Panics if `perm.len() != ncols`.
    pub fn permute_cols(&mut self, perm: &[usize]) {
        assert_eq!(perm.len(), self.ncols(), "permutation length mismatch");
        let src = self.clone();
        for (k, &p) in perm.iter().enumerate() {
            self.col_as_mut_slice(k, 0)
                .copy_from_slice(src.col_as_slice(p, 0));
        }
    }
}

impl<T: FloatScalar> DynMatrix<T> {
    /// Whether the matrix is square and `|a_ij - a_ji| <= tol` everywhere.
    pub fn is_symmetric(&self, tol: T) -> bool {
        if !self.is_square() {
            return false;
        }
        let n = self.nrows();
        (0..n).all(|j| (0..j).all(|i| (self[(i, j)] - self[(j, i)]).abs() <= tol))
    }

    /// Whether every entry below the first subdiagonal is within `tol` of zero.
    pub fn is_upper_hessenberg(&self, tol: T) -> bool {
        let (m, n) = self.shape();
        (0..n).all(|j| ((j + 2)..m).all(|i| self[(i, j)].abs() <= tol))
    }

    /// Whether every entry off the diagonal and first superdiagonal is within
    /// `tol` of zero.
    pub fn is_upper_bidiagonal(&self, tol: T) -> bool {
        let (m, n) = self.shape();
        (0..n).all(|j| (0..m).all(|i| i == j || i + 1 == j || self[(i, j)].abs() <= tol))
    }
}

impl<T: fmt::Display> fmt::Display for DynMatrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.nrows() {
            write!(f, "[")?;
            for j in 0..self.ncols() {
                if j > 0 {
                    write!(f, ", ")?;
                }
                match f.precision() {
                    Some(p) => write!(f, "{:.*}", p, self[(i, j)])?,
                    None => write!(f, "{}", self[(i, j)])?,
                }
            }
            writeln!(f, "]")?;
        }
        Ok(())
    }
}

use core::ops::{Add, Mul, Neg, Sub};

use crate::traits::Scalar;

use super::vector::DynVector;
use super::DynMatrix;

// ── Element-wise addition / subtraction ─────────────────────────────

impl<T: Scalar> Add<&DynMatrix<T>> for &DynMatrix<T> {
    type Output = DynMatrix<T>;

    fn add(self, rhs: &DynMatrix<T>) -> DynMatrix<T> {
        assert_eq!(self.shape(), rhs.shape(), "dimension mismatch in add");
        let data = self
            .data
            .iter()
            .zip(&rhs.data)
            .map(|(&a, &b)| a + b)
            .collect();
        DynMatrix {
            data,
            nrows: self.nrows,
            ncols: self.ncols,
        }
    }
}

impl<T: Scalar> Sub<&DynMatrix<T>> for &DynMatrix<T> {
    type Output = DynMatrix<T>;

    fn sub(self, rhs: &DynMatrix<T>) -> DynMatrix<T> {
        assert_eq!(self.shape(), rhs.shape(), "dimension mismatch in sub");
        let data = self
            .data
            .iter()
            .zip(&rhs.data)
            .map(|(&a, &b)| a - b)
            .collect();
        DynMatrix {
            data,
            nrows: self.nrows,
            ncols: self.ncols,
        }
    }
}

impl<T: Scalar + Neg<Output = T>> Neg for &DynMatrix<T> {
    type Output = DynMatrix<T>;

    fn neg(self) -> DynMatrix<T> {
        DynMatrix {
            data: self.data.iter().map(|&x| -x).collect(),
            nrows: self.nrows,
            ncols: self.ncols,
        }
    }
}

// ── Matrix multiplication: (M×N) * (N×P) → (M×P) ──────────────────

impl<T: Scalar> Mul<&DynMatrix<T>> for &DynMatrix<T> {
    type Output = DynMatrix<T>;

    fn mul(self, rhs: &DynMatrix<T>) -> DynMatrix<T> {
        assert_eq!(
            self.ncols, rhs.nrows,
            "dimension mismatch: {}x{} * {}x{}",
            self.nrows, self.ncols, rhs.nrows, rhs.ncols,
        );
        let m = self.nrows;
        let n = self.ncols;
        let p = rhs.ncols;
        let mut data = vec![T::zero(); m * p];
        // Column-major: out[:, j] = sum_k a[:, k] * b[k, j]
        for j in 0..p {
            let out = &mut data[j * m..(j + 1) * m];
            for k in 0..n {
                let b_kj = rhs.data[j * n + k];
                if b_kj == T::zero() {
                    continue;
                }
                let a_k = &self.data[k * m..(k + 1) * m];
                for (o, &a) in out.iter_mut().zip(a_k) {
                    *o = *o + a * b_kj;
                }
            }
        }
        DynMatrix {
            data,
            nrows: m,
            ncols: p,
        }
    }
}

impl<T: Scalar> Mul for DynMatrix<T> {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        &self * &rhs
    }
}

// ── Matrix-vector product ───────────────────────────────────────────

impl<T: Scalar> Mul<&DynVector<T>> for &DynMatrix<T> {
    type Output = DynVector<T>;

    fn mul(self, rhs: &DynVector<T>) -> DynVector<T> {
        DynVector {
            inner: self * &rhs.inner,
        }
    }
}

// ── Scalar multiplication ───────────────────────────────────────────

impl<T: Scalar> Mul<T> for &DynMatrix<T> {
    type Output = DynMatrix<T>;

    fn mul(self, rhs: T) -> DynMatrix<T> {
        DynMatrix {
            data: self.data.iter().map(|&x| x * rhs).collect(),
            nrows: self.nrows,
            ncols: self.ncols,
        }
    }
}

impl<T: Scalar> Mul<T> for &DynVector<T> {
    type Output = DynVector<T>;

    fn mul(self, rhs: T) -> DynVector<T> {
        DynVector {
            inner: &self.inner * rhs,
        }
    }
}

impl<T: Scalar> Sub<&DynVector<T>> for &DynVector<T> {
    type Output = DynVector<T>;

    fn sub(self, rhs: &DynVector<T>) -> DynVector<T> {
        DynVector {
            inner: &self.inner - &rhs.inner,
        }
    }
}

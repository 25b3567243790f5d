//! Givens plane rotations.
//!
//! A rotation `(c, s)` acting on coordinates `(i, k)` is the matrix
//! `[c s; -s c]` embedded in the identity. Left application rotates rows
//! `i` and `k`, right application rotates columns `i` and `k`:
//!
//! ```text
//! row_i' = c·row_i - s·row_k        col_i' = c·col_i - s·col_k
//! row_k' = s·row_i + c·row_k        col_k' = s·col_i + c·col_k
//! ```
//!
//! The banded variants restrict the rotation to the index range where a
//! Hessenberg, tridiagonal or upper-bidiagonal matrix can hold nonzeros, so
//! a bulge chase costs O(1) per rotation instead of O(n). Outside that
//! range both rotated entries are zero and the dense result is identical.

use core::ops::Range;

use crate::traits::{FloatScalar, MatrixMut};

/// Rotation `(c, s)` with `[c s; -s c]^T [a; b] = [r; 0]`.
///
/// Returns `(1, 0)` when `b == 0`. The ratio is always taken as the
/// smaller over the larger magnitude, so no intermediate overflows.
///
/// ```
/// use eigenkit::linalg::givens::givens;
///
/// let (c, s) = givens(3.0_f64, 4.0);
/// // second component annihilated
/// assert!((s * 3.0 + c * 4.0).abs() < 1e-12);
/// assert!((c * c + s * s - 1.0).abs() < 1e-12);
/// ```
pub fn givens<T: FloatScalar>(a: T, b: T) -> (T, T) {
    if b == T::zero() {
        return (T::one(), T::zero());
    }
    if b.abs() > a.abs() {
        let t = -a / b;
        let s = T::one() / (T::one() + t * t).sqrt();
        (s * t, s)
    } else {
        let t = -b / a;
        let c = T::one() / (T::one() + t * t).sqrt();
        (c, c * t)
    }
}

#[inline]
fn rotate_rows<T: FloatScalar>(
    a: &mut impl MatrixMut<T>,
    c: T,
    s: T,
    i: usize,
    k: usize,
    cols: Range<usize>,
) {
    assert_ne!(i, k, "cannot rotate a row with itself");
    for j in cols {
        let t1 = *a.get(i, j);
        let t2 = *a.get(k, j);
        *a.get_mut(i, j) = c * t1 - s * t2;
        *a.get_mut(k, j) = s * t1 + c * t2;
    }
}

#[inline]
fn rotate_cols<T: FloatScalar>(
    a: &mut impl MatrixMut<T>,
    c: T,
    s: T,
    i: usize,
    k: usize,
    rows: Range<usize>,
) {
    assert_ne!(i, k, "cannot rotate a column with itself");
    for r in rows {
        let t1 = *a.get(r, i);
        let t2 = *a.get(r, k);
        *a.get_mut(r, i) = c * t1 - s * t2;
        *a.get_mut(r, k) = s * t1 + c * t2;
    }
}

/// `(lo, hi)` ordered pair.
#[inline]
fn span(i: usize, k: usize) -> (usize, usize) {
    (i.min(k), i.max(k))
}

/// Rotate rows `i` and `k` of a dense matrix.
pub fn apply_left<T: FloatScalar>(a: &mut impl MatrixMut<T>, c: T, s: T, i: usize, k: usize) {
    let n = a.ncols();
    rotate_rows(a, c, s, i, k, 0..n);
}

/// Rotate columns `i` and `k` of a dense matrix.
pub fn apply_right<T: FloatScalar>(a: &mut impl MatrixMut<T>, c: T, s: T, i: usize, k: usize) {
    let m = a.nrows();
    rotate_cols(a, c, s, i, k, 0..m);
}

/// Row rotation on an upper Hessenberg matrix: columns `max(lo,1)-1..n`.
pub fn apply_hessenberg_left<T: FloatScalar>(
    a: &mut impl MatrixMut<T>,
    c: T,
    s: T,
    i: usize,
    k: usize,
) {
    let (lo, _) = span(i, k);
    let n = a.ncols();
    rotate_rows(a, c, s, i, k, (lo.max(1) - 1).min(n)..n);
}

/// Column rotation on an upper Hessenberg matrix: rows `0..hi+2`.
pub fn apply_hessenberg_right<T: FloatScalar>(
    a: &mut impl MatrixMut<T>,
    c: T,
    s: T,
    i: usize,
    k: usize,
) {
    let (_, hi) = span(i, k);
    let m = a.nrows();
    rotate_cols(a, c, s, i, k, 0..(hi + 2).min(m));
}

/// Row rotation on a tridiagonal matrix: columns `max(lo,1)-1..hi+2`.
pub fn apply_tridiagonal_left<T: FloatScalar>(
    a: &mut impl MatrixMut<T>,
    c: T,
    s: T,
    i: usize,
    k: usize,
) {
    let (lo, hi) = span(i, k);
    let n = a.ncols();
    let end = (hi + 2).min(n);
    rotate_rows(a, c, s, i, k, (lo.max(1) - 1).min(end)..end);
}

/// Column rotation on a tridiagonal matrix: rows `max(lo,1)-1..hi+2`.
pub fn apply_tridiagonal_right<T: FloatScalar>(
    a: &mut impl MatrixMut<T>,
    c: T,
    s: T,
    i: usize,
    k: usize,
) {
    let (lo, hi) = span(i, k);
    let m = a.nrows();
    let end = (hi + 2).min(m);
    rotate_cols(a, c, s, i, k, (lo.max(1) - 1).min(end)..end);
}

/// Row rotation on an upper bidiagonal matrix: columns `lo..hi+2`.
pub fn apply_bidiagonal_left<T: FloatScalar>(
    a: &mut impl MatrixMut<T>,
    c: T,
    s: T,
    i: usize,
    k: usize,
) {
    let (lo, hi) = span(i, k);
    let n = a.ncols();
    let end = (hi + 2).min(n);
    rotate_rows(a, c, s, i, k, lo.min(end)..end);
}

/// Column rotation on an upper bidiagonal matrix: rows `max(lo,1)-1..hi+1`.
pub fn apply_bidiagonal_right<T: FloatScalar>(
    a: &mut impl MatrixMut<T>,
    c: T,
    s: T,
    i: usize,
    k: usize,
) {
    let (lo, hi) = span(i, k);
    let m = a.nrows();
    let end = (hi + 1).min(m);
    rotate_cols(a, c, s, i, k, (lo.max(1) - 1).min(end)..end);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DynMatrix;

    const TOL: f64 = 1e-14;

    type Banded = fn(&mut DynMatrix<f64>, f64, f64, usize, usize);

    /// 12×10 matrix with nonzeros only where `keep(i, j)`.
    fn patterned(keep: impl Fn(usize, usize) -> bool) -> DynMatrix<f64> {
        DynMatrix::from_fn(12, 10, |i, j| {
            if keep(i, j) {
                (i * 10 + j + 1) as f64
            } else {
                0.0
            }
        })
    }

    /// With a non-orthogonal `(c, s) = (3, 2)` every touched entry changes,
    /// so any missed entry inside the band shows up as a mismatch.
    fn check_banded(a: &DynMatrix<f64>, left: Banded, right: Banded) {
        for i in 0..10 {
            for k in 0..10 {
                if i == k {
                    continue;
                }
                let mut dense = a.clone();
                let mut banded = a.clone();
                apply_left(&mut dense, 3.0, 2.0, i, k);
                left(&mut banded, 3.0, 2.0, i, k);
                assert_eq!(dense, banded, "left rotation ({}, {})", i, k);

                let mut dense = a.clone();
                let mut banded = a.clone();
                apply_right(&mut dense, 3.0, 2.0, i, k);
                right(&mut banded, 3.0, 2.0, i, k);
                assert_eq!(dense, banded, "right rotation ({}, {})", i, k);
            }
        }
    }

    #[test]
    fn givens_annihilates() {
        for &(a, b) in &[(3.0_f64, 4.0), (4.0, 3.0), (-1.0, 1e-3), (1e-3, -5.0), (0.0, 2.0)] {
            let (c, s) = givens(a, b);
            assert!((c * c + s * s - 1.0).abs() < TOL);
            assert!((s * a + c * b).abs() < TOL, "({}, {}) not annihilated", a, b);
            let r = c * a - s * b;
            assert!((r.abs() - (a * a + b * b).sqrt()).abs() < 1e-12);
        }
        assert_eq!(givens(5.0, 0.0), (1.0, 0.0));
    }

    #[test]
    fn rotation_reads_before_write() {
        let mut a = DynMatrix::from_rows(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        apply_left(&mut a, 0.0, 1.0, 0, 1);
        // row0' = -row1, row1' = row0
        assert_eq!(a, DynMatrix::from_rows(2, 2, &[-3.0, -4.0, 1.0, 2.0]));
        apply_right(&mut a, 0.0, 1.0, 0, 1);
        assert_eq!(a, DynMatrix::from_rows(2, 2, &[4.0, -3.0, -2.0, 1.0]));
    }

    #[test]
    fn hessenberg_band_matches_dense() {
        let a = patterned(|i, j| i <= j + 1);
        check_banded(
            &a,
            |a, c, s, i, k| apply_hessenberg_left(a, c, s, i, k),
            |a, c, s, i, k| apply_hessenberg_right(a, c, s, i, k),
        );
    }

    #[test]
    fn tridiagonal_band_matches_dense() {
        let a = patterned(|i, j| i <= j + 1 && j <= i + 1);
        check_banded(
            &a,
            |a, c, s, i, k| apply_tridiagonal_left(a, c, s, i, k),
            |a, c, s, i, k| apply_tridiagonal_right(a, c, s, i, k),
        );
    }

    #[test]
    fn bidiagonal_band_matches_dense() {
        let a = patterned(|i, j| j == i || j == i + 1);
        check_banded(
            &a,
            |a, c, s, i, k| apply_bidiagonal_left(a, c, s, i, k),
            |a, c, s, i, k| apply_bidiagonal_right(a, c, s, i, k),
        );
    }

    #[test]
    #[should_panic(expected = "itself")]
    fn rotating_row_with_itself_panics() {
        let mut a = DynMatrix::eye(3, 0.0_f64);
        apply_left(&mut a, 1.0, 0.0, 1, 1);
    }
}

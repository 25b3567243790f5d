//! Singular value decomposition by Golub-Kahan iteration.
//!
//! The matrix is first reduced to upper bidiagonal form `B`, then implicit
//! Wilkinson-shifted QR steps on `B^T B` are applied to `B` directly through
//! alternating right/left Givens rotations until the superdiagonal vanishes.

use core::cmp::Ordering;

use log::{debug, trace, warn};

use crate::dynmatrix::{DynMatrix, DynVector};
use crate::linalg::bidiagonal::{bidiagonalize, ensure_tall};
use crate::linalg::givens::{
    apply_bidiagonal_left, apply_bidiagonal_right, apply_right as givens_right, givens,
};
use crate::linalg::workspace::{check_matrix, ensure_matrix, ReflectorWorkspace};
use crate::linalg::{iteration_cap, negligible, wilkinson_shift, LinalgError};
use crate::traits::{FloatScalar, MatrixMut};

/// Options for [`svd`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvdSettings<T> {
    /// Compute the left singular vectors.
    pub compute_u: bool,
    /// Compute the right singular vectors.
    pub compute_v: bool,
    /// Relative deflation tolerance.
    pub epsilon: T,
    /// Cap on implicit steps; `None` means `30·min(m, n)`.
    pub max_iter: Option<usize>,
}

impl<T: FloatScalar> Default for SvdSettings<T> {
    fn default() -> Self {
        Self {
            compute_u: true,
            compute_v: true,
            epsilon: T::epsilon(),
            max_iter: None,
        }
    }
}

/// Buffers for [`svd_in`].
///
/// All buffers are shaped for the tall orientation of the input: for an
/// `m x n` matrix with `m < n` they describe the decomposition of `A^T`
/// (`b` is `n x m`, `u` is `n x n`, `v` is `m x m`).
#[derive(Debug, Clone)]
pub struct SvdWorkspace<T> {
    pub b: Option<DynMatrix<T>>,
    pub u: Option<DynMatrix<T>>,
    pub v: Option<DynMatrix<T>>,
    pub reflector: ReflectorWorkspace<T>,
}

impl<T> Default for SvdWorkspace<T> {
    fn default() -> Self {
        Self {
            b: None,
            u: None,
            v: None,
            reflector: ReflectorWorkspace::default(),
        }
    }
}

/// `A = U S V^T`.
///
/// `s` has the shape of `A` and holds the singular values on its main
/// diagonal. As produced by [`svd`] they are signed and unordered; use
/// [`Svd::sorted`] for the conventional form.
#[derive(Debug, Clone)]
pub struct Svd<T> {
    pub s: DynMatrix<T>,
    pub u: Option<DynMatrix<T>>,
    pub v: Option<DynMatrix<T>>,
    /// Implicit steps taken.
    pub iterations: usize,
}

impl<T: FloatScalar> Svd<T> {
    /// Diagonal of `s`, in storage order.
    pub fn singular_values(&self) -> DynVector<T> {
        self.s.diagonal()
    }

    /// Non-negative singular values in descending order, with the columns of
    /// `u` and `v` permuted to match.
    ///
    /// A negative value flips the sign of its `u` column (or of its `v`
    /// column when `u` was not computed).
    ///
    /// ```
    /// use eigenkit::DynMatrix;
    /// use eigenkit::linalg::{svd, SvdSettings};
    ///
    /// let a = DynMatrix::from_rows(2, 2, &[0.0_f64, -3.0, 1.0, 0.0]);
    /// let sv = svd(&a, &SvdSettings::default()).unwrap().sorted();
    /// assert!((sv.s[(0, 0)] - 3.0).abs() < 1e-12);
    /// assert!((sv.s[(1, 1)] - 1.0).abs() < 1e-12);
    /// ```
    pub fn sorted(&self) -> Svd<T> {
        let (m, n) = self.s.shape();
        let k = m.min(n);
        let mut u = self.u.clone();
        let mut v = self.v.clone();
        let mut sigma: Vec<T> = (0..k).map(|i| self.s[(i, i)]).collect();

        for (i, sv) in sigma.iter_mut().enumerate() {
            if *sv < T::zero() {
                *sv = -*sv;
                if let Some(u) = u.as_mut() {
                    negate_column(u, i);
                } else if let Some(v) = v.as_mut() {
                    negate_column(v, i);
                }
            }
        }

        let mut order: Vec<usize> = (0..k).collect();
        order.sort_by(|&x, &y| sigma[y].partial_cmp(&sigma[x]).unwrap_or(Ordering::Equal));

        let mut s = DynMatrix::zeros(m, n, T::zero());
        for (i, &o) in order.iter().enumerate() {
            s[(i, i)] = sigma[o];
        }
        if let Some(u) = u.as_mut() {
            u.permute_cols(&extend_permutation(&order, m));
        }
        if let Some(v) = v.as_mut() {
            v.permute_cols(&extend_permutation(&order, n));
        }
        Svd {
            s,
            u,
            v,
            iterations: self.iterations,
        }
    }

    /// Number of singular values with magnitude above `tol`.
    pub fn rank(&self, tol: T) -> usize {
        self.singular_values().iter().filter(|s| s.abs() > tol).count()
    }

    /// Ratio of the largest to the smallest singular value magnitude.
    ///
    /// Infinite for a singular matrix.
    pub fn condition_number(&self) -> T {
        let sv = self.singular_values();
        let mut max = T::zero();
        let mut min = T::infinity();
        for s in sv.iter() {
            max = max.max(s.abs());
            min = min.min(s.abs());
        }
        if min == T::zero() {
            T::infinity()
        } else {
            max / min
        }
    }
}

fn negate_column<T: FloatScalar>(m: &mut DynMatrix<T>, j: usize) {
    for x in m.col_as_mut_slice(j, 0) {
        *x = -*x;
    }
}

/// `order` followed by the identity on `order.len()..len`.
fn extend_permutation(order: &[usize], len: usize) -> Vec<usize> {
    order.iter().copied().chain(order.len()..len).collect()
}

/// Locate the active block of the leading `n x n` bidiagonal part.
fn split_bidiagonal<T: FloatScalar>(b: &DynMatrix<T>, mut q: usize) -> (usize, usize) {
    let n = b.ncols();
    while q + 1 < n {
        let k = n - q - 1;
        if b[(k - 1, k)] == T::zero() {
            q += 1;
        } else {
            break;
        }
    }
    if q + 1 == n {
        q = n;
    }
    if q >= n {
        return (0, n);
    }
    let mut p = n - q - 1;
    while p > 0 && b[(p - 1, p)] != T::zero() {
        p -= 1;
    }
    (p, q)
}

/// Set diagonal entries of the block `lo..hi` that are negligible relative
/// to the block's Frobenius norm to exact zero.
fn flush_tiny_diagonal<T: FloatScalar>(b: &mut DynMatrix<T>, lo: usize, hi: usize, epsilon: T) {
    let mut sum = T::zero();
    for k in lo..hi {
        sum = sum + b[(k, k)] * b[(k, k)];
        if k + 1 < hi {
            sum = sum + b[(k, k + 1)] * b[(k, k + 1)];
        }
    }
    let tol = epsilon * sum.sqrt();
    for k in lo..hi {
        if b[(k, k)] != T::zero() && b[(k, k)].abs() <= tol {
            trace!("golub_kahan_svd: flushing diagonal entry {}", k);
            b[(k, k)] = T::zero();
        }
    }
}

/// Chase the superdiagonal of row `k` (whose diagonal is zero) out of the
/// block with row rotations against rows `k+1..hi`.
fn zero_row<T: FloatScalar>(
    b: &mut DynMatrix<T>,
    mut u: Option<&mut DynMatrix<T>>,
    k: usize,
    hi: usize,
) {
    for i in (k + 1)..hi {
        let (c, s) = givens(b[(i, i)], b[(k, i)]);
        apply_bidiagonal_left(b, c, s, i, k);
        b[(k, i)] = T::zero();
        if let Some(u) = u.as_deref_mut() {
            givens_right(u, c, s, i, k);
        }
    }
}

/// Chase the last column of the block (whose diagonal is zero) upward with
/// column rotations against columns `lo..last`.
fn zero_column<T: FloatScalar>(
    b: &mut DynMatrix<T>,
    mut v: Option<&mut DynMatrix<T>>,
    lo: usize,
    last: usize,
) {
    for i in (lo..last).rev() {
        let (c, s) = givens(b[(i, i)], b[(i, last)]);
        apply_bidiagonal_right(b, c, s, i, last);
        b[(i, last)] = T::zero();
        if let Some(v) = v.as_deref_mut() {
            givens_right(v, c, s, i, last);
        }
    }
}

/// One implicit-shift Golub-Kahan step on the block `lo..hi` of an upper
/// bidiagonal matrix.
///
/// The shift is the Wilkinson shift of the trailing 2×2 block of `B^T B`,
/// formed from the four entries of `B` it depends on. Each rotation pair
/// first annihilates the bulge above the superdiagonal (from the right,
/// accumulated into `v`), then the one below the diagonal (from the left,
/// accumulated into `u`).
///
/// Panics unless the block has at least 2 rows.
pub fn golub_kahan_step<T: FloatScalar>(
    b: &mut DynMatrix<T>,
    mut u: Option<&mut DynMatrix<T>>,
    mut v: Option<&mut DynMatrix<T>>,
    lo: usize,
    hi: usize,
) {
    assert!(
        hi <= b.ncols() && hi >= lo + 2,
        "golub-kahan step needs an active block of at least 2 rows"
    );
    let a = hi - 2;
    let c = hi - 1;
    let mut t11 = b[(a, a)] * b[(a, a)];
    if a > lo {
        t11 = t11 + b[(a - 1, a)] * b[(a - 1, a)];
    }
    let t12 = b[(a, a)] * b[(a, c)];
    let t22 = b[(c, c)] * b[(c, c)] + b[(a, c)] * b[(a, c)];
    let mu = wilkinson_shift(t11, t12, t22);

    let mut y = b[(lo, lo)] * b[(lo, lo)] - mu;
    let mut z = b[(lo, lo)] * b[(lo, lo + 1)];

    for k in lo..(hi - 1) {
        let (cs, sn) = givens(y, z);
        apply_bidiagonal_right(b, cs, sn, k, k + 1);
        if k > lo {
            b[(k - 1, k + 1)] = T::zero();
        }
        if let Some(v) = v.as_deref_mut() {
            givens_right(v, cs, sn, k, k + 1);
        }

        y = b[(k, k)];
        z = b[(k + 1, k)];
        let (cs, sn) = givens(y, z);
        apply_bidiagonal_left(b, cs, sn, k, k + 1);
        b[(k + 1, k)] = T::zero();
        if let Some(u) = u.as_deref_mut() {
            givens_right(u, cs, sn, k, k + 1);
        }

        if k + 2 < hi {
            y = b[(k, k + 1)];
            z = b[(k, k + 2)];
        }
    }
}

/// Diagonalize an `m x n` upper bidiagonal matrix (`m >= n`) in place.
///
/// `u` (`m x m`) and `v` (`n x n`), if given, are multiplied on the right by
/// the left and right rotations, so passing the bidiagonalization
/// accumulators yields `A = U B V^T`. The resulting diagonal is signed and
/// unordered.
///
/// Returns the number of implicit steps, or `ConvergenceFailure` after
/// `max_iter` steps.
pub fn golub_kahan_svd<T: FloatScalar>(
    b: &mut DynMatrix<T>,
    mut u: Option<&mut DynMatrix<T>>,
    mut v: Option<&mut DynMatrix<T>>,
    epsilon: T,
    max_iter: usize,
) -> Result<usize, LinalgError> {
    let (m, n) = b.shape();
    ensure_tall(m, n)?;
    check_matrix(u.as_deref(), m, m, "u")?;
    check_matrix(v.as_deref(), n, n, "v")?;

    let mut q = 0;
    let mut iterations = 0;
    loop {
        for i in 0..n.saturating_sub(1) {
            if negligible(b[(i, i + 1)], b[(i, i)], b[(i + 1, i + 1)], epsilon) {
                b[(i, i + 1)] = T::zero();
            }
        }
        let (p, q_next) = split_bidiagonal(b, q);
        if q_next != q {
            trace!("golub_kahan_svd: deflated to p={}, q={}", p, q_next);
        }
        q = q_next;
        if q >= n {
            break;
        }
        let hi = n - q;

        flush_tiny_diagonal(b, p, hi, epsilon);
        if let Some(k) = (p..hi - 1).find(|&k| b[(k, k)] == T::zero()) {
            trace!("golub_kahan_svd: zero diagonal at {}, chasing row", k);
            zero_row(b, u.as_deref_mut(), k, hi);
            continue;
        }
        if b[(hi - 1, hi - 1)] == T::zero() {
            trace!("golub_kahan_svd: zero diagonal at {}, chasing column", hi - 1);
            zero_column(b, v.as_deref_mut(), p, hi - 1);
            continue;
        }

        iterations += 1;
        if iterations > max_iter {
            warn!(
                "golub_kahan_svd: no convergence after {} iterations (active block {}..{})",
                max_iter, p, hi
            );
            return Err(LinalgError::ConvergenceFailure {
                iterations: max_iter,
            });
        }
        golub_kahan_step(b, u.as_deref_mut(), v.as_deref_mut(), p, hi);
    }
    debug!("golub_kahan_svd: {}x{} converged in {} iterations", m, n, iterations);
    Ok(iterations)
}

/// [`svd`] into caller-owned buffers; returns the step count.
///
/// For `m >= n`, `ws.b` holds the diagonal `S`, and `ws.u`/`ws.v` the
/// singular vectors. For `m < n` the buffers hold the decomposition of
/// `A^T` (see [`SvdWorkspace`]).
pub fn svd_in<T: FloatScalar>(
    a: &DynMatrix<T>,
    settings: &SvdSettings<T>,
    ws: &mut SvdWorkspace<T>,
) -> Result<usize, LinalgError> {
    let (m, n) = a.shape();
    let wide = m < n;
    let (mt, nt) = if wide { (n, m) } else { (m, n) };
    let (want_left, want_right) = if wide {
        (settings.compute_v, settings.compute_u)
    } else {
        (settings.compute_u, settings.compute_v)
    };

    let SvdWorkspace { b, u, v, reflector } = ws;
    check_matrix(b.as_ref(), mt, nt, "b")?;
    if want_left {
        check_matrix(u.as_ref(), mt, mt, "u")?;
    }
    if want_right {
        check_matrix(v.as_ref(), nt, nt, "v")?;
    }
    reflector.buffers(mt)?;

    let b = ensure_matrix(b, mt, nt, "b")?;
    if wide {
        for j in 0..nt {
            for i in 0..mt {
                b[(i, j)] = a[(j, i)];
            }
        }
    } else {
        b.copy_from(a);
    }
    let mut u = if want_left {
        Some(ensure_matrix(u, mt, mt, "u")?)
    } else {
        None
    };
    let mut v = if want_right {
        Some(ensure_matrix(v, nt, nt, "v")?)
    } else {
        None
    };

    bidiagonalize(b, u.as_deref_mut(), v.as_deref_mut(), reflector)?;
    golub_kahan_svd(
        b,
        u,
        v,
        settings.epsilon,
        iteration_cap(settings.max_iter, nt),
    )
}

/// Singular value decomposition `A = U S V^T` of any `m x n` matrix.
///
/// ```
/// use eigenkit::DynMatrix;
/// use eigenkit::linalg::{svd, SvdSettings};
///
/// let a = DynMatrix::from_rows(3, 3, &[1.0_f64, 1.0, 0.0, 0.0, 2.0, 1.0, 0.0, 0.0, 3.0]);
/// let sv = svd(&a, &SvdSettings::default()).unwrap();
/// let product: f64 = sv.singular_values().iter().product();
/// assert!((product.abs() - 6.0).abs() < 1e-9);
///
/// let (u, v) = (sv.u.unwrap(), sv.v.unwrap());
/// let back = &(&u * &sv.s) * &v.transpose();
/// assert!((&back - &a).max_abs() < 1e-10);
/// ```
pub fn svd<T: FloatScalar>(a: &DynMatrix<T>, settings: &SvdSettings<T>) -> Result<Svd<T>, LinalgError> {
    let (m, n) = a.shape();
    let mut ws = SvdWorkspace::default();
    let iterations = svd_in(a, settings, &mut ws)?;
    let SvdWorkspace { b, u, v, .. } = ws;
    let b = b.unwrap_or_else(|| DynMatrix::zeros(m.max(n), m.min(n), T::zero()));
    Ok(if m < n {
        Svd {
            s: b.transpose(),
            u: v,
            v: u,
            iterations,
        }
    } else {
        Svd {
            s: b,
            u,
            v,
            iterations,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-10;

    fn reconstruct(sv: &Svd<f64>) -> DynMatrix<f64> {
        let u = sv.u.as_ref().expect("u requested");
        let v = sv.v.as_ref().expect("v requested");
        &(u * &sv.s) * &v.transpose()
    }

    fn check_svd(a: &DynMatrix<f64>, sv: &Svd<f64>) {
        let (m, n) = a.shape();
        assert_eq!(sv.s.shape(), (m, n));
        for i in 0..m {
            for j in 0..n {
                if i != j {
                    assert_eq!(sv.s[(i, j)], 0.0, "S[({},{})] off-diagonal", i, j);
                }
            }
        }
        assert!(
            (&reconstruct(sv) - a).max_abs() < TOL,
            "U S V^T differs from A"
        );
        let u = sv.u.as_ref().unwrap();
        let v = sv.v.as_ref().unwrap();
        assert!((&(&u.transpose() * u) - &DynMatrix::eye(m, 0.0)).max_abs() < TOL);
        assert!((&(&v.transpose() * v) - &DynMatrix::eye(n, 0.0)).max_abs() < TOL);
    }

    #[test]
    fn square_upper_triangular() {
        let a = DynMatrix::from_rows(3, 3, &[1.0, 1.0, 0.0, 0.0, 2.0, 1.0, 0.0, 0.0, 3.0]);
        let sv = svd(&a, &SvdSettings::default()).unwrap();
        check_svd(&a, &sv);
        let sorted = sv.sorted();
        check_svd(&a, &sorted);
        let s = sorted.singular_values();
        assert!((s[0] - 3.2731).abs() < 1e-4);
        assert!((s[1] - 2.1326).abs() < 1e-4);
        assert!((s[2] - 0.8596).abs() < 1e-4);
        assert!((s[0] * s[1] * s[2] - 6.0).abs() < 1e-9);
    }

    #[test]
    fn tall_and_wide() {
        let tall = DynMatrix::from_fn(6, 4, |i, j| ((i * 3 + j * 5) % 7) as f64 - 2.5);
        let sv = svd(&tall, &SvdSettings::default()).unwrap();
        check_svd(&tall, &sv);

        let wide = tall.transpose();
        let sw = svd(&wide, &SvdSettings::default()).unwrap();
        check_svd(&wide, &sw);

        let mut a: Vec<f64> = sv.sorted().singular_values().iter().copied().collect();
        let b: Vec<f64> = sw.sorted().singular_values().iter().copied().collect();
        a.truncate(b.len());
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < TOL, "A and A^T singular values differ");
        }
    }

    #[test]
    fn zero_diagonal_entries() {
        let cases = [
            [0.0, 1.0, 0.0, 0.0, 2.0, 1.0, 0.0, 0.0, 3.0],
            [1.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 3.0],
            [1.0, 1.0, 0.0, 0.0, 2.0, 1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0],
        ];
        for rows in &cases {
            let a = DynMatrix::from_rows(3, 3, rows);
            let sv = svd(&a, &SvdSettings::default()).unwrap();
            check_svd(&a, &sv);
        }
    }

    #[test]
    fn rank_deficient() {
        let a = DynMatrix::from_rows(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        let sv = svd(&a, &SvdSettings::default()).unwrap();
        check_svd(&a, &sv);
        assert_eq!(sv.rank(1e-10), 1);
        assert!(sv.condition_number() > 1e12);
        let sorted = sv.sorted();
        assert!((sorted.s[(0, 0)] - 5.0).abs() < TOL);
    }

    #[test]
    fn sorted_flips_negative_values() {
        let a = DynMatrix::from_rows(2, 2, &[-2.0, 0.0, 0.0, 5.0]);
        let sv = Svd {
            s: a.clone(),
            u: Some(DynMatrix::eye(2, 0.0)),
            v: Some(DynMatrix::eye(2, 0.0)),
            iterations: 0,
        };
        let sorted = sv.sorted();
        assert_eq!(sorted.singular_values().as_slice(), &[5.0, 2.0]);
        assert!((&reconstruct(&sorted) - &a).max_abs() < TOL);
        assert_eq!(sv.condition_number(), 2.5);
    }

    #[test]
    fn values_only() {
        let a = DynMatrix::from_rows(2, 3, &[1.0_f64, 0.0, 2.0, 0.0, 3.0, 0.0]);
        let settings = SvdSettings {
            compute_u: false,
            compute_v: false,
            ..SvdSettings::default()
        };
        let sv = svd(&a, &settings).unwrap();
        assert!(sv.u.is_none() && sv.v.is_none());
        let s = sv.sorted().singular_values();
        assert!((s[0] - 3.0).abs() < TOL);
        assert!((s[1] - 5.0_f64.sqrt()).abs() < TOL);
    }

    #[test]
    fn workspace_mismatch() {
        let a = DynMatrix::eye(3, 0.0_f64);
        let mut ws = SvdWorkspace {
            v: Some(DynMatrix::zeros(2, 2, 0.0)),
            ..SvdWorkspace::default()
        };
        assert_eq!(
            svd_in(&a, &SvdSettings::default(), &mut ws).unwrap_err(),
            LinalgError::WorkspaceMismatch {
                buffer: "v",
                expected: (3, 3),
                got: (2, 2),
            }
        );
        // untouched on error
        assert!(ws.b.is_none());
    }

    #[test]
    fn iteration_cap_reports_failure() {
        let a = DynMatrix::from_fn(4, 4, |i, j| (i + j) as f64 + if i == j { 1.0 } else { 0.0 });
        let settings = SvdSettings {
            max_iter: Some(0),
            ..SvdSettings::default()
        };
        assert_eq!(
            svd(&a, &settings).unwrap_err(),
            LinalgError::ConvergenceFailure { iterations: 0 }
        );
    }
}

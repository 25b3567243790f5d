//! Implicit-shift QR iterations.
//!
//! The general path reduces to Hessenberg form and runs Francis double-shift
//! steps until the matrix is quasi-upper-triangular (real Schur form). The
//! symmetric path reduces to tridiagonal form and runs Wilkinson-shifted
//! Givens sweeps until the matrix is diagonal.
//!
//! Both loops share the same shape: flush negligible subdiagonal entries to
//! exact zero, split off the converged trailing block (`q` rows) and the
//! decoupled leading block (`p` rows), then iterate on the active block
//! `p..n-q`. `q` only grows.

use log::{debug, trace, warn};

use crate::dynmatrix::{frobenius, DynMatrix, DynVector};
use crate::linalg::givens::{
    apply_hessenberg_left, apply_hessenberg_right, apply_right as givens_right,
    apply_tridiagonal_left, apply_tridiagonal_right, givens,
};
use crate::linalg::hessenberg::hessenberg_reduce;
use crate::linalg::householder::{apply_left, apply_right, reflector};
use crate::linalg::tridiagonal::tridiagonalize;
use crate::linalg::workspace::{check_matrix, ensure_matrix, ReflectorWorkspace};
use crate::linalg::{ensure_square, iteration_cap, negligible, wilkinson_shift, LinalgError};
use crate::traits::{FloatScalar, MatrixRef};

/// Options for [`qr_algorithm`] and [`qr_algorithm_symmetric`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QrSettings<T> {
    /// Relative deflation tolerance.
    pub epsilon: T,
    /// Cap on implicit steps; `None` means `30·n`.
    pub max_iter: Option<usize>,
    /// Accumulate the orthogonal transform.
    pub compute_u: bool,
}

impl<T: FloatScalar> Default for QrSettings<T> {
    fn default() -> Self {
        Self {
            epsilon: T::epsilon(),
            max_iter: None,
            compute_u: true,
        }
    }
}

/// Buffers for [`qr_algorithm_in`] / [`qr_algorithm_symmetric_in`].
///
/// After a successful call `h` holds the converged form and `u` (if
/// requested) the accumulated transform.
#[derive(Debug, Clone)]
pub struct QrWorkspace<T> {
    pub h: Option<DynMatrix<T>>,
    pub u: Option<DynMatrix<T>>,
    pub reflector: ReflectorWorkspace<T>,
}

impl<T> Default for QrWorkspace<T> {
    fn default() -> Self {
        Self {
            h: None,
            u: None,
            reflector: ReflectorWorkspace::default(),
        }
    }
}

/// Converged QR iteration: `A = U S U^T`.
///
/// For the general path `S` is quasi-upper-triangular: 1×1 diagonal blocks
/// carry real eigenvalues, 2×2 blocks (nonzero subdiagonal) carry complex
/// conjugate pairs. For the symmetric path `S` is diagonal.
#[derive(Debug, Clone)]
pub struct SchurForm<T> {
    pub s: DynMatrix<T>,
    pub u: Option<DynMatrix<T>>,
    /// Implicit steps taken.
    pub iterations: usize,
}

impl<T: FloatScalar> SchurForm<T> {
    /// Diagonal eigenvalue estimates in storage order.
    ///
    /// Both slots of a complex 2×2 block report the pair's real part.
    pub fn eigenvalues(&self) -> DynVector<T> {
        let mut out = DynVector::zeros(self.s.nrows(), T::zero());
        schur_eigenvalues_into(&self.s, out.as_mut_slice());
        out
    }
}

/// Read eigenvalues off a quasi-upper-triangular matrix.
pub(crate) fn schur_eigenvalues_into<T: FloatScalar>(s: &impl MatrixRef<T>, out: &mut [T]) {
    let n = s.nrows();
    let mut i = 0;
    while i < n {
        if i + 1 < n && *s.get(i + 1, i) != T::zero() {
            let re = (*s.get(i, i) + *s.get(i + 1, i + 1)) * T::half();
            out[i] = re;
            out[i + 1] = re;
            i += 2;
        } else {
            out[i] = *s.get(i, i);
            i += 1;
        }
    }
}

/// Whether the 2×2 block at `(i, i)` has complex eigenvalues.
#[inline]
fn has_complex_pair<T: FloatScalar>(h: &DynMatrix<T>, i: usize) -> bool {
    let p = (h[(i, i)] - h[(i + 1, i + 1)]) * T::half();
    p * p + h[(i, i + 1)] * h[(i + 1, i)] < T::zero()
}

/// Locate the active block of a Hessenberg matrix.
///
/// Grows `q` past trailing 1×1 blocks and trailing complex 2×2 blocks, then
/// scans upward from row `n-q-1` to the first zero subdiagonal. Returns
/// `(p, q)`; `q >= n` means fully converged.
fn split_hessenberg<T: FloatScalar>(h: &DynMatrix<T>, mut q: usize) -> (usize, usize) {
    let n = h.nrows();
    while q < n {
        let k = n - q - 1;
        if k == 0 {
            q = n;
        } else if h[(k, k - 1)] == T::zero() {
            q += 1;
        } else if (k == 1 || h[(k - 1, k - 2)] == T::zero()) && has_complex_pair(h, k - 1) {
            q += 2;
        } else {
            break;
        }
    }
    if q >= n {
        return (0, n);
    }
    let mut p = n - q - 1;
    while p > 0 && h[(p, p - 1)] != T::zero() {
        p -= 1;
    }
    (p, q)
}

/// Triangularize an isolated 2×2 block with real eigenvalues by one Givens
/// similarity rotation aligned with an eigenvector.
fn standardize<T: FloatScalar>(h: &mut DynMatrix<T>, u: Option<&mut DynMatrix<T>>, i: usize) {
    let a = h[(i, i)];
    let b = h[(i, i + 1)];
    let c = h[(i + 1, i)];
    let d = h[(i + 1, i + 1)];
    let p = (a - d) * T::half();
    let disc = (p * p + b * c).max(T::zero()).sqrt();
    // eigenvalue farther from d keeps lambda - d away from cancellation
    let lambda = if p >= T::zero() {
        (a + d) * T::half() + disc
    } else {
        (a + d) * T::half() - disc
    };
    let (cs, sn) = givens(lambda - d, c);
    apply_hessenberg_left(h, cs, sn, i, i + 1);
    apply_hessenberg_right(h, cs, sn, i, i + 1);
    h[(i + 1, i)] = T::zero();
    if let Some(u) = u {
        givens_right(u, cs, sn, i, i + 1);
    }
}

/// Counts Francis steps since the last deflation. Every 10th step on the
/// same trailing block uses an exceptional shift.
#[derive(Debug, Default)]
struct ShiftSchedule {
    since_deflation: usize,
}

impl ShiftSchedule {
    fn deflated(&mut self) {
        self.since_deflation = 0;
    }

    fn next_is_exceptional(&mut self) -> bool {
        self.since_deflation += 1;
        self.since_deflation % 10 == 0
    }
}

/// One Francis double-shift step on the active block `lo..hi` of an upper
/// Hessenberg matrix.
///
/// The shift pair is the eigenvalue pair of the trailing 2×2 block, passed
/// implicitly as its sum and product. An `exceptional` step replaces it by
/// an ad-hoc pair built from the two trailing subdiagonal magnitudes. The
/// first column of `(H - s1)(H - s2)` seeds a 3-vector reflector whose bulge
/// is chased down the band; a final 2-vector reflector restores Hessenberg
/// form. Reflectors act on full rows and columns of `h`, so coupling to the
/// converged blocks stays correct, and are accumulated into `u`.
///
/// Panics unless the block has at least 3 rows.
pub fn francis_step<T: FloatScalar>(
    h: &mut DynMatrix<T>,
    mut u: Option<&mut DynMatrix<T>>,
    lo: usize,
    hi: usize,
    exceptional: bool,
    ws: &mut ReflectorWorkspace<T>,
) -> Result<(), LinalgError> {
    let n = h.nrows();
    assert!(hi <= n && hi >= lo + 3, "francis step needs an active block of at least 3 rows");
    check_matrix(u.as_deref(), n, n, "u")?;
    let (_, nu, work) = ws.buffers(n)?;

    let m = hi - 1;
    let (s, t) = if exceptional {
        let w = h[(m, m - 1)].abs() + h[(m - 1, m - 2)].abs();
        (w + w * T::half(), w * w)
    } else {
        (
            h[(m - 1, m - 1)] + h[(m, m)],
            h[(m - 1, m - 1)] * h[(m, m)] - h[(m - 1, m)] * h[(m, m - 1)],
        )
    };

    let h00 = h[(lo, lo)];
    let h01 = h[(lo, lo + 1)];
    let h10 = h[(lo + 1, lo)];
    let h11 = h[(lo + 1, lo + 1)];
    let mut x = h00 * h00 + h01 * h10 - s * h00 + t;
    let mut y = h10 * (h00 + h11 - s);
    let mut z = h10 * h[(lo + 2, lo + 1)];

    for k in lo..(hi - 2) {
        let beta = reflector(&[x, y, z], &mut nu[..3]);
        let nu3 = &nu[..3];
        let c0 = if k > lo { k - 1 } else { lo };
        apply_left(&mut h.view_mut(k, c0, 3, n - c0), beta, nu3, work);
        if k > lo {
            h[(k + 1, k - 1)] = T::zero();
            h[(k + 2, k - 1)] = T::zero();
        }
        let rows = (k + 4).min(hi);
        apply_right(&mut h.view_mut(0, k, rows, 3), beta, nu3, work);
        if let Some(u) = u.as_deref_mut() {
            apply_right(&mut u.view_mut(0, k, n, 3), beta, nu3, work);
        }

        x = h[(k + 1, k)];
        y = h[(k + 2, k)];
        if k + 3 < hi {
            z = h[(k + 3, k)];
        }
    }

    let beta = reflector(&[x, y], &mut nu[..2]);
    let nu2 = &nu[..2];
    apply_left(&mut h.view_mut(hi - 2, hi - 3, 2, n - (hi - 3)), beta, nu2, work);
    h[(hi - 1, hi - 3)] = T::zero();
    apply_right(&mut h.view_mut(0, hi - 2, hi, 2), beta, nu2, work);
    if let Some(u) = u.as_deref_mut() {
        apply_right(&mut u.view_mut(0, hi - 2, n, 2), beta, nu2, work);
    }
    Ok(())
}

/// Drive an upper Hessenberg matrix to real Schur form in place.
///
/// `u`, if given, is multiplied on the right by every transform, so passing
/// the Hessenberg accumulator yields `A = U S U^T`. Every 10th step since
/// the last deflation uses an exceptional shift. A subdiagonal entry is
/// flushed when it is negligible next to its diagonal neighbours or below
/// `epsilon·‖H‖_F`. Trailing real 2×2 blocks are split by
/// [`standardize`]-style rotation, so only complex pairs remain as 2×2
/// blocks.
///
/// Returns the number of Francis steps, or `ConvergenceFailure` once
/// `max_iter` steps have not converged.
pub fn francis_qr<T: FloatScalar>(
    h: &mut DynMatrix<T>,
    mut u: Option<&mut DynMatrix<T>>,
    epsilon: T,
    max_iter: usize,
    ws: &mut ReflectorWorkspace<T>,
) -> Result<usize, LinalgError> {
    let n = h.nrows();
    ensure_square(n, h.ncols())?;
    check_matrix(u.as_deref(), n, n, "u")?;
    ws.buffers(n)?;

    // similarity transforms keep the Frobenius norm
    let small = epsilon * frobenius(h);
    let mut schedule = ShiftSchedule::default();
    let mut q = 0;
    let mut iterations = 0;
    loop {
        for i in 0..n.saturating_sub(1) {
            let sub = h[(i + 1, i)];
            if negligible(sub, h[(i, i)], h[(i + 1, i + 1)], epsilon) || sub.abs() <= small {
                h[(i + 1, i)] = T::zero();
            }
        }
        let (p, q_next) = split_hessenberg(h, q);
        if q_next != q {
            trace!("francis_qr: deflated to p={}, q={}", p, q_next);
            schedule.deflated();
        }
        q = q_next;
        if q >= n {
            break;
        }

        let hi = n - q;
        if hi - p == 2 {
            trace!("francis_qr: splitting real 2x2 block at {}", p);
            standardize(h, u.as_deref_mut(), p);
            continue;
        }

        iterations += 1;
        if iterations > max_iter {
            warn!(
                "francis_qr: no convergence after {} iterations (active block {}..{})",
                max_iter, p, hi
            );
            return Err(LinalgError::ConvergenceFailure {
                iterations: max_iter,
            });
        }
        let exceptional = schedule.next_is_exceptional();
        if exceptional {
            trace!("francis_qr: exceptional shift at iteration {}", iterations);
        }
        francis_step(h, u.as_deref_mut(), p, hi, exceptional, ws)?;
    }
    debug!("francis_qr: {}x{} converged in {} iterations", n, n, iterations);
    Ok(iterations)
}

/// Locate the active block of a symmetric tridiagonal matrix.
fn split_tridiagonal<T: FloatScalar>(t: &DynMatrix<T>, mut q: usize) -> (usize, usize) {
    let n = t.nrows();
    while q + 1 < n {
        let k = n - q - 1;
        if t[(k, k - 1)] == T::zero() {
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
    while p > 0 && t[(p, p - 1)] != T::zero() {
        p -= 1;
    }
    (p, q)
}

/// One implicit Wilkinson-shifted QR sweep on the active block `lo..hi` of
/// a symmetric tridiagonal matrix.
///
/// The first rotation comes from `(t[lo,lo] - mu, t[lo+1,lo])`; each later
/// one annihilates the bulge left below the subdiagonal by the previous
/// rotation. Rotations are applied as banded similarities and the touched
/// window is re-symmetrized from its upper triangle.
///
/// Panics unless the block has at least 2 rows.
pub fn symmetric_qr_step<T: FloatScalar>(
    t: &mut DynMatrix<T>,
    mut u: Option<&mut DynMatrix<T>>,
    lo: usize,
    hi: usize,
) {
    let n = t.nrows();
    assert!(hi <= n && hi >= lo + 2, "symmetric step needs an active block of at least 2 rows");

    let mu = wilkinson_shift(t[(hi - 2, hi - 2)], t[(hi - 1, hi - 2)], t[(hi - 1, hi - 1)]);
    let mut x = t[(lo, lo)] - mu;
    let mut y = t[(lo + 1, lo)];

    for k in lo..(hi - 1) {
        let (c, s) = givens(x, y);
        apply_tridiagonal_left(t, c, s, k, k + 1);
        apply_tridiagonal_right(t, c, s, k, k + 1);
        if k > lo {
            t[(k + 1, k - 1)] = T::zero();
            t[(k - 1, k + 1)] = T::zero();
        }
        let end = (k + 3).min(n);
        for i in (k.max(1) - 1)..end {
            for j in (i + 1)..end {
                t[(j, i)] = t[(i, j)];
            }
        }
        if let Some(u) = u.as_deref_mut() {
            givens_right(u, c, s, k, k + 1);
        }
        if k + 2 < hi {
            x = t[(k + 1, k)];
            y = t[(k + 2, k)];
        }
    }
}

/// Drive a symmetric tridiagonal matrix to diagonal form in place.
///
/// Same contract as [`francis_qr`]: `u` is multiplied on the right by every
/// rotation; the return value is the number of sweeps.
pub fn symmetric_qr<T: FloatScalar>(
    t: &mut DynMatrix<T>,
    mut u: Option<&mut DynMatrix<T>>,
    epsilon: T,
    max_iter: usize,
) -> Result<usize, LinalgError> {
    let n = t.nrows();
    ensure_square(n, t.ncols())?;
    check_matrix(u.as_deref(), n, n, "u")?;

    let mut q = 0;
    let mut iterations = 0;
    loop {
        for i in 0..n.saturating_sub(1) {
            if negligible(t[(i + 1, i)], t[(i, i)], t[(i + 1, i + 1)], epsilon) {
                t[(i + 1, i)] = T::zero();
                t[(i, i + 1)] = T::zero();
            }
        }
        let (p, q_next) = split_tridiagonal(t, q);
        if q_next != q {
            trace!("symmetric_qr: deflated to p={}, q={}", p, q_next);
        }
        q = q_next;
        if q >= n {
            break;
        }

        iterations += 1;
        if iterations > max_iter {
            warn!(
                "symmetric_qr: no convergence after {} iterations (active block {}..{})",
                max_iter,
                p,
                n - q
            );
            return Err(LinalgError::ConvergenceFailure {
                iterations: max_iter,
            });
        }
        symmetric_qr_step(t, u.as_deref_mut(), p, n - q);
    }
    debug!("symmetric_qr: {}x{} converged in {} iterations", n, n, iterations);
    Ok(iterations)
}

fn qr_in<T: FloatScalar>(
    a: &DynMatrix<T>,
    settings: &QrSettings<T>,
    ws: &mut QrWorkspace<T>,
    symmetric: bool,
) -> Result<usize, LinalgError> {
    let n = a.nrows();
    ensure_square(n, a.ncols())?;
    let QrWorkspace { h, u, reflector } = ws;
    check_matrix(h.as_ref(), n, n, "h")?;
    if settings.compute_u {
        check_matrix(u.as_ref(), n, n, "u")?;
    }
    reflector.buffers(n)?;

    let h = ensure_matrix(h, n, n, "h")?;
    h.copy_from(a);
    let mut u = if settings.compute_u {
        Some(ensure_matrix(u, n, n, "u")?)
    } else {
        None
    };
    let cap = iteration_cap(settings.max_iter, n);

    if symmetric {
        tridiagonalize(h, u.as_deref_mut(), reflector)?;
        symmetric_qr(h, u, settings.epsilon, cap)
    } else {
        hessenberg_reduce(h, u.as_deref_mut(), reflector)?;
        francis_qr(h, u, settings.epsilon, cap, reflector)
    }
}

fn into_schur<T: FloatScalar>(
    n: usize,
    ws: QrWorkspace<T>,
    compute_u: bool,
    iterations: usize,
) -> SchurForm<T> {
    SchurForm {
        s: ws.h.unwrap_or_else(|| DynMatrix::zeros(n, n, T::zero())),
        u: if compute_u { ws.u } else { None },
        iterations,
    }
}

/// Real Schur form `A = U S U^T` of a general square matrix.
///
/// ```
/// use eigenkit::DynMatrix;
/// use eigenkit::linalg::{qr_algorithm, QrSettings};
///
/// let a = DynMatrix::from_rows(2, 2, &[2.0_f64, 2.0, 3.0, -2.0]);
/// let schur = qr_algorithm(&a, &QrSettings::default()).unwrap();
/// let mut ev = schur.eigenvalues();
/// ev.as_mut_slice().sort_by(|x, y| x.partial_cmp(y).unwrap());
/// assert!((ev[0] + 10.0_f64.sqrt()).abs() < 1e-12);
/// assert!((ev[1] - 10.0_f64.sqrt()).abs() < 1e-12);
/// ```
pub fn qr_algorithm<T: FloatScalar>(
    a: &DynMatrix<T>,
    settings: &QrSettings<T>,
) -> Result<SchurForm<T>, LinalgError> {
    let mut ws = QrWorkspace::default();
    let iterations = qr_in(a, settings, &mut ws, false)?;
    Ok(into_schur(a.nrows(), ws, settings.compute_u, iterations))
}

/// [`qr_algorithm`] into caller-owned buffers; returns the step count.
///
/// The Schur form is left in `ws.h`, the transform in `ws.u`.
pub fn qr_algorithm_in<T: FloatScalar>(
    a: &DynMatrix<T>,
    settings: &QrSettings<T>,
    ws: &mut QrWorkspace<T>,
) -> Result<usize, LinalgError> {
    qr_in(a, settings, ws, false)
}

/// Diagonalization `A = U D U^T` of a symmetric matrix.
///
/// Only the lower triangle of `a` is read.
pub fn qr_algorithm_symmetric<T: FloatScalar>(
    a: &DynMatrix<T>,
    settings: &QrSettings<T>,
) -> Result<SchurForm<T>, LinalgError> {
    let mut ws = QrWorkspace::default();
    let iterations = qr_in(a, settings, &mut ws, true)?;
    Ok(into_schur(a.nrows(), ws, settings.compute_u, iterations))
}

/// [`qr_algorithm_symmetric`] into caller-owned buffers.
pub fn qr_algorithm_symmetric_in<T: FloatScalar>(
    a: &DynMatrix<T>,
    settings: &QrSettings<T>,
    ws: &mut QrWorkspace<T>,
) -> Result<usize, LinalgError> {
    qr_in(a, settings, ws, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-9;

    fn assert_near(a: f64, b: f64, tol: f64, msg: &str) {
        assert!((a - b).abs() < tol, "{}: {} vs {} (diff {})", msg, a, b, (a - b).abs());
    }

    fn sorted(v: &DynVector<f64>) -> Vec<f64> {
        let mut out: Vec<f64> = v.iter().copied().collect();
        out.sort_by(|a, b| a.partial_cmp(b).unwrap());
        out
    }

    fn check_similarity(a: &DynMatrix<f64>, schur: &SchurForm<f64>) {
        let u = schur.u.as_ref().expect("u requested");
        let back = &(u * &schur.s) * &u.transpose();
        assert!(
            (&back - a).max_abs() < 1e-8,
            "U S U^T differs from A:\n{}",
            &back - a
        );
        let utu = &u.transpose() * u;
        assert!((&utu - &DynMatrix::eye(a.nrows(), 0.0)).max_abs() < 1e-10);
    }

    /// Quasi-triangular: zero below the subdiagonal and no two consecutive
    /// nonzero subdiagonal entries.
    fn assert_quasi_triangular(s: &DynMatrix<f64>) {
        let n = s.nrows();
        assert!(s.is_upper_hessenberg(0.0));
        for i in 1..n.saturating_sub(1) {
            assert!(
                s[(i, i - 1)] == 0.0 || s[(i + 1, i)] == 0.0,
                "overlapping 2x2 blocks at {}",
                i
            );
        }
    }

    fn example_4x4() -> DynMatrix<f64> {
        DynMatrix::from_rows(
            4,
            4,
            &[
                1.0, 2.0, 3.0, 4.0, 4.0, 4.0, 4.0, 4.0, 0.0, 1.0, -1.0, 1.0, 0.0, 0.0, 2.0, 3.0,
            ],
        )
    }

    #[test]
    fn general_4x4_real_spectrum() {
        let a = example_4x4();
        let schur = qr_algorithm(&a, &QrSettings::default()).unwrap();
        assert_quasi_triangular(&schur.s);
        check_similarity(&a, &schur);
        // all eigenvalues real: strictly upper triangular result
        for i in 1..4 {
            assert_eq!(schur.s[(i, i - 1)], 0.0);
        }
        let ev = sorted(&schur.eigenvalues());
        let expected = [-1.561553, -0.741657, 2.561553, 6.741657];
        for (got, want) in ev.iter().zip(&expected) {
            assert_near(*got, *want, 1e-5, "eigenvalue");
        }
    }

    #[test]
    fn complex_pair_stays_as_block() {
        // rotation by 90 degrees embedded with a real eigenvalue 2
        let a = DynMatrix::from_rows(3, 3, &[0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 2.0]);
        let schur = qr_algorithm(&a, &QrSettings::default()).unwrap();
        assert_quasi_triangular(&schur.s);
        check_similarity(&a, &schur);
        let ev = sorted(&schur.eigenvalues());
        assert_near(ev[0], 0.0, TOL, "real part of pair");
        assert_near(ev[1], 0.0, TOL, "real part of pair");
        assert_near(ev[2], 2.0, TOL, "real eigenvalue");
    }

    #[test]
    fn permutation_needs_exceptional_shift() {
        // cyclic shift: eigenvalues are the 5th roots of unity
        let n = 5;
        let a = DynMatrix::from_fn(n, n, |i, j| if i == (j + 1) % n { 1.0 } else { 0.0 });
        let schur = qr_algorithm(&a, &QrSettings::default()).unwrap();
        assert_quasi_triangular(&schur.s);
        check_similarity(&a, &schur);
        let ev = sorted(&schur.eigenvalues());
        assert_near(ev[4], 1.0, TOL, "real root");
    }

    #[test]
    fn longer_cycles_converge() {
        for n in [8, 12] {
            let a = DynMatrix::from_fn(n, n, |i, j| if i == (j + 1) % n { 1.0 } else { 0.0 });
            let schur = qr_algorithm(&a, &QrSettings::default()).unwrap();
            assert_quasi_triangular(&schur.s);
            check_similarity(&a, &schur);
            let ev = sorted(&schur.eigenvalues());
            assert_near(ev[n - 1], 1.0, TOL, "real root");
            assert_near(ev[0], -1.0, TOL, "real root");
        }
    }

    #[test]
    fn exceptional_shift_counter_restarts_on_deflation() {
        let mut schedule = ShiftSchedule::default();
        let fired: Vec<bool> = (0..10).map(|_| schedule.next_is_exceptional()).collect();
        assert_eq!(fired.iter().filter(|&&f| f).count(), 1);
        assert!(fired[9]);

        for _ in 0..7 {
            assert!(!schedule.next_is_exceptional());
        }
        schedule.deflated();
        for _ in 0..9 {
            assert!(!schedule.next_is_exceptional());
        }
        assert!(schedule.next_is_exceptional());
    }

    #[test]
    fn graded_matrix_deflates_against_norm() {
        // rank one with entries spanning 80 orders of magnitude
        let n = 40;
        let a = DynMatrix::from_fn(n, n, |i, j| 10f64.powi(-((i + j) as i32)));
        let schur = qr_algorithm(&a, &QrSettings::default()).unwrap();
        assert_quasi_triangular(&schur.s);
        let u = schur.u.as_ref().unwrap();
        let back = &(u * &schur.s) * &u.transpose();
        assert!((&back - &a).max_abs() < 1e-12);
        let ev = sorted(&schur.eigenvalues());
        let trace: f64 = (0..n).map(|i| a[(i, i)]).sum();
        assert_near(ev[n - 1], trace, 1e-12, "dominant eigenvalue");
    }

    #[test]
    fn real_2x2_is_triangularized() {
        let a = DynMatrix::from_rows(2, 2, &[2.0, 2.0, 3.0, -2.0]);
        let schur = qr_algorithm(&a, &QrSettings::default()).unwrap();
        assert_eq!(schur.s[(1, 0)], 0.0);
        check_similarity(&a, &schur);
        assert_eq!(schur.iterations, 0);
    }

    #[test]
    fn symmetric_matches_general() {
        let b = DynMatrix::from_fn(6, 6, |i, j| ((i * 5 + j * 3) % 7) as f64 - 3.0);
        let a = &b + &b.transpose();
        let sym = qr_algorithm_symmetric(&a, &QrSettings::default()).unwrap();
        let gen = qr_algorithm(&a, &QrSettings::default()).unwrap();
        check_similarity(&a, &sym);
        check_similarity(&a, &gen);
        for i in 0..5 {
            assert_eq!(sym.s[(i + 1, i)], 0.0);
            assert_eq!(sym.s[(i, i + 1)], 0.0);
        }
        for (x, y) in sorted(&sym.eigenvalues()).iter().zip(sorted(&gen.eigenvalues())) {
            assert_near(*x, y, 1e-8, "sym vs general");
        }
    }

    #[test]
    fn without_accumulator() {
        let a = example_4x4();
        let settings = QrSettings {
            compute_u: false,
            ..QrSettings::default()
        };
        let schur = qr_algorithm(&a, &settings).unwrap();
        assert!(schur.u.is_none());
        let with_u = qr_algorithm(&a, &QrSettings::default()).unwrap();
        assert_eq!(schur.s, with_u.s);
    }

    #[test]
    fn iteration_cap_reports_failure() {
        let a = example_4x4();
        let settings = QrSettings {
            max_iter: Some(0),
            ..QrSettings::default()
        };
        assert_eq!(
            qr_algorithm(&a, &settings).unwrap_err(),
            LinalgError::ConvergenceFailure { iterations: 0 }
        );
    }

    #[test]
    fn trivial_sizes() {
        let one = DynMatrix::from_rows(1, 1, &[7.0]);
        let schur = qr_algorithm(&one, &QrSettings::default()).unwrap();
        assert_eq!(schur.eigenvalues().as_slice(), &[7.0]);
        assert_eq!(schur.u, Some(DynMatrix::eye(1, 0.0)));

        let empty = DynMatrix::zeros(0, 0, 0.0_f64);
        let schur = qr_algorithm_symmetric(&empty, &QrSettings::default()).unwrap();
        assert!(schur.eigenvalues().is_empty());
    }

    #[test]
    fn workspace_is_reused() {
        let a = example_4x4();
        let mut ws = QrWorkspace::default();
        let settings = QrSettings::default();
        let first = qr_algorithm_in(&a, &settings, &mut ws).unwrap();
        let s1 = ws.h.clone();
        let second = qr_algorithm_in(&a, &settings, &mut ws).unwrap();
        assert_eq!(first, second);
        assert_eq!(ws.h, s1);

        let bigger = DynMatrix::eye(5, 0.0);
        assert!(matches!(
            qr_algorithm_in(&bigger, &settings, &mut ws),
            Err(LinalgError::WorkspaceMismatch { buffer: "h", .. })
        ));
    }

    #[test]
    fn rejects_non_square() {
        let a = DynMatrix::zeros(2, 3, 0.0_f64);
        assert_eq!(
            qr_algorithm(&a, &QrSettings::default()).unwrap_err(),
            LinalgError::NotSquare { rows: 2, cols: 3 }
        );
    }
}

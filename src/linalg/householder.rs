//! Householder reflectors `P = I - beta * nu * nu^T`.
//!
//! The reflector matrix is never formed; [`apply_left`] and [`apply_right`]
//! act on a (view of a) matrix with two matrix-vector products.

use crate::traits::{FloatScalar, MatrixMut};

/// Build a unit-first reflector for `x`.
///
/// Writes `nu[..x.len()]` (with `nu[0] = 1`) and returns `beta` such that
/// `(I - beta * nu * nu^T) * x = (±‖x‖, 0, …, 0)`.
///
/// When `x[1..]` is exactly zero the reflector is the identity and `beta = 0`.
///
/// ```
/// use eigenkit::linalg::householder::reflector;
///
/// let x = [3.0_f64, 4.0];
/// let mut nu = [0.0; 2];
/// let beta = reflector(&x, &mut nu);
/// assert_eq!(nu[0], 1.0);
/// // P x = (5, 0): the first component of x - beta * (nu . x) * nu
/// let d = nu[0] * x[0] + nu[1] * x[1];
/// assert!((x[0] - beta * d * nu[0] - 5.0).abs() < 1e-12);
/// assert!((x[1] - beta * d * nu[1]).abs() < 1e-12);
/// ```
pub fn reflector<T: FloatScalar>(x: &[T], nu: &mut [T]) -> T {
    let m = x.len();
    assert!(nu.len() >= m, "reflector buffer too short");
    if m == 0 {
        return T::zero();
    }

    nu[0] = T::one();
    let mut sigma = T::zero();
    for i in 1..m {
        nu[i] = x[i];
        sigma = sigma + x[i] * x[i];
    }
    if sigma == T::zero() {
        return T::zero();
    }

    let x0 = x[0];
    let mu = (x0 * x0 + sigma).sqrt();
    // Avoid cancellation in x0 - mu when x0 > 0.
    let nu0 = if x0 <= T::zero() {
        x0 - mu
    } else {
        -sigma / (x0 + mu)
    };
    let nu0_sq = nu0 * nu0;
    let beta = T::two() * nu0_sq / (sigma + nu0_sq);
    for v in &mut nu[1..m] {
        *v = *v / nu0;
    }
    beta
}

/// `A ← (I - beta * nu * nu^T) * A`.
///
/// `nu` must have `A.nrows()` entries; `work` at least `A.ncols()`.
pub fn apply_left<T: FloatScalar>(
    a: &mut impl MatrixMut<T>,
    beta: T,
    nu: &[T],
    work: &mut [T],
) {
    let (m, n) = (a.nrows(), a.ncols());
    assert!(nu.len() >= m && work.len() >= n, "householder buffers too short");
    if beta == T::zero() || m == 0 {
        return;
    }
    let nu = &nu[..m];

    // w^T = beta * nu^T A
    for (j, w) in work[..n].iter_mut().enumerate() {
        let col = a.col_as_slice(j, 0);
        let dot = col.iter().zip(nu).fold(T::zero(), |acc, (&c, &v)| acc + c * v);
        *w = beta * dot;
    }
    // A -= nu w^T
    for (j, &w) in work[..n].iter().enumerate() {
        if w == T::zero() {
            continue;
        }
        let col = a.col_as_mut_slice(j, 0);
        for (c, &v) in col.iter_mut().zip(nu) {
            *c = *c - v * w;
        }
    }
}

/// `A ← A * (I - beta * nu * nu^T)`.
///
/// `nu` must have `A.ncols()` entries; `work` at least `A.nrows()`.
pub fn apply_right<T: FloatScalar>(
    a: &mut impl MatrixMut<T>,
    beta: T,
    nu: &[T],
    work: &mut [T],
) {
    let (m, n) = (a.nrows(), a.ncols());
    assert!(nu.len() >= n && work.len() >= m, "householder buffers too short");
    if beta == T::zero() || n == 0 {
        return;
    }
    let w = &mut work[..m];

    // w = beta * A nu
    for x in w.iter_mut() {
        *x = T::zero();
    }
    for (j, &v) in nu[..n].iter().enumerate() {
        if v == T::zero() {
            continue;
        }
        for (x, &c) in w.iter_mut().zip(a.col_as_slice(j, 0)) {
            *x = *x + c * v;
        }
    }
    for x in w.iter_mut() {
        *x = *x * beta;
    }
    // A -= w nu^T
    for (j, &v) in nu[..n].iter().enumerate() {
        if v == T::zero() {
            continue;
        }
        let col = a.col_as_mut_slice(j, 0);
        for (c, &x) in col.iter_mut().zip(w.iter()) {
            *c = *c - x * v;
        }
    }
}

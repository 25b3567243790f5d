//! Eigenvalues and eigenvectors of square matrices.
//!
//! The general path reads eigenvalues off the real Schur form `A = U S U^T`
//! and recovers each real eigenvector by solving the leading block of
//! `(S - λI) y = 0` with `y[k]` pinned to the solve's overflow scale, then
//! mapping `v = U y`. The symmetric path takes eigenvalues from the diagonal
//! of `S` and eigenvectors straight from `U`. Both finish by sorting eigenpairs by `|λ|`, largest first.
//!
//! Complex conjugate pairs are reported by their real part in both slots;
//! the eigenvectors in those slots are not meaningful.

use core::cmp::Ordering;

use log::debug;

use crate::dynmatrix::{frobenius, normalize_slice, DynMatrix, DynVector};
use crate::linalg::back_substitution::solve_quasi_upper_triangular_in_place;
use crate::linalg::qr_algorithm::{
    qr_algorithm, qr_algorithm_in, qr_algorithm_symmetric, qr_algorithm_symmetric_in,
    schur_eigenvalues_into, QrSettings, QrWorkspace,
};
use crate::linalg::workspace::{check_matrix, check_vector, ensure_matrix, ensure_vector};
use crate::linalg::{ensure_square, LinalgError};
use crate::traits::{FloatScalar, MatrixMut, MatrixRef};

/// Options for [`eigensystem`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EigenSettings<T> {
    pub compute_eigenvectors: bool,
    /// Take the tridiagonal path. Only the lower triangle is read.
    pub symmetric: bool,
    /// Relative deflation tolerance.
    pub epsilon: T,
    /// Cap on implicit steps; `None` means `30·n`.
    pub max_iter: Option<usize>,
}

impl<T: FloatScalar> Default for EigenSettings<T> {
    fn default() -> Self {
        Self {
            compute_eigenvectors: true,
            symmetric: false,
            epsilon: T::epsilon(),
            max_iter: None,
        }
    }
}

impl<T: FloatScalar> EigenSettings<T> {
    fn qr(&self) -> QrSettings<T> {
        QrSettings {
            epsilon: self.epsilon,
            max_iter: self.max_iter,
            compute_u: self.compute_eigenvectors,
        }
    }
}

/// Buffers for [`eigensystem_in`].
///
/// On success `eigenvalues` (and `eigenvectors`, if requested) hold the
/// sorted result; `qr` keeps the Schur form it came from.
#[derive(Debug, Clone)]
pub struct EigenWorkspace<T> {
    pub qr: QrWorkspace<T>,
    /// Right-hand side / solution of the eigenvector back-substitution.
    pub y: Option<DynVector<T>>,
    pub eigenvalues: Option<DynVector<T>>,
    pub eigenvectors: Option<DynMatrix<T>>,
    /// Sort permutation of the last call.
    pub order: Vec<usize>,
}

impl<T> Default for EigenWorkspace<T> {
    fn default() -> Self {
        Self {
            qr: QrWorkspace::default(),
            y: None,
            eigenvalues: None,
            eigenvectors: None,
            order: Vec::new(),
        }
    }
}

/// Eigenpairs sorted by descending `|λ|`.
#[derive(Debug, Clone)]
pub struct Eigen<T> {
    pub eigenvalues: DynVector<T>,
    /// Unit-norm eigenvectors as columns, matching `eigenvalues`.
    pub eigenvectors: Option<DynMatrix<T>>,
}

/// Recover eigenvector `k` of `A = U S U^T` into `out`.
fn schur_eigenvector<T: FloatScalar>(
    s: &DynMatrix<T>,
    u: &DynMatrix<T>,
    k: usize,
    lambda: T,
    pivot_floor: T,
    y: &mut [T],
    out: &mut [T],
) -> Result<(), LinalgError> {
    for (yi, &sik) in y[..k].iter_mut().zip(s.col_as_slice(k, 0)) {
        *yi = -sik;
    }
    let scale =
        solve_quasi_upper_triangular_in_place(&s.view(0, 0, k, k), lambda, &mut y[..k], pivot_floor)?;
    y[k] = scale;

    // bring y to max-abs 1 so U y cannot overflow
    let ymax = y[..=k].iter().fold(T::zero(), |m, v| m.max(v.abs()));
    if ymax > T::zero() {
        for v in y[..=k].iter_mut() {
            *v = *v / ymax;
        }
    }

    for (i, o) in out.iter_mut().enumerate() {
        let mut acc = T::zero();
        for (j, &yj) in y[..=k].iter().enumerate() {
            acc = acc + u[(i, j)] * yj;
        }
        *o = acc;
    }
    normalize_slice(out);
    Ok(())
}

/// Stable sort of `0..n` by descending `|values[i]|`.
fn sort_order<T: FloatScalar>(values: &[T], order: &mut Vec<usize>) {
    order.clear();
    order.extend(0..values.len());
    order.sort_by(|&i, &j| {
        values[j]
            .abs()
            .partial_cmp(&values[i].abs())
            .unwrap_or(Ordering::Equal)
    });
}

/// [`eigensystem`] into caller-owned buffers; returns the step count.
pub fn eigensystem_in<T: FloatScalar>(
    a: &DynMatrix<T>,
    settings: &EigenSettings<T>,
    ws: &mut EigenWorkspace<T>,
) -> Result<usize, LinalgError> {
    let n = a.nrows();
    ensure_square(n, a.ncols())?;
    let EigenWorkspace {
        qr,
        y,
        eigenvalues,
        eigenvectors,
        order,
    } = ws;
    check_vector(eigenvalues.as_ref(), n, "eigenvalues")?;
    if settings.compute_eigenvectors {
        check_matrix(eigenvectors.as_ref(), n, n, "eigenvectors")?;
        check_vector(y.as_ref(), n, "y")?;
    }

    let iterations = if settings.symmetric {
        qr_algorithm_symmetric_in(a, &settings.qr(), qr)?
    } else {
        qr_algorithm_in(a, &settings.qr(), qr)?
    };

    let QrWorkspace { h, u, .. } = qr;
    let s = &*ensure_matrix(h, n, n, "h")?;
    let values = ensure_vector(eigenvalues, n, "eigenvalues")?;
    schur_eigenvalues_into(s, values.as_mut_slice());

    if settings.compute_eigenvectors {
        let u = &*ensure_matrix(u, n, n, "u")?;
        let vectors = ensure_matrix(eigenvectors, n, n, "eigenvectors")?;
        if settings.symmetric {
            vectors.copy_from(u);
        } else {
            let y = ensure_vector(y, n, "y")?.as_mut_slice();
            let pivot_floor = (settings.epsilon * frobenius(s)).max(T::min_positive_value());
            for k in 0..n {
                schur_eigenvector(
                    s,
                    u,
                    k,
                    values[k],
                    pivot_floor,
                    y,
                    vectors.col_as_mut_slice(k, 0),
                )?;
            }
        }
        sort_order(values.as_slice(), order);
        vectors.permute_cols(order);
    } else {
        sort_order(values.as_slice(), order);
    }

    let sorted: Vec<T> = order.iter().map(|&i| values[i]).collect();
    values.as_mut_slice().copy_from_slice(&sorted);
    debug!(
        "eigensystem: {}x{} ({}) in {} iterations",
        n,
        n,
        if settings.symmetric { "symmetric" } else { "general" },
        iterations
    );
    Ok(iterations)
}

/// Eigenvalues and (optionally) unit eigenvectors of a square matrix,
/// sorted by descending magnitude.
///
/// ```
/// use eigenkit::DynMatrix;
/// use eigenkit::linalg::{eigensystem, EigenSettings};
///
/// let a = DynMatrix::from_rows(2, 2, &[2.0_f64, 1.0, 1.0, 2.0]);
/// let eig = eigensystem(&a, &EigenSettings::default()).unwrap();
/// assert!((eig.eigenvalues[0] - 3.0).abs() < 1e-12);
/// assert!((eig.eigenvalues[1] - 1.0).abs() < 1e-12);
///
/// let v = eig.eigenvectors.unwrap().col(0);
/// let av = &a * &v;
/// assert!((&av - &(&v * 3.0)).norm() < 1e-12);
/// ```
pub fn eigensystem<T: FloatScalar>(
    a: &DynMatrix<T>,
    settings: &EigenSettings<T>,
) -> Result<Eigen<T>, LinalgError> {
    let n = a.nrows();
    let mut ws = EigenWorkspace::default();
    eigensystem_in(a, settings, &mut ws)?;
    Ok(Eigen {
        eigenvalues: ws
            .eigenvalues
            .unwrap_or_else(|| DynVector::zeros(n, T::zero())),
        eigenvectors: if settings.compute_eigenvectors {
            ws.eigenvectors
        } else {
            None
        },
    })
}

/// Shift the spectrum of `a` so that it is positive definite.
///
/// Computes `A = U S U^T`, replaces every diagonal entry `s < delta` of `S`
/// by `delta - s` and returns the rebuilt `U S U^T`. A Newton-type
/// optimizer uses this to turn an indefinite Hessian into a descent
/// direction metric.
///
/// ```
/// use eigenkit::DynMatrix;
/// use eigenkit::linalg::{force_positive_definite, EigenSettings};
///
/// let h = DynMatrix::from_rows(2, 2, &[1.0_f64, 2.0, 2.0, 1.0]); // eigenvalues 3, -1
/// let settings = EigenSettings { symmetric: true, ..EigenSettings::default() };
/// let p = force_positive_definite(&h, 1e-3, &settings).unwrap();
/// let ev = p.eigenvalues().unwrap();
/// assert!((ev[0] - 3.0).abs() < 1e-10);
/// assert!((ev[1] - 1.001).abs() < 1e-10);
/// ```
pub fn force_positive_definite<T: FloatScalar>(
    a: &DynMatrix<T>,
    delta: T,
    settings: &EigenSettings<T>,
) -> Result<DynMatrix<T>, LinalgError> {
    let qr_settings = QrSettings {
        compute_u: true,
        ..settings.qr()
    };
    let schur = if settings.symmetric {
        qr_algorithm_symmetric(a, &qr_settings)?
    } else {
        qr_algorithm(a, &qr_settings)?
    };
    let mut s = schur.s;
    for i in 0..s.nrows() {
        if s[(i, i)] < delta {
            s[(i, i)] = delta - s[(i, i)];
        }
    }
    let u = schur
        .u
        .unwrap_or_else(|| DynMatrix::eye(a.nrows(), T::zero()));
    Ok(&(&u * &s) * &u.transpose())
}

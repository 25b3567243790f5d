use crate::dynmatrix::DynMatrix;
use crate::linalg::householder::{apply_left, apply_right, reflector};
use crate::linalg::workspace::{check_matrix, ReflectorWorkspace};
use crate::linalg::{ensure_square, LinalgError};
use crate::traits::{FloatScalar, MatrixMut, MatrixRef};

/// Upper Hessenberg form `A = U H U^T`.
#[derive(Debug, Clone)]
pub struct Hessenberg<T> {
    /// Upper Hessenberg matrix (zero below the first subdiagonal).
    pub h: DynMatrix<T>,
    /// Orthogonal accumulator.
    pub u: DynMatrix<T>,
}

/// Reduce a square matrix to upper Hessenberg form in place.
///
/// Column `k` is reduced by a reflector built from `h[k+1.., k]`, applied as
/// a similarity transform (rows `k+1..` from the left, columns `k+1..` from
/// the right). Entries below the subdiagonal are then set to exactly zero.
///
/// If `u` is given it is overwritten with the accumulated orthogonal
/// transform, so that `A = U H U^T` for the original `A`. Matrices with
/// `n <= 2` are already Hessenberg and are left unchanged.
pub fn hessenberg_reduce<T: FloatScalar>(
    h: &mut DynMatrix<T>,
    mut u: Option<&mut DynMatrix<T>>,
    ws: &mut ReflectorWorkspace<T>,
) -> Result<(), LinalgError> {
    let n = h.nrows();
    ensure_square(n, h.ncols())?;
    check_matrix(u.as_deref(), n, n, "u")?;
    let (x, nu, work) = ws.buffers(n)?;

    if let Some(u) = u.as_deref_mut() {
        u.set_identity();
    }

    for k in 0..n.saturating_sub(2) {
        let m = n - k - 1;
        x[..m].copy_from_slice(h.col_as_slice(k, k + 1));
        let beta = reflector(&x[..m], &mut nu[..m]);
        if beta == T::zero() {
            continue;
        }
        let nu = &nu[..m];

        apply_left(&mut h.view_mut(k + 1, k, m, n - k), beta, nu, work);
        apply_right(&mut h.view_mut(0, k + 1, n, m), beta, nu, work);
        for v in h.col_as_mut_slice(k, k + 2) {
            *v = T::zero();
        }
        if let Some(u) = u.as_deref_mut() {
            apply_right(&mut u.view_mut(0, k + 1, n, m), beta, nu, work);
        }
    }
    log::trace!("hessenberg: reduced {}x{} matrix", n, n);
    Ok(())
}

/// Hessenberg decomposition `A = U H U^T`.
///
/// ```
/// use eigenkit::DynMatrix;
/// use eigenkit::linalg::hessenberg;
///
/// let a = DynMatrix::from_rows(3, 3, &[4.0_f64, 1.0, -2.0, 1.0, 2.0, 0.0, -2.0, 0.0, 3.0]);
/// let hs = hessenberg(&a).unwrap();
/// assert_eq!(hs.h[(2, 0)], 0.0);
/// let back = &(&hs.u * &hs.h) * &hs.u.transpose();
/// assert!((&back - &a).frobenius_norm() < 1e-12);
/// ```
pub fn hessenberg<T: FloatScalar>(a: &DynMatrix<T>) -> Result<Hessenberg<T>, LinalgError> {
    ensure_square(a.nrows(), a.ncols())?;
    let n = a.nrows();
    let mut h = a.clone();
    let mut u = DynMatrix::eye(n, T::zero());
    hessenberg_reduce(&mut h, Some(&mut u), &mut ReflectorWorkspace::default())?;
    Ok(Hessenberg { h, u })
}

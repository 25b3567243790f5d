use crate::dynmatrix::{norm2, DynMatrix};
use crate::linalg::householder::{apply_right, reflector};
use crate::linalg::workspace::{check_matrix, ReflectorWorkspace};
use crate::linalg::{ensure_square, LinalgError};
use crate::traits::{FloatScalar, MatrixRef};

/// Symmetric tridiagonal form `A = U T U^T`.
#[derive(Debug, Clone)]
pub struct Tridiagonal<T> {
    /// Symmetric tridiagonal matrix.
    pub t: DynMatrix<T>,
    /// Orthogonal accumulator.
    pub u: DynMatrix<T>,
}

/// Copy `a[j, k]` into `a[k, j]` for `j > k`.
fn mirror_column<T: FloatScalar>(a: &mut DynMatrix<T>, k: usize) {
    for j in (k + 1)..a.nrows() {
        a[(k, j)] = a[(j, k)];
    }
}

/// Reduce a symmetric matrix to tridiagonal form in place.
///
/// Only the lower triangle of `a` is read; on return both triangles hold
/// the symmetric tridiagonal result. Each step applies the reflector for
/// `a[k+1.., k]` to the trailing block as a symmetric rank-2 update
///
/// ```text
/// p = beta·A22·nu,  w = p - (beta·p·nu / 2)·nu,  A22 ← A22 - nu·w^T - w·nu^T
/// ```
///
/// and sets the new off-diagonal pair to `‖a[k+1.., k]‖`.
///
/// If `u` is given it is overwritten with the accumulated orthogonal
/// transform (`A = U T U^T`).
pub fn tridiagonalize<T: FloatScalar>(
    a: &mut DynMatrix<T>,
    mut u: Option<&mut DynMatrix<T>>,
    ws: &mut ReflectorWorkspace<T>,
) -> Result<(), LinalgError> {
    let n = a.nrows();
    ensure_square(n, a.ncols())?;
    check_matrix(u.as_deref(), n, n, "u")?;
    let (x, nu, work) = ws.buffers(n)?;

    if let Some(u) = u.as_deref_mut() {
        u.set_identity();
    }

    for k in 0..n.saturating_sub(2) {
        let m = n - k - 1;
        x[..m].copy_from_slice(a.col_as_slice(k, k + 1));
        let beta = reflector(&x[..m], &mut nu[..m]);
        if beta == T::zero() {
            mirror_column(a, k);
            continue;
        }
        let nu = &nu[..m];
        let o = k + 1;

        // p = beta * A22 * nu from the lower triangle
        let p = &mut work[..m];
        for v in p.iter_mut() {
            *v = T::zero();
        }
        for j in 0..m {
            for i in j..m {
                let aij = a[(o + i, o + j)];
                p[i] = p[i] + aij * nu[j];
                if i != j {
                    p[j] = p[j] + aij * nu[i];
                }
            }
        }
        let mut pnu = T::zero();
        for i in 0..m {
            p[i] = p[i] * beta;
            pnu = pnu + p[i] * nu[i];
        }
        let t = beta * pnu * T::half();
        // w overwrites p
        for i in 0..m {
            p[i] = p[i] - t * nu[i];
        }
        let w = &*p;

        for j in 0..m {
            for i in j..m {
                let v = a[(o + i, o + j)] - (nu[i] * w[j] + nu[j] * w[i]);
                a[(o + i, o + j)] = v;
                a[(o + j, o + i)] = v;
            }
        }

        let norm = norm2(&x[..m]);
        a[(k + 1, k)] = norm;
        a[(k, k + 1)] = norm;
        for j in (k + 2)..n {
            a[(k, j)] = T::zero();
            a[(j, k)] = T::zero();
        }

        if let Some(u) = u.as_deref_mut() {
            apply_right(&mut u.view_mut(0, o, n, m), beta, nu, work);
        }
    }
    if n >= 2 {
        mirror_column(a, n - 2);
    }
    log::trace!("tridiagonalize: reduced {}x{} matrix", n, n);
    Ok(())
}

/// Tridiagonal decomposition `A = U T U^T` of a symmetric matrix.
///
/// ```
/// use eigenkit::DynMatrix;
/// use eigenkit::linalg::tridiagonal;
///
/// let a = DynMatrix::from_rows(3, 3, &[4.0_f64, 1.0, -2.0, 1.0, 2.0, 0.0, -2.0, 0.0, 3.0]);
/// let td = tridiagonal(&a).unwrap();
/// assert_eq!(td.t[(2, 0)], 0.0);
/// assert_eq!(td.t[(0, 2)], 0.0);
/// let back = &(&td.u * &td.t) * &td.u.transpose();
/// assert!((&back - &a).frobenius_norm() < 1e-12);
/// ```
pub fn tridiagonal<T: FloatScalar>(a: &DynMatrix<T>) -> Result<Tridiagonal<T>, LinalgError> {
    ensure_square(a.nrows(), a.ncols())?;
    let n = a.nrows();
    let mut t = a.clone();
    let mut u = DynMatrix::eye(n, T::zero());
    tridiagonalize(&mut t, Some(&mut u), &mut ReflectorWorkspace::default())?;
    Ok(Tridiagonal { t, u })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-10;

    fn symmetric(n: usize) -> DynMatrix<f64> {
        let a = DynMatrix::from_fn(n, n, |i, j| ((3 * i + 5 * j) % 7) as f64 - 3.0);
        &a + &a.transpose()
    }

    fn assert_tridiagonal(t: &DynMatrix<f64>) {
        let n = t.nrows();
        for i in 0..n {
            for j in 0..n {
                if i > j + 1 || j > i + 1 {
                    assert_eq!(t[(i, j)], 0.0, "T[({},{})] outside band", i, j);
                }
            }
        }
        assert!(t.is_symmetric(0.0), "not symmetric:\n{}", t);
    }

    fn check_decomposition(orig: &DynMatrix<f64>, td: &Tridiagonal<f64>) {
        assert_tridiagonal(&td.t);
        let back = &(&td.u * &td.t) * &td.u.transpose();
        let n = orig.nrows();
        for i in 0..n {
            for j in 0..n {
                assert!(
                    (back[(i, j)] - orig[(i, j)]).abs() < TOL,
                    "UTU^T[({},{})] = {}, A = {}",
                    i,
                    j,
                    back[(i, j)],
                    orig[(i, j)]
                );
            }
        }
    }

    #[test]
    fn tridiagonal_5x5() {
        let a = symmetric(5);
        check_decomposition(&a, &tridiagonal(&a).unwrap());
    }

    #[test]
    fn tridiagonal_8x8() {
        let a = symmetric(8);
        check_decomposition(&a, &tridiagonal(&a).unwrap());
    }

    #[test]
    fn reads_only_lower_triangle() {
        let a = symmetric(4);
        let mut lower = a.clone();
        for j in 1..4 {
            for i in 0..j {
                lower[(i, j)] = 1e6;
            }
        }
        let full = tridiagonal(&a).unwrap();
        let from_lower = tridiagonal(&lower).unwrap();
        assert!((&full.t - &from_lower.t).max_abs() < TOL);
        assert!((&full.u - &from_lower.u).max_abs() < TOL);
    }

    #[test]
    fn diagonal_input_is_fixed_point() {
        let a = DynMatrix::from_diagonal(&[3.0, -1.0, 2.0, 5.0]);
        let td = tridiagonal(&a).unwrap();
        assert_eq!(td.t, a);
        assert_eq!(td.u, DynMatrix::eye(4, 0.0));
    }

    #[test]
    fn accumulator_mismatch() {
        let mut a = symmetric(3);
        let mut u = DynMatrix::zeros(3, 2, 0.0);
        assert_eq!(
            tridiagonalize(&mut a, Some(&mut u), &mut ReflectorWorkspace::default()).unwrap_err(),
            LinalgError::WorkspaceMismatch {
                buffer: "u",
                expected: (3, 3),
                got: (3, 2),
            }
        );
    }
}

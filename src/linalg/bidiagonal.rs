use crate::dynmatrix::DynMatrix;
use crate::linalg::householder::{apply_left, apply_right, reflector};
use crate::linalg::workspace::{check_matrix, ReflectorWorkspace};
use crate::linalg::LinalgError;
use crate::traits::{FloatScalar, MatrixMut, MatrixRef};

/// Upper bidiagonal form `A = U B V^T` of an `m x n` matrix, `m >= n`.
#[derive(Debug, Clone)]
pub struct Bidiagonal<T> {
    /// `m x n`, nonzero only on the diagonal and first superdiagonal.
    pub b: DynMatrix<T>,
    /// `m x m` orthogonal.
    pub u: DynMatrix<T>,
    /// `n x n` orthogonal.
    pub v: DynMatrix<T>,
}

/// Fail unless the matrix is at least as tall as it is wide.
pub(crate) fn ensure_tall(rows: usize, cols: usize) -> Result<(), LinalgError> {
    if rows < cols {
        return Err(LinalgError::DimensionMismatch {
            expected: cols,
            got: rows,
        });
    }
    Ok(())
}

/// Reduce an `m x n` matrix (`m >= n`) to upper bidiagonal form in place.
///
/// Alternates a column reflector (annihilating `a[j+1.., j]`, applied from
/// the left) with a row reflector (annihilating `a[j, j+2..]`, applied from
/// the right). Annihilated entries are set to exactly zero.
///
/// `u` (`m x m`) and `v` (`n x n`), when given, are overwritten with the
/// accumulated transforms so that `A = U B V^T`. The reflector workspace is
/// sized by `m`. Wide matrices fail with `DimensionMismatch`: transpose
/// first.
pub fn bidiagonalize<T: FloatScalar>(
    a: &mut DynMatrix<T>,
    mut u: Option<&mut DynMatrix<T>>,
    mut v: Option<&mut DynMatrix<T>>,
    ws: &mut ReflectorWorkspace<T>,
) -> Result<(), LinalgError> {
    let (m, n) = a.shape();
    ensure_tall(m, n)?;
    check_matrix(u.as_deref(), m, m, "u")?;
    check_matrix(v.as_deref(), n, n, "v")?;
    let (x, nu, work) = ws.buffers(m)?;

    if let Some(u) = u.as_deref_mut() {
        u.set_identity();
    }
    if let Some(v) = v.as_deref_mut() {
        v.set_identity();
    }

    for j in 0..n {
        // column j: rows j..m
        let len = m - j;
        x[..len].copy_from_slice(a.col_as_slice(j, j));
        let beta = reflector(&x[..len], &mut nu[..len]);
        if beta != T::zero() {
            let nu = &nu[..len];
            apply_left(&mut a.view_mut(j, j, len, n - j), beta, nu, work);
            for e in a.col_as_mut_slice(j, j + 1) {
                *e = T::zero();
            }
            if let Some(u) = u.as_deref_mut() {
                apply_right(&mut u.view_mut(0, j, m, len), beta, nu, work);
            }
        }

        // row j: columns j+1..n
        if j + 2 < n {
            let len = n - j - 1;
            for (i, xi) in x[..len].iter_mut().enumerate() {
                *xi = a[(j, j + 1 + i)];
            }
            let beta = reflector(&x[..len], &mut nu[..len]);
            if beta != T::zero() {
                let nu = &nu[..len];
                apply_right(&mut a.view_mut(j, j + 1, m - j, len), beta, nu, work);
                for c in (j + 2)..n {
                    a[(j, c)] = T::zero();
                }
                if let Some(v) = v.as_deref_mut() {
                    apply_right(&mut v.view_mut(0, j + 1, n, len), beta, nu, work);
                }
            }
        }
    }
    log::trace!("bidiagonalize: reduced {}x{} matrix", m, n);
    Ok(())
}

/// Bidiagonal decomposition `A = U B V^T` of a tall or square matrix.
///
/// ```
/// use eigenkit::DynMatrix;
/// use eigenkit::linalg::bidiagonal;
///
/// let a = DynMatrix::from_rows(3, 2, &[1.0_f64, 2.0, 3.0, 4.0, 5.0, 6.0]);
/// let bd = bidiagonal(&a).unwrap();
/// assert!(bd.b.is_upper_bidiagonal(0.0));
/// let back = &(&bd.u * &bd.b) * &bd.v.transpose();
/// assert!((&back - &a).frobenius_norm() < 1e-12);
/// ```
pub fn bidiagonal<T: FloatScalar>(a: &DynMatrix<T>) -> Result<Bidiagonal<T>, LinalgError> {
    let (m, n) = a.shape();
    ensure_tall(m, n)?;
    let mut b = a.clone();
    let mut u = DynMatrix::eye(m, T::zero());
    let mut v = DynMatrix::eye(n, T::zero());
    bidiagonalize(
        &mut b,
        Some(&mut u),
        Some(&mut v),
        &mut ReflectorWorkspace::default(),
    )?;
    Ok(Bidiagonal { b, u, v })
}

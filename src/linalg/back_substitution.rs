use crate::dynmatrix::{DynMatrix, DynVector};
use crate::linalg::workspace::ensure_vector;
use crate::linalg::{ensure_square, LinalgError};
use crate::traits::{FloatScalar, MatrixMut, MatrixRef, Scalar};

/// Scratch buffer for repeated triangular solves.
///
/// `x` holds the most recent solution after a call to
/// [`solve_upper_triangular_in`].
#[derive(Debug, Clone)]
pub struct BackSubstitutionWorkspace<T> {
    pub x: Option<DynVector<T>>,
}

impl<T> Default for BackSubstitutionWorkspace<T> {
    fn default() -> Self {
        Self { x: None }
    }
}

fn check_system<T>(
    a: &impl MatrixRef<T>,
    b: Option<&[T]>,
    x_len: usize,
) -> Result<usize, LinalgError> {
    let n = a.nrows();
    ensure_square(n, a.ncols())?;
    if let Some(b) = b {
        if b.len() != n {
            return Err(LinalgError::DimensionMismatch {
                expected: n,
                got: b.len(),
            });
        }
    }
    if x_len != n {
        return Err(LinalgError::DimensionMismatch {
            expected: n,
            got: x_len,
        });
    }
    Ok(n)
}

/// Solve `A x = b` for upper-triangular `A` by backward recurrence,
/// writing the solution into `x`.
///
/// Only the upper triangle of `A` is read. An absent `b` is a zero
/// right-hand side. No pivoting: a zero diagonal entry yields non-finite
/// values.
pub fn solve_upper_triangular_into<T: Scalar>(
    a: &impl MatrixRef<T>,
    b: Option<&[T]>,
    x: &mut [T],
) -> Result<(), LinalgError> {
    let n = check_system(a, b, x.len())?;
    for i in (0..n).rev() {
        let mut acc = match b {
            Some(b) => b[i],
            None => T::zero(),
        };
        for j in (i + 1)..n {
            acc = acc - *a.get(i, j) * x[j];
        }
        x[i] = acc / *a.get(i, i);
    }
    Ok(())
}

/// Solve `A x = b` for upper-triangular `A`.
///
/// ```
/// use eigenkit::{DynMatrix, DynVector};
/// use eigenkit::linalg::solve_upper_triangular;
///
/// let a = DynMatrix::from_rows(3, 3, &[1.0_f64, -2.0, 1.0, 0.0, 1.0, 6.0, 0.0, 0.0, 1.0]);
/// let b = DynVector::from_slice(&[4.0, -1.0, 2.0]);
/// let x = solve_upper_triangular(&a, Some(&b)).unwrap();
/// assert!((x[0] + 24.0).abs() < 1e-12);
/// assert!((x[1] + 13.0).abs() < 1e-12);
/// assert!((x[2] - 2.0).abs() < 1e-12);
/// ```
pub fn solve_upper_triangular<T: Scalar>(
    a: &DynMatrix<T>,
    b: Option<&DynVector<T>>,
) -> Result<DynVector<T>, LinalgError> {
    let mut ws = BackSubstitutionWorkspace::default();
    solve_upper_triangular_in(a, b, &mut ws)?;
    Ok(ws.x.unwrap_or_else(|| DynVector::zeros(0, T::zero())))
}

/// [`solve_upper_triangular`] with a caller-owned solution buffer.
pub fn solve_upper_triangular_in<'w, T: Scalar>(
    a: &DynMatrix<T>,
    b: Option<&DynVector<T>>,
    ws: &'w mut BackSubstitutionWorkspace<T>,
) -> Result<&'w DynVector<T>, LinalgError> {
    check_system(a, b.map(|b| b.as_slice()), a.nrows())?;
    let x = ensure_vector(&mut ws.x, a.nrows(), "x")?;
    solve_upper_triangular_into(a, b.map(|b| b.as_slice()), x.as_mut_slice())?;
    Ok(x)
}

/// Inverse of an upper-triangular matrix, one column per unit vector.
///
/// ```
/// use eigenkit::DynMatrix;
/// use eigenkit::linalg::invert_upper_triangular;
///
/// let a = DynMatrix::from_rows(2, 2, &[2.0_f64, 1.0, 0.0, 4.0]);
/// let inv = invert_upper_triangular(&a).unwrap();
/// let id = &a * &inv;
/// assert!((id[(0, 1)]).abs() < 1e-12);
/// assert!((id[(1, 1)] - 1.0).abs() < 1e-12);
/// ```
pub fn invert_upper_triangular<T: Scalar>(a: &DynMatrix<T>) -> Result<DynMatrix<T>, LinalgError> {
    let n = a.nrows();
    ensure_square(n, a.ncols())?;
    let mut ws = BackSubstitutionWorkspace::default();
    let mut e = DynVector::zeros(n, T::zero());
    let mut inv = DynMatrix::zeros(n, n, T::zero());
    for j in 0..n {
        e[j] = T::one();
        let x = solve_upper_triangular_in(a, Some(&e), &mut ws)?;
        inv.col_as_mut_slice(j, 0).copy_from_slice(x.as_slice());
        e[j] = T::zero();
    }
    Ok(inv)
}

/// Solve `(S - shift·I) x = scale·b` in place for quasi-upper-triangular `S`.
///
/// `x` holds `b` on entry and the solution on exit. A nonzero subdiagonal
/// `S[i, i-1]` marks an unreduced 2×2 block; rows `i-1` and `i` are then
/// solved together. Pivots (or 2×2 determinants) smaller than
/// `pivot_floor` in magnitude are replaced by `pivot_floor`, which keeps
/// the solution finite when `shift` is an eigenvalue of `S`.
///
/// Whenever a solved entry would exceed `sqrt(T::max_value())` in
/// magnitude, the whole partial solution (and the remaining right-hand
/// side) is scaled down so that entry becomes `±1`. The product of these
/// factors is returned as `scale`, in `[0, 1]`; it is exactly `1` when no
/// rescaling was needed.
pub fn solve_quasi_upper_triangular_in_place<T: FloatScalar>(
    s: &impl MatrixRef<T>,
    shift: T,
    x: &mut [T],
    pivot_floor: T,
) -> Result<T, LinalgError> {
    let n = check_system(s, None, x.len())?;
    let floored = |p: T| if p.abs() < pivot_floor { pivot_floor } else { p };
    let big = T::max_value().sqrt();
    let mut scale = T::one();

    let mut i = n;
    while i > 0 {
        let r = i - 1;
        if r > 0 && *s.get(r, r - 1) != T::zero() {
            // 2×2 block on rows r-1, r
            let q = r - 1;
            let mut r1 = x[q];
            let mut r2 = x[r];
            for j in (r + 1)..n {
                r1 = r1 - *s.get(q, j) * x[j];
                r2 = r2 - *s.get(r, j) * x[j];
            }
            let a = *s.get(q, q) - shift;
            let b = *s.get(q, r);
            let c = *s.get(r, q);
            let d = *s.get(r, r) - shift;
            let det = floored(a * d - b * c);
            let mut xq = (r1 * d - b * r2) / det;
            let mut xr = (a * r2 - c * r1) / det;
            let m = xq.abs().max(xr.abs());
            if m > big {
                let f = m.recip();
                rescale(x, f);
                scale = scale * f;
                xq = xq * f;
                xr = xr * f;
            }
            x[q] = xq;
            x[r] = xr;
            i -= 2;
        } else {
            let mut acc = x[r];
            for j in (r + 1)..n {
                acc = acc - *s.get(r, j) * x[j];
            }
            let mut xr = acc / floored(*s.get(r, r) - shift);
            if xr.abs() > big {
                let f = xr.abs().recip();
                rescale(x, f);
                scale = scale * f;
                xr = xr * f;
            }
            x[r] = xr;
            i -= 1;
        }
    }
    Ok(scale)
}

fn rescale<T: FloatScalar>(x: &mut [T], f: T) {
    for v in x.iter_mut() {
        *v = *v * f;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-12;

    fn assert_near(a: f64, b: f64, tol: f64, msg: &str) {
        assert!((a - b).abs() < tol, "{}: {} vs {} (diff {})", msg, a, b, (a - b).abs());
    }

    fn upper() -> DynMatrix<f64> {
        DynMatrix::from_rows(3, 3, &[1.0, -2.0, 1.0, 0.0, 1.0, 6.0, 0.0, 0.0, 1.0])
    }

    #[test]
    fn solves_known_system() {
        let b = DynVector::from_slice(&[4.0, -1.0, 2.0]);
        let x = solve_upper_triangular(&upper(), Some(&b)).unwrap();
        assert_near(x[0], -24.0, TOL, "x0");
        assert_near(x[1], -13.0, TOL, "x1");
        assert_near(x[2], 2.0, TOL, "x2");
    }

    #[test]
    fn absent_rhs_is_zero() {
        let x = solve_upper_triangular(&upper(), None).unwrap();
        assert_eq!(x.as_slice(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn ignores_lower_triangle() {
        let mut a = upper();
        a[(2, 0)] = 99.0;
        a[(1, 0)] = -5.0;
        let b = DynVector::from_slice(&[4.0, -1.0, 2.0]);
        let x = solve_upper_triangular(&a, Some(&b)).unwrap();
        assert_near(x[0], -24.0, TOL, "x0");
    }

    #[test]
    fn dimension_errors() {
        let rect = DynMatrix::zeros(2, 3, 0.0_f64);
        assert_eq!(
            solve_upper_triangular(&rect, None).unwrap_err(),
            LinalgError::NotSquare { rows: 2, cols: 3 }
        );
        let b = DynVector::from_slice(&[1.0, 2.0]);
        assert_eq!(
            solve_upper_triangular(&upper(), Some(&b)).unwrap_err(),
            LinalgError::DimensionMismatch {
                expected: 3,
                got: 2
            }
        );
    }

    #[test]
    fn workspace_reuse_and_mismatch() {
        let mut ws = BackSubstitutionWorkspace::default();
        let b = DynVector::from_slice(&[1.0, 1.0, 1.0]);
        solve_upper_triangular_in(&upper(), Some(&b), &mut ws).unwrap();
        let x = solve_upper_triangular_in(&upper(), Some(&b), &mut ws).unwrap();
        assert_near(x[2], 1.0, TOL, "x2");

        let small = DynMatrix::eye(2, 0.0);
        assert!(matches!(
            solve_upper_triangular_in(&small, None, &mut ws),
            Err(LinalgError::WorkspaceMismatch { buffer: "x", .. })
        ));
    }

    #[test]
    fn inverse_times_matrix_is_identity() {
        let a = upper();
        let inv = invert_upper_triangular(&a).unwrap();
        let id = &a * &inv;
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_near(id[(i, j)], expected, TOL, "A A^-1");
            }
        }
        // inverse of upper triangular is upper triangular
        assert_eq!(inv[(2, 0)], 0.0);
    }

    #[test]
    fn quasi_triangular_with_block() {
        // Rows 0..2 form a 2x2 block with complex eigenvalues.
        let s = DynMatrix::from_rows(
            3,
            3,
            &[1.0, 2.0, 3.0, -2.0, 1.0, 4.0, 0.0, 0.0, 5.0],
        );
        let shift = 0.5;
        let b = [1.0, -1.0, 2.0];
        let mut x = b;
        let scale = solve_quasi_upper_triangular_in_place(&s, shift, &mut x, 1e-300).unwrap();
        assert_eq!(scale, 1.0);

        for i in 0..3 {
            let mut row = -shift * x[i];
            for j in 0..3 {
                row += s[(i, j)] * x[j];
            }
            assert_near(row, b[i], TOL, "residual");
        }
    }

    #[test]
    fn quasi_triangular_floors_singular_pivot() {
        let s = DynMatrix::from_rows(2, 2, &[2.0_f64, 1.0, 0.0, 3.0]);
        let mut x = [1.0_f64, 0.0];
        solve_quasi_upper_triangular_in_place(&s, 2.0, &mut x, 1e-10).unwrap();
        assert!(x[0].is_finite());
        assert_near(x[0], 1e10, 1.0, "floored pivot");
    }

    #[test]
    fn quasi_triangular_rescales_growing_solution() {
        // tiny diagonal: each row multiplies the solution by 1e20
        let n = 20;
        let s = DynMatrix::from_fn(n, n, |i, j| {
            if i == j {
                1e-20_f64
            } else if j == i + 1 {
                1.0
            } else {
                0.0
            }
        });
        let mut b = vec![0.0_f64; n];
        b[n - 1] = 1.0;
        let mut x = b.clone();
        let scale = solve_quasi_upper_triangular_in_place(&s, 0.0, &mut x, 0.0).unwrap();

        assert!(scale > 0.0 && scale < 1.0, "scale = {}", scale);
        assert!(x.iter().all(|v| v.is_finite()));
        let max = x.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        assert_near(max, 1.0, 1e-12, "dominant entry");
        for i in 0..n {
            let mut row = 0.0;
            for j in 0..n {
                row += s[(i, j)] * x[j];
            }
            assert_near(row, scale * b[i], 1e-12, "scaled residual");
        }
    }
}

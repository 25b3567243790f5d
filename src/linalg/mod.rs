pub mod back_substitution;
pub mod bidiagonal;
pub mod eigensystem;
pub mod givens;
pub mod hessenberg;
pub mod householder;
pub mod qr_algorithm;
pub mod svd;
pub mod tridiagonal;
pub mod workspace;

pub use back_substitution::{
    invert_upper_triangular, solve_quasi_upper_triangular_in_place, solve_upper_triangular,
    solve_upper_triangular_in, solve_upper_triangular_into, BackSubstitutionWorkspace,
};
pub use bidiagonal::{bidiagonal, bidiagonalize, Bidiagonal};
pub use eigensystem::{
    eigensystem, eigensystem_in, force_positive_definite, Eigen, EigenSettings, EigenWorkspace,
};
pub use hessenberg::{hessenberg, hessenberg_reduce, Hessenberg};
pub use qr_algorithm::{
    francis_qr, francis_step, qr_algorithm, qr_algorithm_in, qr_algorithm_symmetric,
    qr_algorithm_symmetric_in, symmetric_qr, symmetric_qr_step, QrSettings, QrWorkspace,
    SchurForm,
};
pub use svd::{golub_kahan_step, golub_kahan_svd, svd, svd_in, Svd, SvdSettings, SvdWorkspace};
pub use tridiagonal::{tridiagonal, tridiagonalize, Tridiagonal};
pub use workspace::ReflectorWorkspace;

use crate::traits::FloatScalar;

/// Errors from the decompositions.
///
/// Configuration errors (`NotSquare`, `DimensionMismatch`,
/// `WorkspaceMismatch`) are detected before any buffer is touched.
///
/// ```
/// use eigenkit::DynMatrix;
/// use eigenkit::linalg::LinalgError;
///
/// let a = DynMatrix::zeros(2, 3, 0.0_f64);
/// assert_eq!(
///     a.eigen().unwrap_err(),
///     LinalgError::NotSquare { rows: 2, cols: 3 }
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinalgError {
    /// A square matrix was required.
    #[error("matrix must be square, got {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },

    /// Operand dimensions disagree (e.g. right-hand side length).
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// A caller-supplied workspace buffer has the wrong size.
    #[error(
        "workspace buffer `{buffer}` has invalid dimension ({}x{} instead of {}x{})",
        .got.0, .got.1, .expected.0, .expected.1
    )]
    WorkspaceMismatch {
        buffer: &'static str,
        expected: (usize, usize),
        got: (usize, usize),
    },

    /// Iterative algorithm did not converge within the iteration budget.
    #[error("iterative algorithm did not converge after {iterations} iterations")]
    ConvergenceFailure { iterations: usize },
}

/// Fail with `NotSquare` unless `rows == cols`.
#[inline]
pub(crate) fn ensure_square(rows: usize, cols: usize) -> Result<(), LinalgError> {
    if rows != cols {
        return Err(LinalgError::NotSquare { rows, cols });
    }
    Ok(())
}

/// Implicit-step budget: the explicit cap, or `30·n`.
#[inline]
pub(crate) fn iteration_cap(max_iter: Option<usize>, n: usize) -> usize {
    max_iter.unwrap_or(30 * n)
}

/// Relative deflation test: `|x| <= eps * (|d1| + |d2|)`.
///
/// `x` is an off-diagonal entry, `d1`/`d2` the two diagonal entries it couples.
#[inline]
pub(crate) fn negligible<T: FloatScalar>(x: T, d1: T, d2: T, eps: T) -> bool {
    x.abs() <= eps * (d1.abs() + d2.abs())
}

/// Eigenvalue of the symmetric 2×2 matrix `[a b; b c]` closest to `c`.
///
/// Written as `c - b² / (d + sign(d)·√(d² + b²))` with `d = (a - c)/2`,
/// which never cancels. `sign(0)` is taken as `+`.
#[inline]
pub(crate) fn wilkinson_shift<T: FloatScalar>(a: T, b: T, c: T) -> T {
    let d = (a - c) * T::half();
    let r = d.hypot(b);
    let denom = if d < T::zero() { d - r } else { d + r };
    if denom == T::zero() {
        c
    } else {
        c - b * b / denom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        let e = LinalgError::WorkspaceMismatch {
            buffer: "h",
            expected: (3, 3),
            got: (2, 3),
        };
        assert_eq!(
            e.to_string(),
            "workspace buffer `h` has invalid dimension (2x3 instead of 3x3)"
        );
        assert_eq!(
            LinalgError::NotSquare { rows: 2, cols: 4 }.to_string(),
            "matrix must be square, got 2x4"
        );
    }

    #[test]
    fn wilkinson_shift_picks_nearest_eigenvalue() {
        // [[2, 1], [1, 2]] has eigenvalues 1 and 3; both equidistant from 2,
        // sign(0) = + selects 1.
        assert!((wilkinson_shift(2.0_f64, 1.0, 2.0) - 1.0).abs() < 1e-15);
        // [[4, 1], [1, 1]]: eigenvalues (5 ± √13)/2, closer to 1 is the smaller.
        let expected = (5.0 - 13.0_f64.sqrt()) / 2.0;
        assert!((wilkinson_shift(4.0_f64, 1.0, 1.0) - expected).abs() < 1e-14);
        // Decoupled block: shift is the corner entry itself.
        assert_eq!(wilkinson_shift(3.0_f64, 0.0, 3.0), 3.0);
    }

    #[test]
    fn negligible_is_relative() {
        assert!(negligible(1e-17_f64, 1.0, 1.0, f64::EPSILON));
        assert!(!negligible(1e-17_f64, 1e-3, 1e-3, f64::EPSILON));
        assert!(negligible(0.0_f64, 0.0, 0.0, f64::EPSILON));
    }
}

use crate::linalg::{
    bidiagonal, eigensystem, hessenberg, solve_upper_triangular, svd, tridiagonal, Bidiagonal,
    Eigen, EigenSettings, Hessenberg, LinalgError, Svd, SvdSettings, Tridiagonal,
};
use crate::traits::FloatScalar;

use super::vector::DynVector;
use super::DynMatrix;

// ── Reductions ──────────────────────────────────────────────────────

impl<T: FloatScalar> DynMatrix<T> {
    /// Upper Hessenberg form `A = U H U^T`.
    ///
    /// ```
    /// use eigenkit::DynMatrix;
    /// let a = DynMatrix::from_fn(4, 4, |i, j| (i * 4 + j) as f64);
    /// let hs = a.hessenberg().unwrap();
    /// assert!(hs.h.is_upper_hessenberg(0.0));
    /// ```
    pub fn hessenberg(&self) -> Result<Hessenberg<T>, LinalgError> {
        hessenberg(self)
    }

    /// Symmetric tridiagonal form `A = U T U^T`. Reads the lower triangle.
    pub fn tridiagonal(&self) -> Result<Tridiagonal<T>, LinalgError> {
        tridiagonal(self)
    }

    /// Upper bidiagonal form `A = U B V^T`; requires `nrows >= ncols`.
    pub fn bidiagonal(&self) -> Result<Bidiagonal<T>, LinalgError> {
        bidiagonal(self)
    }
}

// ── Spectral decompositions ─────────────────────────────────────────

impl<T: FloatScalar> DynMatrix<T> {
    /// Eigenvalues and unit eigenvectors, sorted by descending `|λ|`.
    ///
    /// Uses the general (nonsymmetric) path; see
    /// [`eigensystem`](crate::linalg::eigensystem) for options.
    ///
    /// ```
    /// use eigenkit::DynMatrix;
    /// let a = DynMatrix::from_rows(2, 2, &[4.0_f64, 1.0, 2.0, 3.0]);
    /// let eig = a.eigen().unwrap();
    /// assert!((eig.eigenvalues[0] - 5.0).abs() < 1e-12);
    /// assert!((eig.eigenvalues[1] - 2.0).abs() < 1e-12);
    /// ```
    pub fn eigen(&self) -> Result<Eigen<T>, LinalgError> {
        eigensystem(self, &EigenSettings::default())
    }

    /// Eigenvalues only, sorted by descending `|λ|`.
    pub fn eigenvalues(&self) -> Result<DynVector<T>, LinalgError> {
        let settings = EigenSettings {
            compute_eigenvectors: false,
            ..EigenSettings::default()
        };
        Ok(eigensystem(self, &settings)?.eigenvalues)
    }

    /// Singular value decomposition with non-negative, descending singular
    /// values. Works for any shape.
    ///
    /// ```
    /// use eigenkit::DynMatrix;
    /// let a = DynMatrix::from_rows(3, 2, &[
    ///     1.0_f64, 0.0,
    ///     0.0, 2.0,
    ///     0.0, 0.0,
    /// ]);
    /// let sv = a.svd().unwrap();
    /// assert!((sv.singular_values()[0] - 2.0).abs() < 1e-12);
    /// assert!((sv.singular_values()[1] - 1.0).abs() < 1e-12);
    /// ```
    pub fn svd(&self) -> Result<Svd<T>, LinalgError> {
        Ok(svd(self, &SvdSettings::default())?.sorted())
    }

    /// Singular values only (no U/V), non-negative and descending.
    ///
    /// ```
    /// use eigenkit::DynMatrix;
    /// let a = DynMatrix::from_rows(2, 2, &[3.0_f64, 0.0, 0.0, -4.0]);
    /// let sv = a.singular_values().unwrap();
    /// assert_eq!(sv.as_slice(), &[4.0, 3.0]);
    /// ```
    pub fn singular_values(&self) -> Result<DynVector<T>, LinalgError> {
        let settings = SvdSettings {
            compute_u: false,
            compute_v: false,
            ..SvdSettings::default()
        };
        Ok(svd(self, &settings)?.sorted().singular_values())
    }

    /// Solve `self · x = b` by back-substitution, reading only the upper
    /// triangle.
    pub fn solve_upper_triangular(&self, b: &DynVector<T>) -> Result<DynVector<T>, LinalgError> {
        solve_upper_triangular(self, Some(b))
    }
}

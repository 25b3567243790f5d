//! # eigenkit
//!
//! Dense eigenvalue and singular value decompositions for real matrices,
//! built bottom-up from Householder reflectors and Givens rotations.
//!
//! ## Quick start
//!
//! ```
//! use eigenkit::DynMatrix;
//!
//! let a = DynMatrix::from_rows(3, 3, &[
//!     2.0_f64, -1.0, 0.0,
//!     -1.0, 2.0, -1.0,
//!     0.0, -1.0, 2.0,
//! ]);
//!
//! // eigenpairs sorted by descending |λ|
//! let eig = a.eigen().unwrap();
//! assert!((eig.eigenvalues[0] - (2.0 + 2.0_f64.sqrt())).abs() < 1e-12);
//!
//! // non-negative, descending singular values
//! let sv = a.singular_values().unwrap();
//! assert!((sv[2] - (2.0 - 2.0_f64.sqrt())).abs() < 1e-12);
//! ```
//!
//! ## Modules
//!
//! - [`dynmatrix`]: Heap-allocated, column-major `DynMatrix<T>` with runtime
//!   dimensions, plus [`DynVector<T>`] and the aliasing
//!   [`MatrixView`] / [`MatrixViewMut`] windows the algorithms run on.
//!   Convenience methods: `a.eigen()`, `a.svd()`, `a.hessenberg()`, ...
//!
//! - [`linalg`]: The decompositions themselves:
//!   - primitives: [`linalg::householder`], [`linalg::givens`] (dense and
//!     banded variants), [`linalg::back_substitution`]
//!   - reductions: [`linalg::hessenberg`], [`linalg::tridiagonal`],
//!     [`linalg::bidiagonal`]
//!   - iterations: [`linalg::qr_algorithm`] (Francis double shift and
//!     symmetric Wilkinson shift), [`linalg::svd`] (Golub-Kahan)
//!   - front end: [`linalg::eigensystem`]
//!
//!   Every decomposition has a self-allocating entry point and an `_in`
//!   variant that reuses a caller-owned workspace.
//!
//! - [`traits`]: Element traits [`Scalar`] / [`FloatScalar`] and the matrix
//!   access traits [`MatrixRef`] / [`MatrixMut`].
//!
//! ## Limitations
//!
//! Complex conjugate eigenvalue pairs are reported by their real part, and
//! the eigenvectors in those slots are not meaningful.
//!
//! ## Logging
//!
//! Convergence is reported through the [`log`](https://docs.rs/log) facade:
//! `debug!` per decomposition, `trace!` per deflation, `warn!` when an
//! iteration cap is hit. No logger is installed by the library.

pub mod dynmatrix;
pub mod linalg;
pub mod traits;

pub use dynmatrix::{DynMatrix, DynVector, MatrixView, MatrixViewMut};
pub use linalg::LinalgError;
pub use traits::{FloatScalar, MatrixMut, MatrixRef, Scalar};

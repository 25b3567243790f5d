//! Reusable scratch buffers.
//!
//! Every decomposition has a self-allocating entry point and an `_in`
//! variant taking a workspace by `&mut`. Workspace fields start as `None`
//! and are allocated on first use; later calls reuse them. A field that is
//! already filled but sized for a different problem is an error, never a
//! silent reallocation.

use crate::dynmatrix::{DynMatrix, DynVector};
use crate::linalg::LinalgError;
use crate::traits::Scalar;

/// Return the vector in `slot`, allocating a zero vector of length `n` if
/// the slot is empty.
pub(crate) fn ensure_vector<'a, T: Scalar>(
    slot: &'a mut Option<DynVector<T>>,
    n: usize,
    buffer: &'static str,
) -> Result<&'a mut DynVector<T>, LinalgError> {
    check_vector(slot.as_ref(), n, buffer)?;
    Ok(slot.get_or_insert_with(|| DynVector::zeros(n, T::zero())))
}

/// Validate the length of an optional vector buffer without touching it.
pub(crate) fn check_vector<T>(
    v: Option<&DynVector<T>>,
    n: usize,
    buffer: &'static str,
) -> Result<(), LinalgError> {
    match v {
        Some(v) if v.len() != n => Err(LinalgError::WorkspaceMismatch {
            buffer,
            expected: (n, 1),
            got: (v.len(), 1),
        }),
        _ => Ok(()),
    }
}

/// Return the matrix in `slot`, allocating a zero `rows x cols` matrix if
/// the slot is empty.
pub(crate) fn ensure_matrix<'a, T: Scalar>(
    slot: &'a mut Option<DynMatrix<T>>,
    rows: usize,
    cols: usize,
    buffer: &'static str,
) -> Result<&'a mut DynMatrix<T>, LinalgError> {
    check_matrix(slot.as_ref(), rows, cols, buffer)?;
    Ok(slot.get_or_insert_with(|| DynMatrix::zeros(rows, cols, T::zero())))
}

/// Validate the size of an optional buffer without touching it.
pub(crate) fn check_matrix<T>(
    m: Option<&DynMatrix<T>>,
    rows: usize,
    cols: usize,
    buffer: &'static str,
) -> Result<(), LinalgError> {
    match m {
        Some(m) if m.shape() != (rows, cols) => Err(LinalgError::WorkspaceMismatch {
            buffer,
            expected: (rows, cols),
            got: m.shape(),
        }),
        _ => Ok(()),
    }
}

/// Scratch vectors for building and applying Householder reflectors.
///
/// Sized for the largest dimension of the problem: `n` for square
/// reductions, `max(m, n)` for bidiagonalization.
///
/// - `x`: the column or row segment being annihilated
/// - `nu`: the reflector vector (`nu[0] = 1`)
/// - `work`: the matrix-vector product used by the two-sided update
#[derive(Debug, Clone)]
pub struct ReflectorWorkspace<T> {
    pub x: Option<DynVector<T>>,
    pub nu: Option<DynVector<T>>,
    pub work: Option<DynVector<T>>,
}

impl<T> Default for ReflectorWorkspace<T> {
    fn default() -> Self {
        Self {
            x: None,
            nu: None,
            work: None,
        }
    }
}

impl<T: Scalar> ReflectorWorkspace<T> {
    /// Validate (or allocate) all three buffers for dimension `n` and borrow
    /// them at once.
    pub(crate) fn buffers(
        &mut self,
        n: usize,
    ) -> Result<(&mut [T], &mut [T], &mut [T]), LinalgError> {
        let x = ensure_vector(&mut self.x, n, "x")?;
        let nu = ensure_vector(&mut self.nu, n, "nu")?;
        let work = ensure_vector(&mut self.work, n, "work")?;
        Ok((x.as_mut_slice(), nu.as_mut_slice(), work.as_mut_slice()))
    }
}

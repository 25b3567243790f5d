use core::ops::{Index, IndexMut};

use crate::traits::{MatrixMut, MatrixRef, Scalar};

use super::DynMatrix;

/// Read-only window onto a rectangular block of a column-major matrix.
///
/// Element `(i, j)` of the view is `data[j * ld + i]`, where `ld` is the
/// row count of the matrix that owns the storage. The view borrows that
/// storage; nothing is copied.
///
/// ```
/// use eigenkit::DynMatrix;
///
/// let a = DynMatrix::from_rows(3, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
/// let v = a.view(1, 1, 2, 2);
/// assert_eq!(v[(0, 0)], 5.0);
/// assert_eq!(v[(1, 1)], 9.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct MatrixView<'a, T> {
    data: &'a [T],
    nrows: usize,
    ncols: usize,
    ld: usize,
}

/// Mutable window onto a rectangular block of a column-major matrix.
///
/// Writes through the view land in the parent's storage; this is how the
/// Householder and Givens primitives act on sub-blocks in place.
///
/// ```
/// use eigenkit::DynMatrix;
///
/// let mut a = DynMatrix::zeros(3, 3, 0.0_f64);
/// {
///     let mut v = a.view_mut(1, 0, 2, 2);
///     v[(1, 1)] = 4.0;
/// }
/// assert_eq!(a[(2, 1)], 4.0);
/// ```
#[derive(Debug)]
pub struct MatrixViewMut<'a, T> {
    data: &'a mut [T],
    nrows: usize,
    ncols: usize,
    ld: usize,
}

/// Storage range covered by a `rows x cols` block at `(r0, c0)` of a
/// column-major buffer with leading dimension `ld`, or `None` if empty.
#[inline]
fn block_span(
    ld: usize,
    (parent_rows, parent_cols): (usize, usize),
    (r0, c0): (usize, usize),
    (rows, cols): (usize, usize),
) -> Option<(usize, usize)> {
    assert!(
        r0 + rows <= parent_rows && c0 + cols <= parent_cols,
        "view {}x{} at ({}, {}) exceeds {}x{} matrix",
        rows,
        cols,
        r0,
        c0,
        parent_rows,
        parent_cols,
    );
    if rows == 0 || cols == 0 {
        return None;
    }
    let start = c0 * ld + r0;
    let end = (c0 + cols - 1) * ld + r0 + rows;
    Some((start, end))
}

// ── Constructors ────────────────────────────────────────────────────

impl<T> DynMatrix<T> {
    /// Borrow the `rows x cols` block starting at `(r0, c0)`.
    ///
    /// Panics if the block does not fit inside the matrix.
    pub fn view(&self, r0: usize, c0: usize, rows: usize, cols: usize) -> MatrixView<'_, T> {
        let ld = self.nrows();
        let data: &[T] = match block_span(ld, self.shape(), (r0, c0), (rows, cols)) {
            Some((start, end)) => &self.as_slice()[start..end],
            None => &[],
        };
        MatrixView {
            data,
            nrows: rows,
            ncols: cols,
            ld,
        }
    }

    /// Mutably borrow the `rows x cols` block starting at `(r0, c0)`.
    ///
    /// Panics if the block does not fit inside the matrix.
    pub fn view_mut(
        &mut self,
        r0: usize,
        c0: usize,
        rows: usize,
        cols: usize,
    ) -> MatrixViewMut<'_, T> {
        let ld = self.nrows();
        let span = block_span(ld, self.shape(), (r0, c0), (rows, cols));
        let data: &mut [T] = match span {
            Some((start, end)) => &mut self.as_mut_slice()[start..end],
            None => &mut [],
        };
        MatrixViewMut {
            data,
            nrows: rows,
            ncols: cols,
            ld,
        }
    }
}

impl<'a, T> MatrixView<'a, T> {
    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Sub-view relative to this view's origin.
    pub fn view(&self, r0: usize, c0: usize, rows: usize, cols: usize) -> MatrixView<'a, T> {
        let all: &'a [T] = self.data;
        let span = block_span(self.ld, (self.nrows, self.ncols), (r0, c0), (rows, cols));
        let data: &'a [T] = match span {
            Some((start, end)) => &all[start..end],
            None => &[],
        };
        MatrixView {
            data,
            nrows: rows,
            ncols: cols,
            ld: self.ld,
        }
    }
}

impl<T: Scalar> MatrixView<'_, T> {
    /// Copy the viewed block into a new owned matrix.
    pub fn to_matrix(&self) -> DynMatrix<T> {
        DynMatrix::from_fn(self.nrows, self.ncols, |i, j| self[(i, j)])
    }
}

impl<T> MatrixViewMut<'_, T> {
    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Read-only sub-view relative to this view's origin.
    pub fn view(&self, r0: usize, c0: usize, rows: usize, cols: usize) -> MatrixView<'_, T> {
        let span = block_span(self.ld, (self.nrows, self.ncols), (r0, c0), (rows, cols));
        let data: &[T] = match span {
            Some((start, end)) => &self.data[start..end],
            None => &[],
        };
        MatrixView {
            data,
            nrows: rows,
            ncols: cols,
            ld: self.ld,
        }
    }

    /// Mutable sub-view relative to this view's origin.
    pub fn view_mut(
        &mut self,
        r0: usize,
        c0: usize,
        rows: usize,
        cols: usize,
    ) -> MatrixViewMut<'_, T> {
        let span = block_span(self.ld, (self.nrows, self.ncols), (r0, c0), (rows, cols));
        let data: &mut [T] = match span {
            Some((start, end)) => &mut self.data[start..end],
            None => &mut [],
        };
        MatrixViewMut {
            data,
            nrows: rows,
            ncols: cols,
            ld: self.ld,
        }
    }
}

// ── MatrixRef / MatrixMut ───────────────────────────────────────────

impl<T> MatrixRef<T> for MatrixView<'_, T> {
    #[inline]
    fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    fn get(&self, row: usize, col: usize) -> &T {
        &self.data[col * self.ld + row]
    }

    #[inline]
    fn col_as_slice(&self, col: usize, row_start: usize) -> &[T] {
        let base = col * self.ld;
        &self.data[base + row_start..base + self.nrows]
    }
}

impl<T> MatrixRef<T> for MatrixViewMut<'_, T> {
    #[inline]
    fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    fn get(&self, row: usize, col: usize) -> &T {
        &self.data[col * self.ld + row]
    }

    #[inline]
    fn col_as_slice(&self, col: usize, row_start: usize) -> &[T] {
        let base = col * self.ld;
        &self.data[base + row_start..base + self.nrows]
    }
}

impl<T> MatrixMut<T> for MatrixViewMut<'_, T> {
    #[inline]
    fn get_mut(&mut self, row: usize, col: usize) -> &mut T {
        &mut self.data[col * self.ld + row]
    }

    #[inline]
    fn col_as_mut_slice(&mut self, col: usize, row_start: usize) -> &mut [T] {
        let base = col * self.ld;
        &mut self.data[base + row_start..base + self.nrows]
    }
}

// ── Index ───────────────────────────────────────────────────────────

impl<T> Index<(usize, usize)> for MatrixView<'_, T> {
    type Output = T;

    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &T {
        debug_assert!(row < self.nrows && col < self.ncols);
        &self.data[col * self.ld + row]
    }
}

impl<T> Index<(usize, usize)> for MatrixViewMut<'_, T> {
    type Output = T;

    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &T {
        debug_assert!(row < self.nrows && col < self.ncols);
        &self.data[col * self.ld + row]
    }
}

impl<T> IndexMut<(usize, usize)> for MatrixViewMut<'_, T> {
    #[inline]
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut T {
        debug_assert!(row < self.nrows && col < self.ncols);
        &mut self.data[col * self.ld + row]
    }
}

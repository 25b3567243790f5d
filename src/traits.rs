use core::fmt::Debug;
use num_traits::{Float, Num, One, Zero};

/// Trait for types that can be used as matrix elements.
///
/// Blanket-implemented for all types satisfying the bounds.
/// Covers `f32`, `f64`, and all integer types.
pub trait Scalar: Copy + PartialEq + PartialOrd + Debug + Zero + One + Num {}

impl<T: Copy + PartialEq + PartialOrd + Debug + Zero + One + Num> Scalar for T {}

/// Trait for floating-point matrix elements.
///
/// Required by every decomposition: the algorithms need `sqrt`, `abs`,
/// ordered comparison and a machine epsilon for deflation tests.
pub trait FloatScalar: Scalar + Float {
    /// `2` in the scalar type.
    #[inline]
    fn two() -> Self {
        Self::one() + Self::one()
    }

    /// `1/2` in the scalar type.
    #[inline]
    fn half() -> Self {
        Self::one() / Self::two()
    }
}

impl<T: Scalar + Float> FloatScalar for T {}

/// Read-only access to a matrix-like type.
///
/// Implemented by owned matrices and by the aliasing views handed out by
/// [`DynMatrix::view`](crate::DynMatrix::view), so every primitive in
/// [`linalg`](crate::linalg) works on a whole matrix or on a sub-block.
pub trait MatrixRef<T> {
    fn nrows(&self) -> usize;
    fn ncols(&self) -> usize;
    fn get(&self, row: usize, col: usize) -> &T;

    /// Contiguous slice of column `col` from `row_start` to the last row.
    fn col_as_slice(&self, col: usize, row_start: usize) -> &[T];
}

/// Mutable access to a matrix-like type.
///
/// Extends `MatrixRef` with mutable element access, enabling
/// in-place algorithms (reflections, rotations) to work generically.
pub trait MatrixMut<T>: MatrixRef<T> {
    fn get_mut(&mut self, row: usize, col: usize) -> &mut T;

    /// Mutable contiguous slice of column `col` from `row_start` to the last row.
    fn col_as_mut_slice(&mut self, col: usize, row_start: usize) -> &mut [T];
}

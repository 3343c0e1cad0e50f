use std::fmt::{Display, Formatter};

use crate::matrix::Dimension;

/// One worker's rectangle of the join matrix.
///
/// All ranges are half-open, `[origin, origin + extent)`, so two adjacent parts never claim
/// the same cell. A part with zero area is legal and marks an idle worker.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq)]
pub struct Part {
    row_origin: usize,
    col_origin: usize,
    width: usize,
    height: usize,
}

impl Part {
    pub fn new(row_origin: usize, col_origin: usize, height: usize, width: usize) -> Self {
        Self {
            row_origin,
            col_origin,
            width,
            height,
        }
    }

    /// A zero-area part, assigned to a worker that receives no cells.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn row_origin(&self) -> usize {
        self.row_origin
    }

    pub fn col_origin(&self) -> usize {
        self.col_origin
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn row_end(&self) -> usize {
        self.row_origin.saturating_add(self.height)
    }

    pub fn col_end(&self) -> usize {
        self.col_origin.saturating_add(self.width)
    }

    /// Approximates the number of tuple pairs the worker has to test.
    pub fn area(&self) -> usize {
        self.width.saturating_mul(self.height)
    }

    /// Approximates the number of distinct tuples the worker has to receive.
    pub fn half_perimeter(&self) -> usize {
        self.width.saturating_add(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.area() == 0
    }

    pub fn intersects_row(&self, row: usize) -> bool {
        row >= self.row_origin && row - self.row_origin < self.height
    }

    pub fn intersects_column(&self, col: usize) -> bool {
        col >= self.col_origin && col - self.col_origin < self.width
    }

    /// Whether the part lies inside `[0, height) x [0, width)`.
    pub fn fits_within(&self, height: usize, width: usize) -> bool {
        let row_end = self.row_origin.checked_add(self.height);
        let col_end = self.col_origin.checked_add(self.width);
        matches!((row_end, col_end), (Some(r), Some(c)) if r <= height && c <= width)
    }

    pub fn intersects(&self, dimension: Dimension, index: usize) -> bool {
        match dimension {
            Dimension::Row => self.intersects_row(index),
            Dimension::Column => self.intersects_column(index),
        }
    }

    pub fn covers_cell(&self, row: usize, col: usize) -> bool {
        self.intersects_row(row) && self.intersects_column(col)
    }
}

/// Prints the bounding box as `[(col_start, col_end), (row_start, row_end)]`.
impl Display for Part {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[({}, {}), ({}, {})]",
            self.col_origin,
            self.col_end(),
            self.row_origin,
            self.row_end()
        )
    }
}

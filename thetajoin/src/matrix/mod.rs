//! The abstract join space.
//!
//! A [`Matrix`] never looks at tuples. It is computed once from cardinality estimates and a
//! bucket resolution, and shared read-only by the partition and every router.

mod relation;
pub use relation::*;

use std::fmt::{Display, Formatter};

use anyhow::ensure;

use crate::error::{PartitionError, ThetaResult};

/// Shape of the join matrix and ordering of the relation sizes.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct Matrix {
    /// Number of buckets along the row axis.
    height: usize,
    /// Number of buckets along the column axis.
    width: usize,
    size_of_s: u64,
    size_of_t: u64,
    orientation: Orientation,
}

impl Matrix {
    pub fn builder() -> MatrixBuilder {
        MatrixBuilder::default()
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn size_of_s(&self) -> u64 {
        self.size_of_s
    }

    pub fn size_of_t(&self) -> u64 {
        self.size_of_t
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn is_s_greater_than_t(&self) -> bool {
        self.orientation.s_greater_than_t()
    }

    pub fn cell_count(&self) -> usize {
        self.height * self.width
    }

    pub fn dimension_of(&self, relation: Relation) -> Dimension {
        self.orientation.dimension_of(relation)
    }

    pub fn axis_len(&self, dimension: Dimension) -> usize {
        match dimension {
            Dimension::Row => self.height,
            Dimension::Column => self.width,
        }
    }

    pub fn relation_size(&self, relation: Relation) -> u64 {
        match relation {
            Relation::S => self.size_of_s,
            Relation::T => self.size_of_t,
        }
    }

    /// Maps an index in the domain of `relation` onto a bucket of that relation's axis.
    ///
    /// The domain `[0, size)` is scaled linearly onto `[0, axis_len)`, so one bucket stands for a
    /// contiguous range of indices when the relation is larger than the resolution. Indices past
    /// the domain wrap around.
    ///
    /// A domain smaller than the axis only ever hits `size` of its buckets, spread evenly over the
    /// axis. Bands that contain none of those buckets then receive no tuple of the relation, so
    /// the resolution should not exceed the relation's cardinality.
    pub fn bucket_of(&self, relation: Relation, index: u64) -> usize {
        let size = self.relation_size(relation);
        let axis_len = self.axis_len(self.dimension_of(relation));
        let index = index % size;
        ((index as u128 * axis_len as u128) / size as u128) as usize
    }
}

impl Display for Matrix {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Matrix of {} rows and {} columns", self.height, self.width)?;
        writeln!(
            f,
            "Size of S: {}, size of T: {}, S greater than T: {}",
            self.size_of_s,
            self.size_of_t,
            self.is_s_greater_than_t()
        )
    }
}

/// Builds a [`Matrix`], rejecting shapes that cannot be partitioned.
#[derive(Clone, Debug, Default)]
pub struct MatrixBuilder {
    height: usize,
    width: usize,
    size_of_s: u64,
    size_of_t: u64,
}

impl MatrixBuilder {
    pub fn height(mut self, height: usize) -> Self {
        self.height = height;
        self
    }

    pub fn width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    pub fn size_of_s(mut self, size_of_s: u64) -> Self {
        self.size_of_s = size_of_s;
        self
    }

    pub fn size_of_t(mut self, size_of_t: u64) -> Self {
        self.size_of_t = size_of_t;
        self
    }

    pub fn build(self) -> ThetaResult<Matrix> {
        ensure!(
            self.height > 0 && self.width > 0,
            PartitionError::InvalidConfig(format!(
                "matrix must have positive height and width, got {}x{}",
                self.height, self.width
            ))
        );
        ensure!(
            self.size_of_s > 0 && self.size_of_t > 0,
            PartitionError::InvalidConfig(format!(
                "relation size estimates must be positive, got S: {}, T: {}",
                self.size_of_s, self.size_of_t
            ))
        );

        Ok(Matrix {
            height: self.height,
            width: self.width,
            size_of_s: self.size_of_s,
            size_of_t: self.size_of_t,
            orientation: Orientation::from_sizes(self.size_of_s, self.size_of_t),
        })
    }
}

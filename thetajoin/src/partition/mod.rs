//! Partitions of the join matrix and the routing query.
//!
//! A [`Partition`] assigns every cell of a [`Matrix`] to exactly one worker. Once built it is
//! never mutated, so one instance can be shared by all routers of a join through an `Arc`.

mod part;
pub use part::*;
pub mod explain;

use std::hash::Hash;
use std::sync::Arc;

use anyhow::{bail, ensure};
use log::{debug, error};
use smallvec::SmallVec;

use crate::cost::PartitionCost;
use crate::error::{PartitionError, ThetaResult};
use crate::matrix::{Dimension, Matrix, Relation};
use crate::sampler::{IndexSampler, KeyHasher};
use crate::strategy::{PartitionStrategy, StrategyImpl};

/// Worker ids returned by a routing query, in ascending order.
pub type RegionIds = SmallVec<[usize; 8]>;

/// Routing capability consumed by the join execution layer.
pub trait MatrixAssignment: Send + Sync {
    fn num_workers(&self) -> usize;

    /// Size of the domain indices of `relation` are sampled from.
    fn domain_size(&self, relation: Relation) -> u64;

    /// Workers that must receive a tuple of `relation` sampled at `sampled_index` of the
    /// relation's domain.
    fn region_ids(&self, relation: Relation, sampled_index: u64) -> RegionIds;
}

#[derive(Clone, Debug)]
pub struct Partition {
    matrix: Arc<Matrix>,
    num_workers: usize,
    /// Indexed by worker id.
    parts: Vec<Part>,
    strategy: StrategyImpl,
}

impl Partition {
    /// Runs `strategy` once and checks the resulting tiling.
    ///
    /// Fails if `num_workers` is zero or if the strategy does not cover every cell of the matrix
    /// exactly once. A partition that fails this check would silently lose join results, so it
    /// is never handed out.
    pub fn new(
        matrix: Arc<Matrix>,
        num_workers: usize,
        strategy: StrategyImpl,
    ) -> ThetaResult<Self> {
        ensure!(
            num_workers > 0,
            PartitionError::InvalidConfig("number of workers must be positive".to_string())
        );

        let parts = strategy.generate_partition(&matrix, num_workers)?;
        if parts.len() != num_workers {
            error!(
                "{:?} generated {} parts for {} workers",
                strategy,
                parts.len(),
                num_workers
            );
            bail!(PartitionError::WorkerCountMismatch {
                strategy: strategy.as_ref().to_string(),
                expected: num_workers,
                actual: parts.len(),
            });
        }

        // Zero-area parts carry no cells, so their extents must not count as replication.
        let parts = parts
            .into_iter()
            .map(|p| if p.is_empty() { Part::empty() } else { p })
            .collect();

        let partition = Self {
            matrix,
            num_workers,
            parts,
            strategy,
        };

        if !partition.valid() {
            error!("Rejecting invalid partition:\n{}", partition);
            bail!(PartitionError::InvalidPartition {
                strategy: partition.strategy.as_ref().to_string(),
            });
        }

        debug!("Generated partition:\n{}", partition);
        Ok(partition)
    }

    pub fn matrix(&self) -> &Arc<Matrix> {
        &self.matrix
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn part(&self, worker: usize) -> Option<&Part> {
        self.parts.get(worker)
    }

    pub fn strategy(&self) -> &StrategyImpl {
        &self.strategy
    }

    pub fn into_parts(self) -> Vec<Part> {
        self.parts
    }

    /// Number of workers with a non-empty part.
    pub fn used_workers(&self) -> usize {
        self.parts.iter().filter(|p| !p.is_empty()).count()
    }

    /// `1 / used_workers`, so partitions that leave workers idle are more expensive.
    pub fn calculate_cost(&self) -> f64 {
        1.0 / self.used_workers() as f64
    }

    pub fn max_area(&self) -> usize {
        self.parts.iter().map(Part::area).max().unwrap_or(0)
    }

    pub fn max_half_perimeter(&self) -> usize {
        self.parts
            .iter()
            .map(Part::half_perimeter)
            .max()
            .unwrap_or(0)
    }

    pub fn sum_half_perimeter(&self) -> usize {
        self.parts.iter().map(Part::half_perimeter).sum()
    }

    pub fn sum_area(&self) -> usize {
        self.parts.iter().map(Part::area).sum()
    }

    pub fn cost(&self) -> PartitionCost {
        PartitionCost::of(&self.parts)
    }

    /// Checks that every part lies inside the matrix and every cell is covered by exactly one
    /// part.
    ///
    /// This scans the whole matrix for every worker and is meant for construction and tests, not
    /// for the routing path.
    pub fn valid(&self) -> bool {
        if self.parts.len() != self.num_workers {
            return false;
        }

        let (height, width) = (self.matrix.height(), self.matrix.width());
        if !self
            .parts
            .iter()
            .all(|p| p.is_empty() || p.fits_within(height, width))
        {
            return false;
        }

        for row in 0..self.matrix.height() {
            for col in 0..self.matrix.width() {
                let covering = self
                    .parts
                    .iter()
                    .filter(|p| p.covers_cell(row, col))
                    .count();
                if covering != 1 {
                    return false;
                }
            }
        }
        true
    }

    /// Worker owning cell `(row, col)`.
    pub fn worker_of_cell(&self, row: usize, col: usize) -> Option<usize> {
        self.parts.iter().position(|p| p.covers_cell(row, col))
    }

    /// Workers whose part crosses bucket `index` of `dimension`.
    pub fn region_ids_at(&self, dimension: Dimension, index: usize) -> RegionIds {
        self.parts
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.is_empty() && p.intersects(dimension, index))
            .map(|(worker, _)| worker)
            .collect()
    }

    /// Workers that must receive a tuple of `relation` at `sampled_index` of its domain.
    ///
    /// The matrix orientation decides the axis: `S` is tested against rows unless it is the
    /// larger relation, `T` against columns unless `S` is the larger relation. The result is never
    /// empty.
    pub fn region_ids(&self, relation: Relation, sampled_index: u64) -> RegionIds {
        let dimension = self.matrix.dimension_of(relation);
        let bucket = self.matrix.bucket_of(relation, sampled_index);
        self.region_ids_at(dimension, bucket)
    }

    /// Routes a tuple of `relation` at an index drawn from `sampler`.
    pub fn sample_region_ids(&self, relation: Relation, sampler: &mut IndexSampler) -> RegionIds {
        let index = sampler.sample(self.matrix.relation_size(relation));
        self.region_ids(relation, index)
    }

    /// Routes a tuple of `relation` by the hash of its key, so equal keys reach the same workers.
    pub fn hash_region_ids<K: Hash + ?Sized>(
        &self,
        relation: Relation,
        key: &K,
        hasher: &KeyHasher,
    ) -> RegionIds {
        let index = hasher.index_of(key, self.matrix.relation_size(relation));
        self.region_ids(relation, index)
    }

    /// Average number of workers a tuple of `relation` is sent to.
    pub fn replication_factor(&self, relation: Relation) -> f64 {
        let dimension = self.matrix.dimension_of(relation);
        let axis_len = self.matrix.axis_len(dimension);
        let total: usize = (0..axis_len)
            .map(|index| self.region_ids_at(dimension, index).len())
            .sum();
        total as f64 / axis_len as f64
    }
}

impl MatrixAssignment for Partition {
    fn num_workers(&self) -> usize {
        self.num_workers
    }

    fn domain_size(&self, relation: Relation) -> u64 {
        self.matrix.relation_size(relation)
    }

    fn region_ids(&self, relation: Relation, sampled_index: u64) -> RegionIds {
        Partition::region_ids(self, relation, sampled_index)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use itertools::iproduct;
    use smallvec::smallvec;
    use strum::IntoEnumIterator;

    use crate::error::PartitionError;
    use crate::matrix::{Dimension, Relation};
    use crate::partition::{MatrixAssignment, Part, Partition, RegionIds};
    use crate::sampler::{IndexSampler, KeyHasher};
    use crate::strategy::{ExplicitStrategy, GridStrategy, StrategyImpl};
    use crate::test_utils::{build_partition, matrix, oriented_matrix};

    #[test]
    fn test_square_matrix_four_workers() {
        let partition = build_partition(matrix(4, 4), 4, GridStrategy::new());

        assert!(partition.valid());
        assert!(partition.parts().iter().all(|p| p.height() == 2 && p.width() == 2));
        assert_eq!(4, partition.max_area());
        assert_eq!(4, partition.max_half_perimeter());
        assert_eq!(16, partition.sum_half_perimeter());
        assert_eq!(0.25, partition.calculate_cost());
    }

    #[test]
    fn test_tall_matrix_four_workers() {
        let partition = build_partition(matrix(6, 4), 4, GridStrategy::new());

        assert!(partition.valid());
        let heights: Vec<usize> = partition.parts().iter().map(Part::height).collect();
        let widths: Vec<usize> = partition.parts().iter().map(Part::width).collect();
        assert_eq!(vec![3, 3, 3, 3], heights);
        assert_eq!(vec![2, 2, 2, 2], widths);
        assert!(partition.parts().iter().all(|p| p.area() == 6));
    }

    #[test]
    fn test_uneven_matrix_four_workers() {
        let partition = build_partition(matrix(5, 5), 4, GridStrategy::new());

        assert!(partition.valid());
        let areas: Vec<usize> = partition.parts().iter().map(Part::area).collect();
        assert_eq!(vec![9, 6, 6, 4], areas);
        assert_eq!(9, partition.max_area());
        assert_eq!(6, partition.max_half_perimeter());
    }

    #[test]
    fn test_route_s_to_columns_when_s_is_larger() {
        let partition = build_partition(oriented_matrix(4, 4, true), 4, GridStrategy::new());

        assert!(partition.matrix().is_s_greater_than_t());
        let expected: RegionIds = smallvec![0, 2];
        assert_eq!(expected, partition.region_ids(Relation::S, 0));
        assert_eq!(expected, partition.region_ids_at(Dimension::Column, 0));

        // T lays out along rows, row 0 belongs to the first row band.
        let expected: RegionIds = smallvec![0, 1];
        assert_eq!(expected, partition.region_ids(Relation::T, 0));
    }

    #[test]
    fn test_route_s_to_rows_when_s_is_smaller() {
        let partition = build_partition(oriented_matrix(4, 4, false), 4, GridStrategy::new());

        let expected: RegionIds = smallvec![0, 1];
        assert_eq!(expected, partition.region_ids(Relation::S, 0));
        let expected: RegionIds = smallvec![0, 2];
        assert_eq!(expected, partition.region_ids(Relation::T, 0));
        // Last index of T's domain falls into the last column.
        let expected: RegionIds = smallvec![1, 3];
        assert_eq!(expected, partition.region_ids(Relation::T, 1999));
    }

    #[test]
    fn test_single_worker() {
        let partition = build_partition(matrix(3, 5), 1, GridStrategy::new());

        assert!(partition.valid());
        assert_eq!(&Part::new(0, 0, 3, 5), partition.part(0).unwrap());
        assert_eq!(1.0, partition.calculate_cost());

        let mut sampler = IndexSampler::new(Some(1));
        let expected: RegionIds = smallvec![0];
        for relation in Relation::iter() {
            for index in 0..100 {
                assert_eq!(expected, partition.region_ids(relation, index));
            }
            assert_eq!(expected, partition.sample_region_ids(relation, &mut sampler));
        }
    }

    #[test]
    fn test_cost_counts_idle_workers() {
        // A 2 x 2 matrix only has room for four busy workers.
        let partition = build_partition(matrix(2, 2), 6, GridStrategy::new());
        assert_eq!(6, partition.num_workers());
        assert!(partition.valid());
        assert_eq!(4, partition.used_workers());
        assert_eq!(0.25, partition.calculate_cost());

        let slack = build_partition(matrix(4, 5), 5, GridStrategy::with_used_workers(4));
        assert_eq!(1.0 / 4.0, slack.calculate_cost());

        let full = build_partition(matrix(4, 5), 5, GridStrategy::new());
        assert_eq!(5, full.used_workers());
        assert!(full.calculate_cost() < slack.calculate_cost());
    }

    #[test]
    fn test_coverage_and_routing_completeness() {
        for (height, width, workers, s_greater_than_t) in
            iproduct!(1..=6usize, 1..=6usize, 1..=8usize, [false, true])
        {
            let partition = build_partition(
                oriented_matrix(height, width, s_greater_than_t),
                workers,
                GridStrategy::new(),
            );
            assert!(partition.valid());
            assert_eq!(height * width, partition.sum_area());

            let s_dimension = partition.matrix().dimension_of(Relation::S);
            for (row, col) in iproduct!(0..height, 0..width) {
                let worker = partition.worker_of_cell(row, col).unwrap();
                let (s_index, t_index) = match s_dimension {
                    Dimension::Row => (row, col),
                    Dimension::Column => (col, row),
                };
                assert!(partition
                    .region_ids_at(s_dimension, s_index)
                    .contains(&worker));
                assert!(partition
                    .region_ids_at(s_dimension.other(), t_index)
                    .contains(&worker));
            }
        }
    }

    #[test]
    fn test_routing_never_empty() {
        let partition = build_partition(oriented_matrix(5, 3, true), 7, GridStrategy::new());
        let mut sampler = IndexSampler::new(Some(3));
        let hasher = KeyHasher::new();

        for relation in Relation::iter() {
            for index in 0..5000 {
                let ids = partition.region_ids(relation, index);
                assert!(!ids.is_empty());
                assert!(ids.windows(2).all(|w| w[0] < w[1]));
                assert!(ids.iter().all(|id| *id < partition.num_workers()));
            }
            assert!(!partition.sample_region_ids(relation, &mut sampler).is_empty());
            assert!(!partition
                .hash_region_ids(relation, "customer#1", &hasher)
                .is_empty());
        }
    }

    #[test]
    fn test_hash_routing_is_stable() {
        let partition = build_partition(matrix(8, 8), 16, GridStrategy::new());
        let hasher = KeyHasher::new();

        for key in 0..100u64 {
            assert_eq!(
                partition.hash_region_ids(Relation::S, &key, &hasher),
                partition.hash_region_ids(Relation::S, &key, &hasher)
            );
        }
    }

    #[test]
    fn test_matrix_assignment() {
        let partition: Arc<dyn MatrixAssignment> =
            Arc::new(build_partition(matrix(4, 4), 4, GridStrategy::new()));

        assert_eq!(4, partition.num_workers());
        assert_eq!(1000, partition.domain_size(Relation::S));
        assert_eq!(2000, partition.domain_size(Relation::T));
        let expected: RegionIds = smallvec![2, 3];
        assert_eq!(expected, partition.region_ids(Relation::S, 1999));
    }

    #[test]
    fn test_replication_factor() {
        let partition = build_partition(matrix(4, 6), 6, GridStrategy::new());
        // 2 row bands, 3 column bands: a row crosses three parts, a column two.
        assert_eq!(3.0, partition.replication_factor(Relation::S));
        assert_eq!(2.0, partition.replication_factor(Relation::T));
    }

    #[test]
    fn test_reject_zero_workers() {
        let err = Partition::new(matrix(4, 4), 0, GridStrategy::new().into()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PartitionError>(),
            Some(PartitionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_reject_overlapping_parts() {
        let strategy: StrategyImpl =
            ExplicitStrategy::new(vec![Part::new(0, 0, 2, 2), Part::new(1, 0, 1, 2)]).into();
        let err = Partition::new(matrix(2, 2), 2, strategy).unwrap_err();
        assert_eq!(
            Some(&PartitionError::InvalidPartition {
                strategy: "ExplicitStrategy".to_string()
            }),
            err.downcast_ref::<PartitionError>()
        );
    }

    #[test]
    fn test_reject_parts_outside_matrix() {
        let strategy: StrategyImpl =
            ExplicitStrategy::new(vec![Part::new(0, 0, 3, 2), Part::new(5, 5, 4, 4)]).into();
        let err = Partition::new(matrix(2, 2), 2, strategy).unwrap_err();
        assert_eq!(
            Some(&PartitionError::InvalidPartition {
                strategy: "ExplicitStrategy".to_string()
            }),
            err.downcast_ref::<PartitionError>()
        );

        let strategy: StrategyImpl = ExplicitStrategy::new(vec![
            Part::new(0, 0, 2, 2),
            Part::new(usize::MAX, 0, 1, 1),
        ])
        .into();
        assert!(Partition::new(matrix(2, 2), 2, strategy).is_err());
    }

    #[test]
    fn test_zero_area_parts_do_not_count() {
        let strategy: StrategyImpl =
            ExplicitStrategy::new(vec![Part::new(0, 0, 2, 2), Part::new(0, 0, 0, 5)]).into();
        let partition = Partition::new(matrix(2, 2), 2, strategy).unwrap();

        assert_eq!(Some(&Part::empty()), partition.part(1));
        assert_eq!(1, partition.used_workers());
        assert_eq!(2, partition.max_half_perimeter());
        assert_eq!(2, partition.sum_half_perimeter());
        assert_eq!(4, partition.sum_area());
        let expected: RegionIds = smallvec![0];
        assert_eq!(expected, partition.region_ids_at(Dimension::Column, 1));
    }

    #[test]
    fn test_reject_gaps() {
        let strategy: StrategyImpl =
            ExplicitStrategy::new(vec![Part::new(0, 0, 1, 2), Part::empty()]).into();
        assert!(Partition::new(matrix(2, 2), 2, strategy).is_err());
    }

    #[test]
    fn test_reject_wrong_part_count() {
        let strategy: StrategyImpl = ExplicitStrategy::new(vec![Part::new(0, 0, 2, 2)]).into();
        let err = Partition::new(matrix(2, 2), 2, strategy).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PartitionError>(),
            Some(PartitionError::WorkerCountMismatch {
                expected: 2,
                actual: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_accept_explicit_tiling() {
        let strategy: StrategyImpl = ExplicitStrategy::new(vec![
            Part::new(0, 0, 3, 1),
            Part::new(0, 1, 1, 2),
            Part::new(1, 1, 2, 2),
        ])
        .into();
        let partition = Partition::new(matrix(3, 3), 3, strategy).unwrap();

        assert_eq!(Some(0), partition.worker_of_cell(2, 0));
        assert_eq!(Some(1), partition.worker_of_cell(0, 2));
        assert_eq!(Some(2), partition.worker_of_cell(2, 2));
        assert_eq!(4, partition.max_half_perimeter());
        assert_eq!(11, partition.sum_half_perimeter());
    }
}

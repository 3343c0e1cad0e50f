use std::sync::Arc;

use anyhow::anyhow;
use log::debug;

use crate::cost::PartitionCost;
use crate::error::ThetaResult;
use crate::matrix::Matrix;
use crate::partition::Part;
use crate::strategy::{GridStrategy, PartitionStrategy};

/// Picks the cheapest grid among several used-worker counts.
///
/// A plain grid must use the exact factor pair of the worker count, which for a prime count is
/// a single row of bands. Leaving a few workers idle often allows a much squarer grid, and when
/// the matrix is too small for all bands it even increases the number of busy workers. Candidates
/// use between half and all of the workers, the rest get zero-area parts, and they are ranked by
/// [`PartitionCost`]. On a tie the candidate using more workers wins.
#[derive(Clone, Debug, Default)]
pub struct CostOptimizedStrategy {}

impl CostOptimizedStrategy {
    pub fn new() -> Self {
        Self {}
    }
}

impl PartitionStrategy for CostOptimizedStrategy {
    fn generate_partition(
        &self,
        matrix: &Arc<Matrix>,
        num_workers: usize,
    ) -> ThetaResult<Vec<Part>> {
        let min_used_workers = (num_workers + 1) / 2;
        let mut best_cost = PartitionCost::WORST;
        let mut best_parts = None;

        // Grid tilings are valid by construction, only the winner is checked by the partition.
        for used_workers in (min_used_workers.max(1)..=num_workers).rev() {
            let parts = GridStrategy::with_used_workers(used_workers)
                .generate_partition(matrix, num_workers)?;
            let cost = PartitionCost::of(&parts);
            debug!("Candidate grid for {} workers, {}", used_workers, cost);

            if cost < best_cost {
                best_cost = cost;
                best_parts = Some(parts);
            }
        }

        best_parts.ok_or_else(|| anyhow!("No candidate grid for {} workers", num_workers))
    }
}

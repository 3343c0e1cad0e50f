use std::sync::Arc;

use crate::error::ThetaResult;
use crate::matrix::Matrix;
use crate::partition::Part;
use crate::strategy::PartitionStrategy;

/// Places a tiling computed ahead of time, for example one recovered from a previous plan.
///
/// The parts are taken as is; the partition rejects them if they do not cover the matrix.
#[derive(Clone, Debug, Default)]
pub struct ExplicitStrategy {
    parts: Vec<Part>,
}

impl ExplicitStrategy {
    pub fn new(parts: Vec<Part>) -> Self {
        Self { parts }
    }
}

impl PartitionStrategy for ExplicitStrategy {
    fn generate_partition(
        &self,
        _matrix: &Arc<Matrix>,
        _num_workers: usize,
    ) -> ThetaResult<Vec<Part>> {
        Ok(self.parts.clone())
    }
}

use std::sync::Arc;

use crate::matrix::Matrix;
use crate::partition::Partition;
use crate::strategy::StrategyImpl;

/// Matrix with `S` on rows.
pub fn matrix(height: usize, width: usize) -> Arc<Matrix> {
    oriented_matrix(height, width, false)
}

pub fn oriented_matrix(height: usize, width: usize, s_greater_than_t: bool) -> Arc<Matrix> {
    let (size_of_s, size_of_t) = if s_greater_than_t {
        (2000, 1000)
    } else {
        (1000, 2000)
    };

    Arc::new(
        Matrix::builder()
            .height(height)
            .width(width)
            .size_of_s(size_of_s)
            .size_of_t(size_of_t)
            .build()
            .unwrap(),
    )
}

pub fn build_partition<S: Into<StrategyImpl>>(
    matrix: Arc<Matrix>,
    num_workers: usize,
    strategy: S,
) -> Partition {
    Partition::new(matrix, num_workers, strategy.into()).unwrap()
}

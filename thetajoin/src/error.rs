use thiserror::Error;

pub type ThetaResult<T> = anyhow::Result<T>;

/// Failures that abort planning of a theta-join.
///
/// Routing never fails, so every variant here is raised while a partition is being built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PartitionError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Strategy {strategy} produced a partition that does not cover the matrix exactly once")]
    InvalidPartition { strategy: String },
    #[error("Strategy {strategy} produced {actual} parts for {expected} workers")]
    WorkerCountMismatch {
        strategy: String,
        expected: usize,
        actual: usize,
    },
}

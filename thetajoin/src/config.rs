//! Construction contract of a theta-join partition.
//!
//! ```yaml
//! num_workers: 16
//! matrix:
//!   height: 64
//!   width: 64
//!   size_of_s: 150000
//!   size_of_t: 6000000
//! strategy: cost_optimized
//! seed: 42
//! ```

use std::io::Read;
use std::sync::Arc;

use anyhow::Context;
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::ThetaResult;
use crate::matrix::Matrix;
use crate::partition::Partition;
use crate::sampler::IndexSampler;
use crate::strategy::{CostOptimizedStrategy, GridStrategy, StrategyImpl};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MatrixConfig {
    /// Buckets along the row axis.
    pub height: usize,
    /// Buckets along the column axis.
    pub width: usize,
    /// Estimated cardinality of `S`.
    pub size_of_s: u64,
    /// Estimated cardinality of `T`.
    pub size_of_t: u64,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    Grid,
    CostOptimized,
}

impl From<StrategyKind> for StrategyImpl {
    fn from(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::Grid => GridStrategy::new().into(),
            StrategyKind::CostOptimized => CostOptimizedStrategy::new().into(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ThetaJoinConfig {
    pub num_workers: usize,
    pub matrix: MatrixConfig,
    #[serde(default)]
    pub strategy: StrategyKind,
    /// Seed of the routing sampler. Unseeded samplers draw from entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl ThetaJoinConfig {
    pub fn from_yaml_str(yaml: &str) -> ThetaResult<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse theta join config")
    }

    pub fn from_reader<R: Read>(reader: R) -> ThetaResult<Self> {
        serde_yaml::from_reader(reader).context("Failed to read theta join config")
    }

    pub fn build_matrix(&self) -> ThetaResult<Matrix> {
        Matrix::builder()
            .height(self.matrix.height)
            .width(self.matrix.width)
            .size_of_s(self.matrix.size_of_s)
            .size_of_t(self.matrix.size_of_t)
            .build()
    }

    pub fn build_partition(&self) -> ThetaResult<Partition> {
        let matrix = Arc::new(self.build_matrix()?);
        let partition = Partition::new(matrix, self.num_workers, self.strategy.into())?;
        info!(
            "Planned theta join on {} workers, {}",
            partition.num_workers(),
            partition.cost()
        );
        Ok(partition)
    }

    pub fn sampler(&self) -> IndexSampler {
        IndexSampler::new(self.seed)
    }
}

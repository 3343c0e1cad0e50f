//! Tiling strategies.
//!
//! A strategy decides how the cells of a [`Matrix`] are split among workers. It runs exactly once,
//! while a [`Partition`](crate::partition::Partition) is constructed, and must return one
//! [`Part`] per worker such that every cell is covered by exactly one part. The partition
//! re-checks this and refuses to be built from a broken tiling.
//!
//! Strategies are chosen explicitly through [`StrategyImpl`]:
//!
//! 1. [`GridStrategy`] cuts the matrix into a grid of row bands and column bands, as square as
//! the worker count permits.
//! 2. [`CostOptimizedStrategy`] tries grids over several used-worker counts, leaving the rest
//! idle, and keeps the cheapest according to [`PartitionCost`](crate::cost::PartitionCost).
//! 3. [`ExplicitStrategy`] places a tiling computed elsewhere.
mod cost_optimized;
pub use cost_optimized::*;
mod explicit;
pub use explicit::*;
mod grid;
pub use grid::*;

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use enum_dispatch::enum_dispatch;
use strum_macros::AsRefStr;

use crate::error::ThetaResult;
use crate::matrix::Matrix;
use crate::partition::Part;

#[enum_dispatch(StrategyImpl)]
pub trait PartitionStrategy {
    /// Tile `matrix` for `num_workers` workers.
    ///
    /// The returned vector is indexed by worker id.
    fn generate_partition(
        &self,
        matrix: &Arc<Matrix>,
        num_workers: usize,
    ) -> ThetaResult<Vec<Part>>;
}

#[enum_dispatch]
#[derive(Clone, AsRefStr)]
pub enum StrategyImpl {
    GridStrategy,
    CostOptimizedStrategy,
    ExplicitStrategy,
}

impl Default for StrategyImpl {
    fn default() -> Self {
        GridStrategy::new().into()
    }
}

impl Debug for StrategyImpl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

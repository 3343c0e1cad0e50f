//! Defines cost of a partition.

use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

use derive_more::{Display, From};

use crate::partition::Part;

pub const INF: Cost = Cost(f64::INFINITY);

#[derive(Copy, Clone, Debug, PartialOrd, PartialEq, From, Display)]
#[display(fmt = "{:.4}", _0)]
pub struct Cost(f64);

impl Cost {
    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Everything used to rank candidate partitions of the same matrix and worker count.
///
/// Candidates are compared field by field in declaration order: utilization first, then the
/// load of the busiest worker, then the worst and the total replication.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PartitionCost {
    pub utilization: Cost,
    pub max_area: usize,
    pub max_half_perimeter: usize,
    pub sum_half_perimeter: usize,
}

impl PartitionCost {
    /// Worse than the cost of any tiling with at least one busy worker.
    pub const WORST: PartitionCost = PartitionCost {
        utilization: INF,
        max_area: usize::MAX,
        max_half_perimeter: usize::MAX,
        sum_half_perimeter: usize::MAX,
    };

    /// Cost of a tiling given as one part per worker. Zero-area parts count as idle workers.
    pub fn of(parts: &[Part]) -> Self {
        let busy = || parts.iter().filter(|p| !p.is_empty());
        Self {
            utilization: Cost::from(1.0 / busy().count() as f64),
            max_area: busy().map(Part::area).max().unwrap_or(0),
            max_half_perimeter: busy().map(Part::half_perimeter).max().unwrap_or(0),
            sum_half_perimeter: busy().map(Part::half_perimeter).sum(),
        }
    }
}

impl PartialOrd for PartitionCost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.utilization.partial_cmp(&other.utilization)? {
            Ordering::Equal => Some(
                (
                    self.max_area,
                    self.max_half_perimeter,
                    self.sum_half_perimeter,
                )
                    .cmp(&(
                        other.max_area,
                        other.max_half_perimeter,
                        other.sum_half_perimeter,
                    )),
            ),
            ord => Some(ord),
        }
    }
}

impl Display for PartitionCost {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cost: {}, max area: {}, max half perimeter: {}, sum half perimeter: {}",
            self.utilization,
            self.max_area,
            self.max_half_perimeter,
            self.sum_half_perimeter
        )
    }
}

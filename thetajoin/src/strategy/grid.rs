use std::iter::repeat;
use std::sync::Arc;

use anyhow::ensure;
use log::debug;

use crate::error::{PartitionError, ThetaResult};
use crate::matrix::Matrix;
use crate::partition::Part;
use crate::strategy::PartitionStrategy;

/// Cuts the matrix into `row_bands x col_bands` rectangles.
///
/// The band counts are the factor pair of the worker count closest to a square, since for a fixed
/// area a square has the smallest perimeter. Worker `i` gets the rectangle at grid position
/// `(i / col_bands, i % col_bands)`. Bands that would be empty, because there are more bands than
/// rows or columns, produce zero-area parts.
#[derive(Clone, Debug, Default)]
pub struct GridStrategy {
    /// Workers that take part in the grid; the remaining ones are left idle.
    used_workers: Option<usize>,
}

impl GridStrategy {
    pub fn new() -> Self {
        Self { used_workers: None }
    }

    /// Tile for `used_workers` workers only, and give every other worker a zero-area part.
    pub fn with_used_workers(used_workers: usize) -> Self {
        Self {
            used_workers: Some(used_workers),
        }
    }

    pub fn used_workers(&self) -> Option<usize> {
        self.used_workers
    }

    /// Factor pair `(row_bands, col_bands)` of `num_workers` minimizing their difference, with
    /// `row_bands <= col_bands`.
    pub fn bands(num_workers: usize) -> (usize, usize) {
        (1..=num_workers)
            .take_while(|r| r * r <= num_workers)
            .filter(|r| num_workers % r == 0)
            .last()
            .map(|r| (r, num_workers / r))
            .unwrap_or((1, num_workers))
    }

    /// Splits `len` into `bands` contiguous `(origin, extent)` ranges, the first `len % bands` of
    /// them one longer than the rest.
    pub fn split_evenly(len: usize, bands: usize) -> Vec<(usize, usize)> {
        let base = len / bands;
        let extra = len % bands;

        (0..bands)
            .scan(0, |origin, band| {
                let extent = if band < extra { base + 1 } else { base };
                let range = (*origin, extent);
                *origin += extent;
                Some(range)
            })
            .collect()
    }
}

impl PartitionStrategy for GridStrategy {
    fn generate_partition(
        &self,
        matrix: &Arc<Matrix>,
        num_workers: usize,
    ) -> ThetaResult<Vec<Part>> {
        let used_workers = self.used_workers.unwrap_or(num_workers);
        ensure!(
            used_workers > 0 && used_workers <= num_workers,
            PartitionError::InvalidConfig(format!(
                "grid can not use {} of {} workers",
                used_workers, num_workers
            ))
        );

        let (row_bands, col_bands) = Self::bands(used_workers);
        debug!(
            "Grid of {} x {} bands for {} of {} workers",
            row_bands, col_bands, used_workers, num_workers
        );

        let rows = Self::split_evenly(matrix.height(), row_bands);
        let cols = Self::split_evenly(matrix.width(), col_bands);

        let parts = (0..used_workers)
            .map(|worker| {
                let (row_origin, height) = rows[worker / col_bands];
                let (col_origin, width) = cols[worker % col_bands];
                if height == 0 || width == 0 {
                    Part::empty()
                } else {
                    Part::new(row_origin, col_origin, height, width)
                }
            })
            .chain(repeat(Part::empty()).take(num_workers - used_workers))
            .collect();

        Ok(parts)
    }
}

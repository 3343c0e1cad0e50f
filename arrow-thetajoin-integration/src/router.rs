use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray, UInt32Array};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use thetajoin::error::ThetaResult;
use thetajoin::matrix::Relation;
use thetajoin::partition::MatrixAssignment;
use thetajoin::sampler::{IndexSampler, KeyHasher};

use crate::error::ExecutionError;
use crate::utils::take_rows;

/// How a row picks its index in the domain of its relation.
#[derive(Clone, Debug)]
pub enum RoutingMode {
    /// Every row draws a fresh random index.
    Random(IndexSampler),
    /// Rows are placed by the hash of one key column, so equal keys always reach the same
    /// workers. Integer, float and utf8 keys are supported.
    HashKey { column: usize, hasher: KeyHasher },
}

/// Splits batches of one relation by destination worker.
pub struct BatchRouter {
    assignment: Arc<dyn MatrixAssignment>,
    relation: Relation,
    mode: RoutingMode,
}

impl BatchRouter {
    pub fn new(
        assignment: Arc<dyn MatrixAssignment>,
        relation: Relation,
        mode: RoutingMode,
    ) -> Self {
        Self {
            assignment,
            relation,
            mode,
        }
    }

    pub fn random(
        assignment: Arc<dyn MatrixAssignment>,
        relation: Relation,
        seed: Option<u64>,
    ) -> Self {
        Self::new(assignment, relation, RoutingMode::Random(IndexSampler::new(seed)))
    }

    pub fn hashed(
        assignment: Arc<dyn MatrixAssignment>,
        relation: Relation,
        column: usize,
    ) -> Self {
        Self::new(
            assignment,
            relation,
            RoutingMode::HashKey {
                column,
                hasher: KeyHasher::new(),
            },
        )
    }

    pub fn relation(&self) -> Relation {
        self.relation
    }

    /// Row indices of `batch` that every worker must receive.
    pub fn route_rows(&mut self, batch: &RecordBatch) -> ThetaResult<Vec<Vec<u32>>> {
        let domain_size = self.assignment.domain_size(self.relation);
        let indices: Vec<u64> = match &mut self.mode {
            RoutingMode::Random(sampler) => (0..batch.num_rows())
                .map(|_| sampler.sample(domain_size))
                .collect(),
            RoutingMode::HashKey { column, hasher } => {
                ensure_column(batch, *column)?;
                key_indices(batch.column(*column), *column, domain_size, hasher)?
            }
        };

        let mut rows = vec![vec![]; self.assignment.num_workers()];
        for (row, index) in indices.into_iter().enumerate() {
            for worker in self.assignment.region_ids(self.relation, index) {
                rows[worker].push(row as u32);
            }
        }
        Ok(rows)
    }

    /// Sub-batch for every worker, `None` for workers that receive no row of `batch`.
    pub fn route(&mut self, batch: &RecordBatch) -> ThetaResult<Vec<Option<RecordBatch>>> {
        self.route_rows(batch)?
            .into_iter()
            .map(|rows| {
                if rows.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(take_rows(batch, &UInt32Array::from(rows))?))
                }
            })
            .collect()
    }
}

fn ensure_column(batch: &RecordBatch, column: usize) -> ThetaResult<()> {
    if column >= batch.num_columns() {
        return Err(ExecutionError::MissingKey {
            column,
            num_columns: batch.num_columns(),
        }
        .into());
    }
    Ok(())
}

fn key_indices(
    array: &ArrayRef,
    column: usize,
    domain_size: u64,
    hasher: &KeyHasher,
) -> ThetaResult<Vec<u64>> {
    match array.data_type() {
        DataType::Utf8 => {
            let keys = downcast::<StringArray>(array, column)?;
            Ok(keys
                .iter()
                .map(|key| hasher.index_of(&key, domain_size))
                .collect())
        }
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::Date32
        | DataType::Date64 => {
            let keys = cast(array, &DataType::Int64)?;
            let keys = downcast::<Int64Array>(&keys, column)?;
            Ok(keys
                .iter()
                .map(|key| hasher.index_of(&key, domain_size))
                .collect())
        }
        DataType::Float32 | DataType::Float64 => {
            let keys = cast(array, &DataType::Float64)?;
            let keys = downcast::<Float64Array>(&keys, column)?;
            Ok(keys
                .iter()
                .map(|key| hasher.index_of(&key.map(f64::to_bits), domain_size))
                .collect())
        }
        other => Err(ExecutionError::UnsupportedKey {
            column,
            data_type: other.clone(),
        }
        .into()),
    }
}

fn downcast<A: Array + 'static>(array: &ArrayRef, column: usize) -> ThetaResult<&A> {
    array.as_any().downcast_ref::<A>().ok_or_else(|| {
        ExecutionError::UnsupportedKey {
            column,
            data_type: array.data_type().clone(),
        }
        .into()
    })
}

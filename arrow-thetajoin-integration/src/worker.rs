use std::sync::Arc;

use arrow::array::UInt32Array;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use log::trace;
use thetajoin::error::ThetaResult;
use thetajoin::matrix::Relation;

use crate::utils::take_rows;

/// Join predicate, tested on row `s_row` of an `S` batch and row `t_row` of a `T` batch.
///
/// The worker knows nothing about the predicate beyond its result.
pub type ThetaPredicate =
    Arc<dyn Fn(&RecordBatch, usize, &RecordBatch, usize) -> bool + Send + Sync>;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub worker: usize,
    pub s_rows: usize,
    pub t_rows: usize,
    pub output_rows: usize,
}

/// Symmetric nested loop join over the tuples routed to one worker.
///
/// Each arriving batch is joined with everything already received from the other relation and
/// then kept, so every pair is produced exactly once regardless of arrival order.
pub struct JoinWorker {
    output_schema: SchemaRef,
    predicate: ThetaPredicate,
    s_batches: Vec<RecordBatch>,
    t_batches: Vec<RecordBatch>,
    stats: WorkerStats,
}

impl JoinWorker {
    /// `output_schema` holds the columns of `S` followed by the columns of `T`.
    pub fn new(worker: usize, output_schema: SchemaRef, predicate: ThetaPredicate) -> Self {
        Self {
            output_schema,
            predicate,
            s_batches: vec![],
            t_batches: vec![],
            stats: WorkerStats {
                worker,
                ..Default::default()
            },
        }
    }

    pub fn stats(&self) -> &WorkerStats {
        &self.stats
    }

    pub fn into_stats(self) -> WorkerStats {
        self.stats
    }

    /// Joins `batch` of `relation` with the stored tuples of the other relation.
    pub fn insert(
        &mut self,
        relation: Relation,
        batch: RecordBatch,
    ) -> ThetaResult<Vec<RecordBatch>> {
        let mut outputs = vec![];
        match relation {
            Relation::S => {
                self.stats.s_rows += batch.num_rows();
                for t_batch in &self.t_batches {
                    outputs.extend(self.probe(&batch, t_batch)?);
                }
                self.s_batches.push(batch);
            }
            Relation::T => {
                self.stats.t_rows += batch.num_rows();
                for s_batch in &self.s_batches {
                    outputs.extend(self.probe(s_batch, &batch)?);
                }
                self.t_batches.push(batch);
            }
        }

        self.stats.output_rows += outputs.iter().map(RecordBatch::num_rows).sum::<usize>();
        Ok(outputs)
    }

    fn probe(
        &self,
        s_batch: &RecordBatch,
        t_batch: &RecordBatch,
    ) -> ThetaResult<Option<RecordBatch>> {
        let mut s_indices = vec![];
        let mut t_indices = vec![];
        for s_row in 0..s_batch.num_rows() {
            for t_row in 0..t_batch.num_rows() {
                if (self.predicate)(s_batch, s_row, t_batch, t_row) {
                    s_indices.push(s_row as u32);
                    t_indices.push(t_row as u32);
                }
            }
        }

        trace!(
            "Worker {} matched {} of {} x {} pairs",
            self.stats.worker,
            s_indices.len(),
            s_batch.num_rows(),
            t_batch.num_rows()
        );
        if s_indices.is_empty() {
            return Ok(None);
        }

        let s_matched = take_rows(s_batch, &UInt32Array::from(s_indices))?;
        let t_matched = take_rows(t_batch, &UInt32Array::from(t_indices))?;
        let columns = s_matched
            .columns()
            .iter()
            .chain(t_matched.columns().iter())
            .cloned()
            .collect();

        Ok(Some(RecordBatch::try_new(self.output_schema.clone(), columns)?))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{Array, Int64Array};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::RecordBatch;
    use thetajoin::matrix::Relation;

    use crate::utils::join_schema;
    use crate::worker::{JoinWorker, ThetaPredicate, WorkerStats};

    fn batch(name: &str, values: Vec<i64>) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![Field::new(name, DataType::Int64, false)]));
        RecordBatch::try_new(schema, vec![Arc::new(Int64Array::from(values))]).unwrap()
    }

    fn value(batch: &RecordBatch, column: usize, row: usize) -> i64 {
        batch
            .column(column)
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap()
            .value(row)
    }

    fn less_than() -> ThetaPredicate {
        Arc::new(|s: &RecordBatch, s_row, t: &RecordBatch, t_row| {
            value(s, 0, s_row) < value(t, 0, t_row)
        })
    }

    fn worker() -> JoinWorker {
        let schema = join_schema(
            batch("s", vec![]).schema().as_ref(),
            batch("t", vec![]).schema().as_ref(),
        );
        JoinWorker::new(3, schema, less_than())
    }

    fn pairs(outputs: &[RecordBatch]) -> Vec<(i64, i64)> {
        let mut pairs: Vec<(i64, i64)> = outputs
            .iter()
            .flat_map(|b| (0..b.num_rows()).map(move |row| (value(b, 0, row), value(b, 1, row))))
            .collect();
        pairs.sort_unstable();
        pairs
    }

    #[test]
    fn test_symmetric_join() {
        let mut worker = worker();

        assert!(worker
            .insert(Relation::S, batch("s", vec![1, 5]))
            .unwrap()
            .is_empty());
        let first = worker.insert(Relation::T, batch("t", vec![2, 6])).unwrap();
        assert_eq!(vec![(1, 2), (1, 6), (5, 6)], pairs(&first));

        let second = worker.insert(Relation::S, batch("s", vec![0])).unwrap();
        assert_eq!(vec![(0, 2), (0, 6)], pairs(&second));

        assert_eq!(
            &WorkerStats {
                worker: 3,
                s_rows: 3,
                t_rows: 2,
                output_rows: 5,
            },
            worker.stats()
        );
    }

    #[test]
    fn test_arrival_order_does_not_matter() {
        let mut s_first = worker();
        let mut t_first = worker();

        let mut a = s_first.insert(Relation::S, batch("s", vec![3, 4])).unwrap();
        a.extend(s_first.insert(Relation::T, batch("t", vec![1, 5])).unwrap());
        let mut b = t_first.insert(Relation::T, batch("t", vec![1, 5])).unwrap();
        b.extend(t_first.insert(Relation::S, batch("s", vec![3, 4])).unwrap());

        assert_eq!(pairs(&a), pairs(&b));
        assert_eq!(vec![(3, 5), (4, 5)], pairs(&a));
        assert_eq!(2, a[0].num_columns());
        assert_eq!(2, a.iter().map(|b| b.column(0).len()).sum::<usize>());
    }

    #[test]
    fn test_no_match_produces_no_batch() {
        let mut worker = worker();
        worker.insert(Relation::T, batch("t", vec![0])).unwrap();
        assert!(worker
            .insert(Relation::S, batch("s", vec![10, 20]))
            .unwrap()
            .is_empty());
        assert_eq!(0, worker.into_stats().output_rows);
    }
}

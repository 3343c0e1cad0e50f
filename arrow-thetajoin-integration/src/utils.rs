use arrow::array::{ArrayRef, UInt32Array};
use arrow::compute::take;
use arrow::datatypes::{FieldRef, Schema, SchemaRef};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

/// Rows of `batch` at `indices`, in that order.
pub(crate) fn take_rows(
    batch: &RecordBatch,
    indices: &UInt32Array,
) -> Result<RecordBatch, ArrowError> {
    let columns = batch
        .columns()
        .iter()
        .map(|c| take(c.as_ref(), indices, None))
        .collect::<Result<Vec<ArrayRef>, ArrowError>>()?;
    RecordBatch::try_new(batch.schema(), columns)
}

/// Columns of `S` followed by columns of `T`.
pub(crate) fn join_schema(s_schema: &Schema, t_schema: &Schema) -> SchemaRef {
    let fields = s_schema
        .fields()
        .iter()
        .chain(t_schema.fields().iter())
        .cloned()
        .collect::<Vec<FieldRef>>();
    Arc::new(Schema::new(fields))
}

use arrow::datatypes::DataType;
use thetajoin::matrix::Relation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Batch of relation {relation} does not match the schema of the join input")]
    SchemaMismatch { relation: Relation },
    #[error("Routing key column {column} of type {data_type} is not supported")]
    UnsupportedKey { column: usize, data_type: DataType },
    #[error("Routing key column {column} is out of bounds for {num_columns} columns")]
    MissingKey { column: usize, num_columns: usize },
    #[error("Worker {0} stopped before the input was exhausted")]
    WorkerGone(usize),
}

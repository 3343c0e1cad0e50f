//! Theta-join execution over arrow record batches.
//!
//! This crate is the consumer side of [`thetajoin`]: it routes every incoming batch of `S` or `T`
//! to the workers chosen by a [`MatrixAssignment`](thetajoin::partition::MatrixAssignment), and
//! runs an ordinary nested loop join at each worker with a predicate supplied by the caller. The
//! partition guarantees that every pair of tuples meets at exactly one worker, so the union of
//! the worker outputs is the join result, without duplicates.
//!
//! * [`router`] Splits batches by destination worker.
//! * [`worker`] Symmetric nested loop join on one worker.
//! * [`executor`] Runs all workers concurrently on tokio tasks.

pub mod error;
pub mod executor;
pub mod router;
mod utils;
pub mod worker;

use std::sync::Arc;

use anyhow::ensure;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use futures::future::try_join_all;
use futures::{Stream, StreamExt};
use itertools::Itertools;
use log::{debug, info};
use thetajoin::error::ThetaResult;
use thetajoin::matrix::Relation;
use thetajoin::partition::{MatrixAssignment, Partition};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::ExecutionError;
use crate::router::BatchRouter;
use crate::utils::join_schema;
use crate::worker::{JoinWorker, ThetaPredicate, WorkerStats};

const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// How routers of both relations pick domain indices.
#[derive(Clone, Debug)]
pub enum Routing {
    /// Random indices. The `T` router uses the successor of the seed.
    Random { seed: Option<u64> },
    /// Hash of a key column of each relation.
    HashKey { s_column: usize, t_column: usize },
}

impl Default for Routing {
    fn default() -> Self {
        Routing::Random { seed: None }
    }
}

#[derive(Debug)]
pub struct JoinResult {
    pub batches: Vec<RecordBatch>,
    /// Indexed by worker id.
    pub stats: Vec<WorkerStats>,
}

impl JoinResult {
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }
}

type WorkerSender = mpsc::Sender<(Relation, RecordBatch)>;
type WorkerHandle = JoinHandle<ThetaResult<(Vec<RecordBatch>, WorkerStats)>>;

/// Runs a theta-join with one tokio task per worker.
///
/// Input batches are split by a [`BatchRouter`] per relation and sent to the workers over
/// bounded channels. The partition is shared by both routers and never locked.
pub struct ThetaJoinExecutor {
    partition: Arc<Partition>,
    s_schema: SchemaRef,
    t_schema: SchemaRef,
    predicate: ThetaPredicate,
    routing: Routing,
    channel_capacity: usize,
}

impl ThetaJoinExecutor {
    pub fn new(
        partition: Arc<Partition>,
        s_schema: SchemaRef,
        t_schema: SchemaRef,
        predicate: ThetaPredicate,
    ) -> Self {
        Self {
            partition,
            s_schema,
            t_schema,
            predicate,
            routing: Routing::default(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    pub fn with_routing(mut self, routing: Routing) -> Self {
        self.routing = routing;
        self
    }

    pub fn with_channel_capacity(mut self, channel_capacity: usize) -> Self {
        self.channel_capacity = channel_capacity.max(1);
        self
    }

    pub fn output_schema(&self) -> SchemaRef {
        join_schema(&self.s_schema, &self.t_schema)
    }

    /// Consumes `input` and returns the join result once every worker has finished.
    ///
    /// Must be called within a tokio runtime.
    pub async fn execute<S>(&self, mut input: S) -> ThetaResult<JoinResult>
    where
        S: Stream<Item = (Relation, RecordBatch)> + Unpin,
    {
        let (mut s_router, mut t_router) = self.routers();
        let (senders, mut handles) = self.spawn_workers();

        while let Some((relation, batch)) = input.next().await {
            let expected_schema = match relation {
                Relation::S => &self.s_schema,
                Relation::T => &self.t_schema,
            };
            ensure!(
                batch.schema() == *expected_schema,
                ExecutionError::SchemaMismatch { relation }
            );

            let router = match relation {
                Relation::S => &mut s_router,
                Relation::T => &mut t_router,
            };
            for (worker, routed) in router.route(&batch)?.into_iter().enumerate() {
                if let Some(routed) = routed {
                    if senders[worker].send((relation, routed)).await.is_err() {
                        return Err(worker_failure(worker, handles.swap_remove(worker)).await);
                    }
                }
            }
        }

        // Closing the channels tells the workers that the input is exhausted.
        drop(senders);

        let mut batches = vec![];
        let mut stats = vec![];
        for result in try_join_all(handles).await? {
            let (worker_batches, worker_stats) = result?;
            batches.extend(worker_batches);
            stats.push(worker_stats);
        }

        info!(
            "Theta join finished, received S: {}, T: {}, output: {} rows, per worker: [{}]",
            stats.iter().map(|s| s.s_rows).sum::<usize>(),
            stats.iter().map(|s| s.t_rows).sum::<usize>(),
            stats.iter().map(|s| s.output_rows).sum::<usize>(),
            stats.iter().map(|s| s.output_rows).join(", ")
        );

        Ok(JoinResult { batches, stats })
    }

    fn routers(&self) -> (BatchRouter, BatchRouter) {
        let assignment: Arc<dyn MatrixAssignment> = self.partition.clone();
        match &self.routing {
            Routing::Random { seed } => (
                BatchRouter::random(assignment.clone(), Relation::S, *seed),
                BatchRouter::random(assignment, Relation::T, seed.map(|s| s.wrapping_add(1))),
            ),
            Routing::HashKey { s_column, t_column } => (
                BatchRouter::hashed(assignment.clone(), Relation::S, *s_column),
                BatchRouter::hashed(assignment, Relation::T, *t_column),
            ),
        }
    }

    fn spawn_workers(&self) -> (Vec<WorkerSender>, Vec<WorkerHandle>) {
        let output_schema = self.output_schema();

        (0..self.partition.num_workers())
            .map(|worker| {
                let (tx, mut rx): (WorkerSender, _) = mpsc::channel(self.channel_capacity);
                let mut join_worker =
                    JoinWorker::new(worker, output_schema.clone(), self.predicate.clone());

                let handle = tokio::spawn(async move {
                    let mut outputs = vec![];
                    while let Some((relation, batch)) = rx.recv().await {
                        outputs.extend(join_worker.insert(relation, batch)?);
                    }
                    debug!("Worker {} done, {:?}", worker, join_worker.stats());
                    Ok::<_, anyhow::Error>((outputs, join_worker.into_stats()))
                });

                (tx, handle)
            })
            .unzip()
    }
}

/// Error of a worker whose channel closed before the input was exhausted.
async fn worker_failure(worker: usize, handle: WorkerHandle) -> anyhow::Error {
    match handle.await {
        Ok(Err(e)) => e.context(format!("Worker {} failed", worker)),
        Err(e) => anyhow::Error::new(e).context(format!("Worker {} failed", worker)),
        Ok(Ok(_)) => ExecutionError::WorkerGone(worker).into(),
    }
}

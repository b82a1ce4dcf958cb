use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use super::models::{Job, RunContext};
use super::traits::EntityIndex;
use crate::{Error, Result};

/// A fixed-size set of workers draining a bounded job queue.
///
/// The queue capacity equals the worker count, so a producer dispatching into
/// a busy pool blocks until a worker frees up; that backpressure is what keeps
/// the history walk from outrunning entity processing.
pub struct WorkerPool {
    tx: mpsc::Sender<Job>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `size` workers. The pool must be started before any job is
    /// dispatched and closed only after the last dispatch.
    #[tracing::instrument(level = "debug", skip(indexes))]
    pub fn start(ctx: RunContext, size: usize, indexes: Arc<Vec<Arc<dyn EntityIndex>>>) -> Self {
        let (tx, rx) = mpsc::channel::<Job>(size.max(1));
        let rx = Arc::new(Mutex::new(rx));

        let workers = (0..size)
            .map(|worker| {
                let rx = Arc::clone(&rx);
                let indexes = Arc::clone(&indexes);
                tokio::spawn(run_worker(ctx, worker, rx, indexes))
            })
            .collect();

        Self { tx, workers }
    }

    /// Enqueue a job, suspending while the queue is full.
    pub async fn dispatch(&self, job: Job) -> Result<()> {
        self.tx
            .send(job)
            .await
            .map_err(|_| Error::message("job queue closed"))
    }

    /// Close the queue and block until every queued and in-flight job has
    /// been consumed and all workers have exited.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn close_and_drain(self) {
        drop(self.tx);
        for handle in self.workers {
            if let Err(error) = handle.await {
                tracing::error!(error = %error, "index worker panicked");
            }
        }
    }
}

async fn run_worker(
    ctx: RunContext,
    worker: usize,
    rx: Arc<Mutex<mpsc::Receiver<Job>>>,
    indexes: Arc<Vec<Arc<dyn EntityIndex>>>,
) {
    loop {
        // Hold the receiver lock only while waiting for the next job; the
        // guard drops before processing starts so siblings can pick up work.
        let job = { rx.lock().await.recv().await };
        let Some(job) = job else {
            return;
        };

        for index in indexes.iter() {
            if let Err(error) = index.process(&ctx, &job.entity_type, &job.entity_id).await {
                tracing::warn!(
                    epoch = ctx.epoch,
                    worker,
                    index = index.name(),
                    entity_id = %job.entity_id,
                    error = %error,
                    "index job failed"
                );
            }
        }
    }
}

//! Admission control for solver calls.
//!
//! A fixed pool of workers pulls tasks from a rendezvous channel with no
//! buffer, so a submission only goes through once an idle worker takes it.
//! That is what caps the number of concurrently running solver processes.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::error::EngineError;

/// One deferred call. The job sends its own result to the submitter.
struct Task {
    job: BoxFuture<'static, ()>,
}

impl Task {
    fn new<T, F>(
        job: F,
        done: oneshot::Sender<Result<T, EngineError>>,
        active: Arc<AtomicUsize>,
    ) -> Self
    where
        T: Send + 'static,
        F: Future<Output = Result<T, EngineError>> + Send + 'static,
    {
        let job = async move {
            // The submitter timed out after handing this over; nobody is listening.
            if done.is_closed() {
                debug!("skipping abandoned task");
                return;
            }
            let output = {
                let _running = Running::enter(active);
                job.await
            };
            let _ = done.send(output);
        };
        Self { job: job.boxed() }
    }
}

/// Counts a task as active until dropped, including on panic.
struct Running(Arc<AtomicUsize>);

impl Running {
    fn enter(active: Arc<AtomicUsize>) -> Self {
        active.fetch_add(1, Ordering::SeqCst);
        Self(active)
    }
}

impl Drop for Running {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Fixed-size worker pool. Must be created inside a tokio runtime.
pub struct Scheduler {
    tx: flume::Sender<Task>,
    // Keeps the channel connected when there are no workers.
    _rx: flume::Receiver<Task>,
    shutdown: watch::Sender<bool>,
    closed: AtomicBool,
    active: Arc<AtomicUsize>,
    workers: usize,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Scheduler {
    /// Spawn `workers` long-lived workers. With zero workers every
    /// submission waits out its deadline and fails with a queue timeout.
    pub fn new(workers: usize) -> Self {
        let (tx, rx) = flume::bounded(0);
        let (shutdown, _) = watch::channel(false);
        let active = Arc::new(AtomicUsize::new(0));

        if workers == 0 {
            warn!("scheduler started with no workers, every call will time out");
        }

        let handles = (0..workers)
            .map(|id| tokio::spawn(worker(id, rx.clone(), shutdown.subscribe())))
            .collect();

        Self {
            tx,
            _rx: rx,
            shutdown,
            closed: AtomicBool::new(false),
            active,
            workers,
            handles: Mutex::new(handles),
        }
    }

    /// Number of workers the pool was built with.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Tasks currently being run by a worker.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Hand `job` to an idle worker and wait for its result.
    ///
    /// Fails with [`EngineError::QueueTimeout`] if no worker accepts the job
    /// before `deadline`. Once accepted, waits for the job without a timer;
    /// the job is expected to honour `deadline` itself.
    pub async fn submit<T, F>(&self, deadline: Instant, job: F) -> Result<T, EngineError>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, EngineError>> + Send + 'static,
    {
        if self.is_closed() {
            return Err(EngineError::Closed);
        }

        let (done_tx, done_rx) = oneshot::channel();
        let task = Task::new(job, done_tx, Arc::clone(&self.active));

        match tokio::time::timeout_at(deadline, self.tx.send_async(task)).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => return Err(EngineError::Closed),
            Err(_) => {
                warn!(workers = self.workers, "no worker became free before the deadline");
                return Err(EngineError::QueueTimeout);
            }
        }

        done_rx.await.map_err(|_| {
            if self.is_closed() {
                EngineError::Closed
            } else {
                EngineError::WorkerLost
            }
        })?
    }

    /// Stop accepting work. Workers exit after their current task.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.shutdown.send_replace(true);
        info!(workers = self.workers, "scheduler closed");
    }

    /// Close and wait for every worker to exit.
    pub async fn shutdown(&self) {
        self.close();
        let handles = std::mem::take(&mut *self.handles.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "worker task failed");
            }
        }
    }
}

async fn worker(id: usize, rx: flume::Receiver<Task>, mut shutdown: watch::Receiver<bool>) {
    loop {
        let task = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            task = rx.recv_async() => match task {
                Ok(task) => task,
                Err(_) => break,
            },
        };

        if AssertUnwindSafe(task.job).catch_unwind().await.is_err() {
            error!(worker = id, "task panicked");
        }
    }

    // A handoff can race the shutdown signal and leave a task queued.
    // Dropping it wakes its submitter instead of leaving it hanging.
    while let Ok(task) = rx.try_recv() {
        drop(task);
    }

    debug!(worker = id, "worker stopped");
}

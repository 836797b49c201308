//! Fixed-size background worker pool for long transfers.
//!
//! Jobs go through one FIFO channel shared by N threads. A pending counter
//! guarded by a condvar lets callers wait for everything enqueued so far
//! without closing the queue; closing happens only in [`TaskQueue::shutdown`].

mod report;

pub use report::{JobFailure, QueueReport};

use anyhow::Result;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

type JobFn = Box<dyn FnOnce() -> Result<()> + Send + 'static>;

/// A labelled unit of background work.
pub struct Job {
    label: String,
    run: JobFn,
}

impl Job {
    pub fn new<F>(label: impl Into<String>, run: F) -> Self
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        Self {
            label: label.into(),
            run: Box::new(run),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job").field("label", &self.label).finish()
    }
}

#[derive(Default)]
struct Shared {
    pending: Mutex<usize>,
    idle: Condvar,
    report: Mutex<QueueReport>,
}

impl Shared {
    fn finish(&self, label: &str, outcome: std::result::Result<(), String>) {
        {
            let mut report = self.report.lock().unwrap();
            match outcome {
                Ok(()) => report.completed += 1,
                Err(message) => report.failures.push(JobFailure {
                    label: label.to_string(),
                    message,
                }),
            }
        }
        let mut pending = self.pending.lock().unwrap();
        *pending = pending.saturating_sub(1);
        if *pending == 0 {
            self.idle.notify_all();
        }
    }
}

pub struct TaskQueue {
    sender: Option<mpsc::Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    shared: Arc<Shared>,
}

impl TaskQueue {
    /// Start `workers` threads (at least one).
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        let (tx, rx) = mpsc::channel::<Job>();
        let rx = Arc::new(Mutex::new(rx));
        let shared = Arc::new(Shared::default());

        let handles = (0..workers)
            .map(|id| {
                let rx = Arc::clone(&rx);
                let shared = Arc::clone(&shared);
                std::thread::Builder::new()
                    .name(format!("hoard-worker-{}", id))
                    .spawn(move || worker_loop(id, &rx, &shared))
            })
            .filter_map(|spawned| match spawned {
                Ok(handle) => Some(handle),
                Err(e) => {
                    tracing::error!("failed to spawn queue worker: {}", e);
                    None
                }
            })
            .collect();

        Self {
            sender: Some(tx),
            workers: handles,
            shared,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Queue a job. Returns immediately; the job runs on the next free worker.
    pub fn enqueue(&self, job: Job) -> Result<()> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("queue is closed"))?;
        *self.shared.pending.lock().unwrap() += 1;
        tracing::debug!(job = %job.label, "enqueued");
        if let Err(mpsc::SendError(job)) = sender.send(job) {
            self.shared.finish(&job.label, Err("no worker available".to_string()));
            anyhow::bail!("queue has no running workers (job {})", job.label);
        }
        Ok(())
    }

    /// Jobs enqueued and not yet finished.
    pub fn pending(&self) -> usize {
        *self.shared.pending.lock().unwrap()
    }

    /// Block until every job enqueued so far has finished.
    pub fn drain(&self) {
        let mut pending = self.shared.pending.lock().unwrap();
        while *pending > 0 {
            pending = self.shared.idle.wait(pending).unwrap();
        }
    }

    /// Close the queue, let workers finish what is queued, join them.
    pub fn shutdown(mut self) -> QueueReport {
        self.close_and_join();
        let report = std::mem::take(&mut *self.shared.report.lock().unwrap());
        tracing::info!(
            completed = report.completed,
            failed = report.failures.len(),
            "queue shut down"
        );
        report
    }

    fn close_and_join(&mut self) {
        // Dropping the only sender ends each worker's recv loop.
        self.sender.take();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::error!("queue worker thread panicked");
            }
        }
    }
}

impl Drop for TaskQueue {
    fn drop(&mut self) {
        self.close_and_join();
    }
}

fn worker_loop(id: usize, rx: &Mutex<mpsc::Receiver<Job>>, shared: &Shared) {
    loop {
        let next = rx.lock().unwrap().recv();
        let job = match next {
            Ok(job) => job,
            Err(_) => break,
        };
        let Job { label, run } = job;
        tracing::debug!(worker = id, job = %label, "job started");
        let outcome = match panic::catch_unwind(AssertUnwindSafe(run)) {
            Ok(Ok(())) => {
                tracing::info!(worker = id, job = %label, "job finished");
                Ok(())
            }
            Ok(Err(e)) => {
                tracing::error!(worker = id, job = %label, "job failed: {:#}", e);
                Err(format!("{:#}", e))
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(worker = id, job = %label, "job panicked: {}", message);
                Err(format!("panicked: {}", message))
            }
        };
        shared.finish(&label, outcome);
    }
    tracing::debug!(worker = id, "worker exiting");
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests;

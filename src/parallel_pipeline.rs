// THEORY:
// The `ValidationPool` lets an async service validate many uploads at once without
// blocking its executor. Validation is CPU-bound and synchronous, so every job runs on
// tokio's blocking thread pool.
//
// Key architectural principles:
// 1.  **Dispatcher + Workers**: One dispatcher task drains the shared queue and hands
//     jobs round-robin to a fixed set of worker tasks. Each worker owns its own channel
//     and a handle to the same immutable `LeafGate`.
// 2.  **Replies by Oneshot**: Every job carries a oneshot sender. The caller awaits the
//     receiver, so results can never be delivered to the wrong request.
// 3.  **Verdicts, not Errors**: A closed channel, a panicking job or an expired deadline
//     all come back as rejection verdicts. The pool itself never fails a request.
// 4.  **Full Inspections**: Workers return the whole `Inspection`, so callers that need
//     the analysis (metrics, the green mask) never analyse an image twice.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::core_modules::verdict::{RejectReason, ValidationVerdict};
use crate::pipeline::{Inspection, LeafGate};

pub struct ValidationTask {
    pub image_bytes: Vec<u8>,
    pub result_sender: oneshot::Sender<Inspection>,
}

pub struct ValidationPool {
    task_sender: mpsc::UnboundedSender<ValidationTask>,
    workers: Vec<JoinHandle<()>>,
    dispatcher: JoinHandle<()>,
}

impl ValidationPool {
    /// Starts `workers` workers, or one per CPU when `workers` is zero. Must be called
    /// from within a tokio runtime.
    pub fn new(gate: LeafGate, workers: usize) -> Self {
        let worker_count = if workers == 0 { num_cpus::get() } else { workers };
        let gate = Arc::new(gate);
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<ValidationTask>();

        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..worker_count)
            .map(|_| mpsc::unbounded_channel::<ValidationTask>())
            .unzip();

        // Round-robin dispatcher. Dropping its senders on exit stops the workers.
        let dispatcher = tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                if let Err(mpsc::error::SendError(task)) = worker_senders[worker_idx].send(task) {
                    let _ = task.result_sender.send(Inspection::fault(
                        RejectReason::InternalFault,
                        "validation worker is no longer running",
                    ));
                }
                worker_idx = (worker_idx + 1) % worker_count;
            }
        });

        let workers = worker_receivers
            .into_iter()
            .enumerate()
            .map(|(worker_id, mut worker_receiver)| {
                let gate = Arc::clone(&gate);
                tokio::spawn(async move {
                    while let Some(task) = worker_receiver.recv().await {
                        let inspection = Self::inspect_on_worker(&gate, task.image_bytes).await;
                        // The caller may have given up on this result.
                        let _ = task.result_sender.send(inspection);
                    }
                    debug!(worker_id, "validation worker stopped");
                })
            })
            .collect();

        debug!(worker_count, "validation pool started");
        Self {
            task_sender,
            workers,
            dispatcher,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    async fn inspect_on_worker(gate: &Arc<LeafGate>, image_bytes: Vec<u8>) -> Inspection {
        let gate = Arc::clone(gate);
        match tokio::task::spawn_blocking(move || gate.inspect(&image_bytes)).await {
            Ok(inspection) => inspection,
            Err(join_error) => {
                warn!(error = %join_error, "blocking validation task failed");
                Inspection::fault(RejectReason::InternalFault, join_error.to_string())
            }
        }
    }

    /// Queues one image and waits for its verdict and analysis.
    pub async fn inspect(&self, image_bytes: Vec<u8>) -> Inspection {
        let (result_sender, result_receiver) = oneshot::channel();
        let task = ValidationTask {
            image_bytes,
            result_sender,
        };

        if self.task_sender.send(task).is_err() {
            return Inspection::fault(RejectReason::InternalFault, "validation pool is shut down");
        }

        result_receiver.await.unwrap_or_else(|_| {
            Inspection::fault(
                RejectReason::InternalFault,
                "validation worker dropped the request",
            )
        })
    }

    /// Like `inspect`, but gives up after `deadline`. The job may still finish in the
    /// background; its result is discarded.
    pub async fn inspect_with_deadline(
        &self,
        image_bytes: Vec<u8>,
        deadline: Duration,
    ) -> Inspection {
        match tokio::time::timeout(deadline, self.inspect(image_bytes)).await {
            Ok(inspection) => inspection,
            Err(_) => {
                warn!(deadline_ms = deadline.as_millis() as u64, "validation timed out");
                Inspection::fault(
                    RejectReason::InternalFault,
                    format!("validation timed out after {} ms", deadline.as_millis()),
                )
            }
        }
    }

    /// Inspects every image concurrently. Results come back in input order.
    pub async fn inspect_all(
        &self,
        images: Vec<Vec<u8>>,
        deadline: Option<Duration>,
    ) -> Vec<Inspection> {
        let jobs = images.into_iter().map(|image_bytes| async move {
            match deadline {
                Some(deadline) => self.inspect_with_deadline(image_bytes, deadline).await,
                None => self.inspect(image_bytes).await,
            }
        });
        join_all(jobs).await
    }

    pub async fn validate(&self, image_bytes: Vec<u8>) -> ValidationVerdict {
        self.inspect(image_bytes).await.verdict
    }

    pub async fn validate_with_deadline(
        &self,
        image_bytes: Vec<u8>,
        deadline: Duration,
    ) -> ValidationVerdict {
        self.inspect_with_deadline(image_bytes, deadline).await.verdict
    }

    /// Validates every image concurrently. Verdicts come back in input order.
    pub async fn validate_all(
        &self,
        images: Vec<Vec<u8>>,
        deadline: Option<Duration>,
    ) -> Vec<ValidationVerdict> {
        self.inspect_all(images, deadline)
            .await
            .into_iter()
            .map(|inspection| inspection.verdict)
            .collect()
    }

    /// Stops accepting work and waits for queued jobs to drain.
    pub async fn shutdown(self) {
        let Self {
            task_sender,
            workers,
            dispatcher,
        } = self;
        drop(task_sender);

        if let Err(error) = dispatcher.await {
            warn!(%error, "validation dispatcher ended abnormally");
        }
        for result in join_all(workers).await {
            if let Err(error) = result {
                warn!(%error, "validation worker ended abnormally");
            }
        }
    }
}

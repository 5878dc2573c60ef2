//! Queue Consumer Worker Pool
//!
//! Drives the consumer handler from the queue. One poller task pulls batches and hands
//! them over a bounded channel to a fixed pool of worker tasks.
//!
//! ## Responsibilities
//! - **Polling**: Receiving up to `batch_size` visible messages, backing off when empty.
//! - **Backpressure**: A worker permit is acquired before each pull and travels with the
//!   batch, so messages are never claimed while every worker is busy.
//! - **Execution**: Invoking the handler under the invocation deadline.
//! - **Acknowledgement**: Deleting handled messages and leaving failures to redelivery.

use super::handler::BatchHandler;
use super::types::{BatchReport, QueueEvent};
use crate::queue::queue::MessageQueue;
use crate::queue::types::ReceivedMessage;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct ConsumerSettings {
    pub batch_size: usize,
    pub workers: usize,
    pub poll_interval: Duration,
    pub invocation_timeout: Duration,
}

impl Default for ConsumerSettings {
    fn default() -> Self {
        Self {
            batch_size: 10,
            workers: 4,
            poll_interval: Duration::from_millis(100),
            invocation_timeout: Duration::from_secs(60),
        }
    }
}

/// A claimed batch together with the worker slot reserved for it.
type Dispatch = (OwnedSemaphorePermit, Vec<ReceivedMessage>);
type BatchReceiver = Arc<Mutex<mpsc::Receiver<Dispatch>>>;

/// The engine that feeds queue batches to the consumer handler.
pub struct QueueConsumer {
    queue: Arc<dyn MessageQueue>,
    handler: Arc<dyn BatchHandler>,
    settings: ConsumerSettings,
}

/// Join handles of a running consumer.
pub struct ConsumerHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl ConsumerHandle {
    /// Waits for the poller and every worker to exit.
    pub async fn wait(self) {
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::error!("Consumer task ended abnormally: {}", e);
            }
        }
    }
}

impl QueueConsumer {
    pub fn new(
        queue: Arc<dyn MessageQueue>,
        handler: Arc<dyn BatchHandler>,
        settings: ConsumerSettings,
    ) -> Arc<Self> {
        Arc::new(Self {
            queue,
            handler,
            settings,
        })
    }

    /// Spawns the poller and the workers and returns immediately.
    ///
    /// Cancelling `shutdown` stops the poller; workers finish the batches already
    /// handed to them and exit once the channel drains.
    pub fn start(self: Arc<Self>, shutdown: CancellationToken) -> ConsumerHandle {
        // One permit per worker; the channel never holds more batches than there are permits.
        let capacity = Arc::new(Semaphore::new(self.settings.workers));
        let (tx, rx) = mpsc::channel::<Dispatch>(self.settings.workers.max(1));
        let rx: BatchReceiver = Arc::new(Mutex::new(rx));
        let mut tasks = Vec::with_capacity(self.settings.workers + 1);

        for worker_id in 0..self.settings.workers {
            let consumer = self.clone();
            let rx = rx.clone();
            tasks.push(tokio::spawn(async move {
                consumer.worker_loop(worker_id, rx).await;
            }));
        }

        let consumer = self.clone();
        tasks.push(tokio::spawn(async move {
            consumer.poll_loop(tx, capacity, shutdown).await;
        }));

        tracing::info!(
            "Queue consumer started with {} workers (batch size {})",
            self.settings.workers,
            self.settings.batch_size
        );

        ConsumerHandle { tasks }
    }

    async fn poll_loop(
        &self,
        tx: mpsc::Sender<Dispatch>,
        capacity: Arc<Semaphore>,
        shutdown: CancellationToken,
    ) {
        loop {
            // Wait for an idle worker first: a claimed batch starts its visibility clock.
            let permit = tokio::select! {
                _ = shutdown.cancelled() => break,
                permit = capacity.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let batch = match self.queue.receive(self.settings.batch_size).await {
                Ok(batch) => batch,
                Err(e) => {
                    tracing::warn!("Failed to receive from queue: {}", e);
                    Vec::new()
                }
            };

            if batch.is_empty() {
                drop(permit);
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(self.settings.poll_interval) => continue,
                }
            }

            tracing::trace!("Poller dispatching batch of {}", batch.len());
            if tx.send((permit, batch)).await.is_err() {
                tracing::warn!("All workers stopped, poller exiting");
                break;
            }
        }

        tracing::info!("Queue poller stopped");
    }

    async fn worker_loop(&self, worker_id: usize, rx: BatchReceiver) {
        tracing::debug!("Worker {} started", worker_id);

        loop {
            let batch = {
                let mut rx = rx.lock().await;
                rx.recv().await
            };

            let Some((permit, batch)) = batch else {
                break;
            };

            let report = self.process_batch(batch).await;
            drop(permit);
            tracing::debug!(
                "Worker {} processed batch: {} received, {} deleted, {} failed",
                worker_id,
                report.received,
                report.deleted,
                report.failed
            );
        }

        tracing::debug!("Worker {} stopped", worker_id);
    }

    /// Runs the handler on one batch and acknowledges what succeeded.
    pub async fn process_batch(&self, batch: Vec<ReceivedMessage>) -> BatchReport {
        let mut report = BatchReport {
            received: batch.len(),
            ..Default::default()
        };
        let event = QueueEvent::from_messages(&batch);

        let outcome = tokio::time::timeout(
            self.settings.invocation_timeout,
            self.handler.handle_batch(&event),
        )
        .await;

        let failed: HashSet<String> = match outcome {
            Ok(Ok(response)) => response
                .batch_item_failures
                .into_iter()
                .map(|failure| failure.item_identifier)
                .collect(),
            Ok(Err(e)) => {
                tracing::error!("Consumer handler failed the whole batch: {:#}", e);
                batch.iter().map(|m| m.message_id.0.clone()).collect()
            }
            Err(_) => {
                tracing::warn!(
                    "Consumer handler exceeded its {:?} deadline, batch left for redelivery",
                    self.settings.invocation_timeout
                );
                batch.iter().map(|m| m.message_id.0.clone()).collect()
            }
        };

        for message in &batch {
            if failed.contains(&message.message_id.0) {
                report.failed += 1;
                continue;
            }

            match self.queue.delete(&message.receipt).await {
                Ok(()) => report.deleted += 1,
                Err(e) => {
                    // Usually the window expired mid-batch and the message went back out.
                    tracing::warn!("Failed to delete message {}: {}", message.message_id, e);
                    report.failed += 1;
                }
            }
        }

        report
    }
}

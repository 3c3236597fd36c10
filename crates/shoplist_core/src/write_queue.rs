//! Ordered background persistence.
//!
//! # Responsibility
//! - Accept whole-document writes without making the caller wait on storage.
//! - Issue `save` calls to the adapter strictly in enqueue order.
//! - Publish persistence progress and the most recent failure.
//!
//! # Invariants
//! - Exactly one consumer task per queue; jobs never overlap or reorder.
//! - Failed writes are reported, never retried.
//! - Dropping the last handle drains already queued jobs, then stops the task.

use crate::storage::StorageAdapter;
use log::{debug, error, info};
use serde_json::Value;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, watch};

/// Snapshot of persistence progress for one queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistStatus {
    /// Writes accepted by the queue.
    pub issued: u64,
    /// Writes the adapter acknowledged.
    pub completed: u64,
    /// Writes that failed (adapter error or closed queue).
    pub failed: u64,
    /// Message of the latest failure, if any.
    pub last_error: Option<String>,
}

impl PersistStatus {
    /// Writes accepted but not processed yet.
    pub fn pending(&self) -> u64 {
        self.issued.saturating_sub(self.completed + self.failed)
    }
}

enum Job {
    Save { seq: u64, key: String, value: Value },
    Flush(oneshot::Sender<()>),
}

/// Handle to a single-consumer write queue.
pub struct WriteQueue {
    jobs: mpsc::UnboundedSender<Job>,
    status: Arc<watch::Sender<PersistStatus>>,
}

impl WriteQueue {
    /// Starts the consumer task on the current tokio runtime.
    ///
    /// Returns `None` when called outside a tokio runtime.
    pub fn spawn(storage: Arc<dyn StorageAdapter>) -> Option<Self> {
        let handle = Handle::try_current().ok()?;
        Some(Self::spawn_on(&handle, storage))
    }

    /// Starts the consumer task on `handle`.
    pub fn spawn_on(handle: &Handle, storage: Arc<dyn StorageAdapter>) -> Self {
        let (jobs, receiver) = mpsc::unbounded_channel();
        let (status, _) = watch::channel(PersistStatus::default());
        let status = Arc::new(status);

        handle.spawn(run_queue(storage, receiver, Arc::clone(&status)));
        info!("event=write_queue_start module=write_queue status=ok");

        Self { jobs, status }
    }

    /// Enqueues a full-document write for `key`.
    ///
    /// Returns the sequence number of the write.
    pub fn enqueue(&self, key: &str, value: Value) -> u64 {
        let mut seq = 0;
        self.status.send_modify(|status| {
            status.issued += 1;
            seq = status.issued;
        });

        let job = Job::Save {
            seq,
            key: key.to_string(),
            value,
        };
        if self.jobs.send(job).is_err() {
            self.report_failure("write queue closed");
        }
        seq
    }

    /// Records a write that failed before it could be enqueued.
    pub fn report_failure(&self, message: impl Into<String>) {
        let message = message.into();
        error!("event=persist module=write_queue status=error error={message}");
        self.status.send_modify(|status| {
            status.failed += 1;
            status.last_error = Some(message);
        });
    }

    /// Current persistence progress.
    pub fn status(&self) -> PersistStatus {
        self.status.borrow().clone()
    }

    /// Receiver that observes every status change.
    pub fn subscribe(&self) -> watch::Receiver<PersistStatus> {
        self.status.subscribe()
    }

    /// Waits until every write enqueued before this call has been processed.
    pub async fn flush(&self) -> PersistStatus {
        let (done, wait) = oneshot::channel();
        if self.jobs.send(Job::Flush(done)).is_ok() {
            // A dropped sender means the consumer stopped; nothing left to wait on.
            let _ = wait.await;
        }
        self.status()
    }
}

async fn run_queue(
    storage: Arc<dyn StorageAdapter>,
    mut jobs: mpsc::UnboundedReceiver<Job>,
    status: Arc<watch::Sender<PersistStatus>>,
) {
    while let Some(job) = jobs.recv().await {
        match job {
            Job::Save { seq, key, value } => match storage.save(&key, &value).await {
                Ok(()) => {
                    debug!("event=persist module=write_queue status=ok seq={seq}");
                    status.send_modify(|status| status.completed += 1);
                }
                Err(err) => {
                    error!("event=persist module=write_queue status=error seq={seq} error={err}");
                    status.send_modify(|status| {
                        status.failed += 1;
                        status.last_error = Some(err.to_string());
                    });
                }
            },
            Job::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    info!("event=write_queue_stop module=write_queue status=ok");
}

#[cfg(test)]
mod tests {
    use super::{PersistStatus, WriteQueue};
    use crate::storage::{MemoryStorage, StorageAdapter};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn pending_counts_unprocessed_writes() {
        let status = PersistStatus {
            issued: 5,
            completed: 2,
            failed: 1,
            last_error: None,
        };
        assert_eq!(status.pending(), 2);
    }

    #[test]
    fn spawn_outside_runtime_returns_none() {
        let storage: Arc<dyn StorageAdapter> = Arc::new(MemoryStorage::new());
        assert!(WriteQueue::spawn(storage).is_none());
    }

    #[tokio::test]
    async fn last_write_wins_after_flush() {
        let storage = Arc::new(MemoryStorage::new());
        let queue = WriteQueue::spawn(storage.clone()).unwrap();

        for n in 0..20 {
            queue.enqueue("k", json!(n));
        }
        let status = queue.flush().await;

        assert_eq!(status.issued, 20);
        assert_eq!(status.completed, 20);
        assert_eq!(status.pending(), 0);
        assert_eq!(storage.get("k"), Some(json!(19)));
    }

    #[tokio::test]
    async fn dropping_the_handle_drains_pending_writes() {
        let storage = Arc::new(MemoryStorage::new());
        let queue = WriteQueue::spawn(storage.clone()).unwrap();
        for n in 0..5 {
            queue.enqueue("k", json!(n));
        }
        drop(queue);

        // The consumer task holds the only other handle on `storage`.
        let mut polls = 0;
        while Arc::strong_count(&storage) > 1 {
            assert!(polls < 10_000, "consumer task did not stop");
            polls += 1;
            tokio::task::yield_now().await;
        }

        assert_eq!(storage.save_count(), 5);
        assert_eq!(storage.get("k"), Some(json!(4)));
    }
}

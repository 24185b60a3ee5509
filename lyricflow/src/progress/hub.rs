//! Push-style progress delivery keyed by job id.

use super::reporter::{ProgressReporter, ProgressUpdate};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

/// Routes progress updates to at most one attached consumer per job id.
///
/// Each attachment gets a bounded channel; `try_report` never blocks. When a
/// channel is full or its consumer has disconnected, the update is dropped
/// and counted - delivery failures never surface to the pipeline. Updates
/// for a job with no attached consumer are a graceful no-op.
#[derive(Debug)]
pub struct ProgressHub {
    channels: DashMap<Uuid, mpsc::Sender<ProgressUpdate>>,
    queue_size: usize,
    dropped: AtomicU64,
}

impl ProgressHub {
    /// Creates a hub with the given per-job channel bound.
    #[must_use]
    pub fn new(queue_size: usize) -> Self {
        Self {
            channels: DashMap::new(),
            queue_size: queue_size.max(1),
            dropped: AtomicU64::new(0),
        }
    }

    /// Attaches a consumer for a job, replacing any previous one.
    ///
    /// The previous channel, if any, is closed; its consumer sees the
    /// stream end.
    #[must_use]
    pub fn attach(&self, job_id: Uuid) -> mpsc::Receiver<ProgressUpdate> {
        let (tx, rx) = mpsc::channel(self.queue_size);
        self.channels.insert(job_id, tx);
        rx
    }

    /// Detaches the consumer for a job, if one is attached.
    pub fn detach(&self, job_id: &Uuid) {
        self.channels.remove(job_id);
    }

    /// Returns whether a consumer is attached for the job.
    #[must_use]
    pub fn is_attached(&self, job_id: &Uuid) -> bool {
        self.channels.contains_key(job_id)
    }

    /// Returns the number of updates dropped so far.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl ProgressReporter for ProgressHub {
    fn try_report(&self, update: &ProgressUpdate) {
        let Some(tx) = self
            .channels
            .get(&update.job_id)
            .map(|entry| entry.value().clone())
        else {
            return; // No consumer attached - graceful no-op
        };

        match tx.try_send(update.clone()) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(
                    job_id = %update.job_id,
                    step = %update.step,
                    "progress update dropped: consumer queue full"
                );
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                self.channels.remove(&update.job_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(job_id: Uuid, step: &str) -> ProgressUpdate {
        ProgressUpdate::new(job_id, step, 0, 6, "msg")
    }

    #[tokio::test]
    async fn test_hub_delivers_to_attached_consumer() {
        let hub = ProgressHub::new(8);
        let job_id = Uuid::new_v4();
        let mut rx = hub.attach(job_id);

        hub.try_report(&update(job_id, "draft"));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.step, "draft");
    }

    #[tokio::test]
    async fn test_hub_noop_without_consumer() {
        let hub = ProgressHub::new(8);
        hub.try_report(&update(Uuid::new_v4(), "draft"));
        assert_eq!(hub.dropped(), 0);
    }

    #[tokio::test]
    async fn test_hub_drops_when_queue_full() {
        let hub = ProgressHub::new(1);
        let job_id = Uuid::new_v4();
        let _rx = hub.attach(job_id);

        hub.try_report(&update(job_id, "a"));
        hub.try_report(&update(job_id, "b"));

        assert_eq!(hub.dropped(), 1);
    }

    #[tokio::test]
    async fn test_hub_forgets_disconnected_consumer() {
        let hub = ProgressHub::new(8);
        let job_id = Uuid::new_v4();
        let rx = hub.attach(job_id);
        drop(rx);

        hub.try_report(&update(job_id, "a"));
        assert!(!hub.is_attached(&job_id));
    }

    #[tokio::test]
    async fn test_reattach_replaces_consumer() {
        let hub = ProgressHub::new(8);
        let job_id = Uuid::new_v4();
        let mut first = hub.attach(job_id);
        let mut second = hub.attach(job_id);

        hub.try_report(&update(job_id, "draft"));

        // First consumer's stream ends; second receives
        assert!(first.recv().await.is_none());
        assert_eq!(second.recv().await.unwrap().step, "draft");
    }
}

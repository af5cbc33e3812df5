//! Fire-and-forget outcome recording
//!
//! Usage records are handed to a background task over a channel so
//! bookkeeping never blocks or fails the response path. Write failures
//! are logged and dropped.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::store::{SpendStore, UsageRecord};

/// Async usage recorder backed by a background task
#[derive(Clone)]
pub struct OutcomeRecorder {
    tx: mpsc::UnboundedSender<UsageRecord>,
}

impl OutcomeRecorder {
    /// Create a recorder and spawn its background processing task
    ///
    /// The task runs until every sender is dropped.
    #[must_use]
    pub fn new(store: Arc<dyn SpendStore>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(process_records(rx, store));

        Self { tx }
    }

    /// Enqueue a usage record for background persistence
    ///
    /// Non-blocking. If the channel is closed the record is dropped
    /// with a warning; the response path is never affected.
    pub fn record(&self, record: UsageRecord) {
        if let Err(e) = self.tx.send(record) {
            tracing::warn!(error = %e, "failed to enqueue usage record, channel closed");
        }
    }
}

impl std::fmt::Debug for OutcomeRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutcomeRecorder").finish_non_exhaustive()
    }
}

/// Background task draining the record channel into the store
async fn process_records(mut rx: mpsc::UnboundedReceiver<UsageRecord>, store: Arc<dyn SpendStore>) {
    while let Some(record) = rx.recv().await {
        if let Err(e) = store.record(&record).await {
            tracing::warn!(
                error = %e,
                user_id = %record.user_id,
                model = %record.model_used,
                "failed to persist usage record"
            );
        }
    }

    tracing::debug!("outcome recorder shutting down");
}

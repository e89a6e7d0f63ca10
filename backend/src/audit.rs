//! Fire-and-forget audit trail
//!
//! Workflows hand records to an [`AuditSink`] after their ledger write has
//! committed. A background writer drains the channel into an
//! [`AuditRepository`]. A full channel or a failed append is logged and
//! dropped; it never fails the business operation that produced it.

use std::sync::Arc;

use shared::AuditRecord;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::store::AuditRepository;

/// Sending half of the audit channel
#[derive(Clone)]
pub struct AuditSink {
    sender: mpsc::Sender<AuditRecord>,
}

impl AuditSink {
    pub fn new(sender: mpsc::Sender<AuditRecord>) -> Self {
        Self { sender }
    }

    /// Create a sink with a bounded buffer and the receiver its writer drains
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<AuditRecord>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self::new(sender), receiver)
    }

    /// Queue a record without waiting
    pub fn record(&self, record: AuditRecord) {
        match self.sender.try_send(record) {
            Ok(()) => {}
            Err(TrySendError::Full(record)) => {
                tracing::warn!(
                    "Audit channel full, dropping {} {} record",
                    record.action.as_str(),
                    record.entity_kind.as_str()
                );
            }
            Err(TrySendError::Closed(record)) => {
                tracing::warn!(
                    "Audit writer stopped, dropping {} {} record",
                    record.action.as_str(),
                    record.entity_kind.as_str()
                );
            }
        }
    }
}

/// Append every received record until all sinks are dropped
pub async fn run_writer(mut receiver: mpsc::Receiver<AuditRecord>, repo: Arc<dyn AuditRepository>) {
    tracing::info!("Starting audit writer");

    while let Some(record) = receiver.recv().await {
        let entity_kind = record.entity_kind;
        let entity_id = record.entity_id;
        if let Err(e) = repo.append(record).await {
            tracing::error!(
                "Failed to write audit record for {} {:?}: {}",
                entity_kind.as_str(),
                entity_id,
                e
            );
        }
    }

    tracing::info!("Audit writer stopped");
}

pub fn spawn_writer(
    receiver: mpsc::Receiver<AuditRecord>,
    repo: Arc<dyn AuditRepository>,
) -> JoinHandle<()> {
    tokio::spawn(run_writer(receiver, repo))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use shared::AuditEntityKind;

    fn record(id: i64) -> AuditRecord {
        AuditRecord::created(
            1,
            AuditEntityKind::Receipt,
            id,
            format!("Created receipt #{}", id),
            serde_json::json!({}),
        )
    }

    #[tokio::test]
    async fn writer_drains_until_sinks_are_dropped() {
        let store = Arc::new(MemoryStore::new());
        let (sink, receiver) = AuditSink::channel(8);
        let writer = spawn_writer(receiver, store.clone());

        sink.record(record(1));
        sink.record(record(2));
        drop(sink);
        writer.await.unwrap();

        let records = store.audit_records().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].entity_id, Some(2));
    }

    #[tokio::test]
    async fn full_channel_drops_instead_of_blocking() {
        let (sink, mut receiver) = AuditSink::channel(1);

        sink.record(record(1));
        sink.record(record(2));

        assert_eq!(receiver.recv().await.unwrap().entity_id, Some(1));
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn failing_repository_does_not_stop_the_writer() {
        let store = Arc::new(MemoryStore::new());
        store.fail_audit_writes(true);
        let (sink, receiver) = AuditSink::channel(8);
        let writer = spawn_writer(receiver, store.clone());

        sink.record(record(1));
        drop(sink);

        writer.await.unwrap();
        assert!(store.audit_records().await.is_empty());
    }
}

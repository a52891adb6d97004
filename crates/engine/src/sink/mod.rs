//! Audit-trail sinks.
//!
//! The engine records through the fire-and-forget channel in
//! [`crate::audit`]; a drain task moves the records into an [`AuditSink`].
//! One backend ships with the engine:
//! - **NDJSON stream** -- newline-delimited JSON rows to any `Write` impl
//!   (stdout or a file).

pub mod json_stream;

use crate::audit::AuditRecord;
use async_trait::async_trait;
use std::io;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Destination for drained audit records. At-least-once delivery; the
/// drain logs and continues on write failure.
#[async_trait]
pub trait AuditSink: Send {
    async fn write(&mut self, record: &AuditRecord) -> io::Result<()>;

    /// Flush buffered rows. Called once when the channel closes.
    async fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Moves records from the audit channel into `sink` until every
/// [`ChannelRecorder`](crate::audit::ChannelRecorder) clone is dropped.
/// Resolves to the number of records written.
pub fn spawn_drain(
    mut rx: mpsc::Receiver<AuditRecord>,
    mut sink: impl AuditSink + 'static,
) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut written = 0usize;
        while let Some(record) = rx.recv().await {
            match sink.write(&record).await {
                Ok(()) => written += 1,
                Err(err) => {
                    tracing::warn!(error = %err, action = %record.action, "audit sink write failed");
                }
            }
        }
        if let Err(err) = sink.flush().await {
            tracing::warn!(error = %err, "audit sink flush failed");
        }
        tracing::debug!(written, "audit drain finished");
        written
    })
}

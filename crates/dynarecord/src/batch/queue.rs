use dynarecord_core::model::Record;
use dynarecord_core::storage::{BatchWriteOutput, ItemRepository};
use tokio::sync::Mutex;

use crate::persistence::{Error, Result};

use super::write_records;

/// Records waiting for a bulk write, flushed when the size limit is reached.
///
/// The lock is held across the flush, so an enqueue that triggers a flush
/// and a concurrent enqueue never interleave.
#[derive(Debug)]
pub struct BatchQueue {
    limit: usize,
    pending: Mutex<Vec<Record>>,
}

impl BatchQueue {
    /// Creates an empty queue. A limit below 1 is raised to 1.
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub async fn len(&self) -> usize {
        self.pending.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.pending.lock().await.is_empty()
    }

    /// Drops every pending record and returns how many were dropped.
    pub async fn clear(&self) -> usize {
        let mut pending = self.pending.lock().await;
        let dropped = pending.len();
        pending.clear();
        dropped
    }

    /// Appends `record`, flushing the whole queue once it reaches the limit.
    ///
    /// Returns the bulk write output when a flush happened.
    pub async fn push<R>(
        &self,
        repository: &R,
        table: &str,
        record: Record,
    ) -> Result<Option<BatchWriteOutput>>
    where
        R: ItemRepository + ?Sized,
    {
        let mut pending = self.pending.lock().await;
        pending.push(record);

        if pending.len() < self.limit {
            return Ok(None);
        }

        flush_pending(&mut pending, repository, table).await.map(Some)
    }

    /// Bulk-writes every pending record, even when there are none.
    pub async fn flush<R>(&self, repository: &R, table: &str) -> Result<BatchWriteOutput>
    where
        R: ItemRepository + ?Sized,
    {
        let mut pending = self.pending.lock().await;
        flush_pending(&mut pending, repository, table).await
    }
}

/// When the store fails the records are put back and its error is returned.
/// Any other failure drops the batch.
async fn flush_pending<R>(
    pending: &mut Vec<Record>,
    repository: &R,
    table: &str,
) -> Result<BatchWriteOutput>
where
    R: ItemRepository + ?Sized,
{
    let mut records = std::mem::take(pending);
    tracing::info!(table, count = records.len(), "Flushing batch queue");

    match write_records(repository, table, &mut records).await {
        Ok(output) => Ok(output),
        Err(err @ Error::Repository(_)) => {
            tracing::warn!(
                table,
                count = records.len(),
                error = %err,
                "Batch flush failed, records re-queued"
            );
            *pending = records;
            Err(err)
        }
        Err(err) => {
            tracing::warn!(
                table,
                count = records.len(),
                error = %err,
                "Batch flush failed, records dropped"
            );
            Err(err)
        }
    }
}

//! Traits for reading student rows and writing computed columns back.

use async_trait::async_trait;

use crate::error::TransportError;
use crate::record::RawRecord;

/// What a store reports after a column update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub updated_cells: u64,
}

/// Supplies the ordered student rows of one batch.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Returns every row in range, in sheet order. An empty store yields an
    /// empty vector, not an error.
    async fn fetch(&self) -> Result<Vec<RawRecord>, TransportError>;
}

/// Accepts the two computed columns of a batch.
///
/// Each call writes one value per record, starting at the first data row,
/// so the slice length decides the size of the destination range.
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn write_statuses(&self, statuses: &[String]) -> Result<WriteSummary, TransportError>;

    async fn write_thresholds(&self, thresholds: &[u32]) -> Result<WriteSummary, TransportError>;
}

/// Sink for evaluation-only runs: accepts every column and stores nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

#[async_trait]
impl RecordSink for DiscardSink {
    async fn write_statuses(&self, _statuses: &[String]) -> Result<WriteSummary, TransportError> {
        Ok(WriteSummary::default())
    }

    async fn write_thresholds(&self, _thresholds: &[u32]) -> Result<WriteSummary, TransportError> {
        Ok(WriteSummary::default())
    }
}

#[async_trait]
impl<T: RecordSource + ?Sized> RecordSource for &T {
    async fn fetch(&self) -> Result<Vec<RawRecord>, TransportError> {
        (**self).fetch().await
    }
}

#[async_trait]
impl<T: RecordSink + ?Sized> RecordSink for &T {
    async fn write_statuses(&self, statuses: &[String]) -> Result<WriteSummary, TransportError> {
        (**self).write_statuses(statuses).await
    }

    async fn write_thresholds(&self, thresholds: &[u32]) -> Result<WriteSummary, TransportError> {
        (**self).write_thresholds(thresholds).await
    }
}

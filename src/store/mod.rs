//! The row store contract consumed by the exploration engine, plus the
//! in-memory implementation used by the CLI and tests.

pub mod memory;
pub mod record;

pub use memory::MemoryStore;
pub use record::Record;

use std::pin::Pin;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use futures::Stream;
use serde_json::Value;

use crate::error::ExploreResult;

/// Async row iteration over a table.
pub type RecordStream = Pin<Box<dyn Stream<Item = ExploreResult<Record>> + Send>>;

/// Storage contract the engine consumes. Single-writer: no concurrent
/// mutation happens while a scan is in flight; a delete instead
/// invalidates in-flight scans through the facet generation counters.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Total number of rows in a table.
    async fn count(&self, table: &str) -> ExploreResult<u64>;

    /// A batch of rows ordered ascending by id.
    async fn page_batch(&self, table: &str, offset: usize, limit: usize)
        -> ExploreResult<Vec<Record>>;

    /// Rows for the given ids, returned in the order of `ids`. Missing
    /// ids are skipped (they may have been deleted since the caller
    /// captured the id list).
    async fn rows_by_ids(&self, table: &str, ids: &[u64]) -> ExploreResult<Vec<Record>>;

    /// Distinct string values of a field across the table, one occurrence
    /// per array element for multi-valued fields.
    async fn unique_values(&self, table: &str, field: &str) -> ExploreResult<Vec<String>>;

    /// Stream every row of a table in ascending id order.
    fn scan_all(&self, table: &str) -> RecordStream;

    /// Stream the rows for `ids`, in the order of `ids`.
    fn scan_by_ids(&self, table: &str, ids: Vec<u64>) -> RecordStream;

    /// Insert a row; returns the assigned id. Ids are monotone and never
    /// reused, even after deletes.
    async fn insert(&self, table: &str, date: NaiveDateTime, data: Value) -> ExploreResult<u64>;

    /// Remove rows by id. Unknown ids are ignored.
    async fn delete_by_ids(&self, table: &str, ids: &[u64]) -> ExploreResult<()>;
}

//! In-memory row store: per-table ordered maps behind an `RwLock`.
//!
//! Scans snapshot the matching rows under the read lock and then yield
//! them without holding it, which keeps the store single-writer friendly:
//! a delete that lands mid-scan never corrupts the stream, it just makes
//! the scan's result stale (the facet generation counters discard it).

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde_json::Value;

use super::record::Record;
use super::{RecordStream, RowStore};
use crate::error::{ExploreError, ExploreResult};

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<u64, Record>,
    /// Next id to assign. Monotone; deletes never lower it.
    next_id: u64,
}

/// In-memory implementation of [`RowStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<BTreeMap<String, Table>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty table. Idempotent.
    pub fn create_table(&self, name: &str) {
        let mut tables = self.tables.write().unwrap();
        tables.entry(name.to_string()).or_default();
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables.read().unwrap().keys().cloned().collect()
    }

    fn with_table<T>(
        &self,
        table: &str,
        f: impl FnOnce(&Table) -> T,
    ) -> ExploreResult<T> {
        let tables = self.tables.read().unwrap();
        tables
            .get(table)
            .map(f)
            .ok_or_else(|| ExploreError::StoreUnavailable(table.to_string()))
    }
}

#[async_trait]
impl RowStore for MemoryStore {
    async fn count(&self, table: &str) -> ExploreResult<u64> {
        self.with_table(table, |t| t.rows.len() as u64)
    }

    async fn page_batch(
        &self,
        table: &str,
        offset: usize,
        limit: usize,
    ) -> ExploreResult<Vec<Record>> {
        self.with_table(table, |t| {
            t.rows.values().skip(offset).take(limit).cloned().collect()
        })
    }

    async fn rows_by_ids(&self, table: &str, ids: &[u64]) -> ExploreResult<Vec<Record>> {
        self.with_table(table, |t| {
            ids.iter().filter_map(|id| t.rows.get(id).cloned()).collect()
        })
    }

    async fn unique_values(&self, table: &str, field: &str) -> ExploreResult<Vec<String>> {
        self.with_table(table, |t| {
            let mut values: Vec<String> = t
                .rows
                .values()
                .flat_map(|r| r.field_values(field))
                .map(str::to_string)
                .collect();
            values.sort_unstable();
            values.dedup();
            values
        })
    }

    fn scan_all(&self, table: &str) -> RecordStream {
        let snapshot = self.with_table(table, |t| {
            t.rows.values().cloned().collect::<Vec<_>>()
        });
        Box::pin(async_stream::try_stream! {
            for record in snapshot? {
                yield record;
            }
        })
    }

    fn scan_by_ids(&self, table: &str, ids: Vec<u64>) -> RecordStream {
        let snapshot = self.with_table(table, |t| {
            ids.iter()
                .filter_map(|id| t.rows.get(id).cloned())
                .collect::<Vec<_>>()
        });
        Box::pin(async_stream::try_stream! {
            for record in snapshot? {
                yield record;
            }
        })
    }

    async fn insert(&self, table: &str, date: NaiveDateTime, data: Value) -> ExploreResult<u64> {
        let mut tables = self.tables.write().unwrap();
        let t = tables
            .get_mut(table)
            .ok_or_else(|| ExploreError::StoreUnavailable(table.to_string()))?;
        t.next_id += 1;
        let id = t.next_id;
        t.rows.insert(id, Record { id, date, data });
        Ok(id)
    }

    async fn delete_by_ids(&self, table: &str, ids: &[u64]) -> ExploreResult<()> {
        let mut tables = self.tables.write().unwrap();
        let t = tables
            .get_mut(table)
            .ok_or_else(|| ExploreError::StoreUnavailable(table.to_string()))?;
        let mut removed = 0usize;
        for id in ids {
            if t.rows.remove(id).is_some() {
                removed += 1;
            }
        }
        tracing::debug!(table, requested = ids.len(), removed, "deleted rows");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use serde_json::json;

    fn date(d: u32, h: u32) -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn ids_are_monotone_and_never_reused() {
        let store = MemoryStore::new();
        store.create_table("browsinghistory");
        let a = store
            .insert("browsinghistory", date(1, 9), json!({"url": "a.com"}))
            .await
            .unwrap();
        let b = store
            .insert("browsinghistory", date(2, 9), json!({"url": "b.com"}))
            .await
            .unwrap();
        assert!(b > a);

        store.delete_by_ids("browsinghistory", &[b]).await.unwrap();
        let c = store
            .insert("browsinghistory", date(3, 9), json!({"url": "c.com"}))
            .await
            .unwrap();
        assert!(c > b, "deleted id must not be reassigned");
    }

    #[tokio::test]
    async fn rows_by_ids_preserves_request_order() {
        let store = MemoryStore::new();
        store.create_table("t");
        let mut ids = Vec::new();
        for d in 1..=4 {
            ids.push(store.insert("t", date(d, 0), json!({})).await.unwrap());
        }
        let rows = store
            .rows_by_ids("t", &[ids[2], ids[0], ids[3]])
            .await
            .unwrap();
        let got: Vec<u64> = rows.iter().map(|r| r.id).collect();
        assert_eq!(got, vec![ids[2], ids[0], ids[3]]);
    }

    #[tokio::test]
    async fn scan_all_is_ascending_by_id() {
        let store = MemoryStore::new();
        store.create_table("t");
        for d in 1..=5 {
            store.insert("t", date(d, 0), json!({})).await.unwrap();
        }
        let rows: Vec<Record> = store.scan_all("t").try_collect().await.unwrap();
        let ids: Vec<u64> = rows.iter().map(|r| r.id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }

    #[tokio::test]
    async fn missing_table_is_store_unavailable() {
        let store = MemoryStore::new();
        let err = store.count("nope").await.unwrap_err();
        assert!(err.is_store_unavailable());
    }
}

//! Summary statistics over the combined selection.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::ExploreResult;
use crate::facet::key::KeyCounts;
use crate::selection::Selection;
use crate::store::RowStore;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Statistics {
    /// Rows in the combined selection.
    pub total: u64,
    /// The key with the highest count, if any rows are selected.
    pub best_key: Option<String>,
    pub best_count: u64,
    /// Mean count per distinct key; 0.0 when no keys.
    pub mean_per_key: f64,
    pub distinct_keys: u64,
    /// Full row counts per source table, irrespective of the selection.
    pub table_totals: BTreeMap<String, u64>,
}

impl Statistics {
    /// Derive statistics from a selection's key counts plus per-table
    /// totals. Tables that are not available yet count as zero rows.
    pub async fn compute(
        store: &dyn RowStore,
        table: &str,
        selection: &Selection,
        keys: &KeyCounts,
        all_tables: &[String],
    ) -> ExploreResult<Statistics> {
        let total_rows = match store.count(table).await {
            Ok(n) => n,
            Err(e) if e.is_store_unavailable() => 0,
            Err(e) => return Err(e),
        };
        let total = selection.count(total_rows);

        let best = keys.iter().max_by(|a, b| {
            a.1.count.cmp(&b.1.count).then(b.0.cmp(a.0))
        });
        let distinct_keys = keys.len() as u64;
        let key_total: u64 = keys.values().map(|e| e.count).sum();
        let mean_per_key = if distinct_keys == 0 {
            0.0
        } else {
            key_total as f64 / distinct_keys as f64
        };

        let mut table_totals = BTreeMap::new();
        for name in all_tables {
            let n = match store.count(name).await {
                Ok(n) => n,
                Err(e) if e.is_store_unavailable() => 0,
                Err(e) => return Err(e),
            };
            table_totals.insert(name.clone(), n);
        }

        Ok(Statistics {
            total,
            best_key: best.map(|(k, _)| k.clone()),
            best_count: best.map(|(_, e)| e.count).unwrap_or(0),
            mean_per_key,
            distinct_keys,
            table_totals,
        })
    }
}

//! The donation contract: the filtered dataset packaged as full per-table
//! row arrays for an external sink. Transport is the sink's problem.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::ExploreResult;
use crate::selection::Selection;
use crate::store::{Record, RowStore};

#[derive(Debug, Clone, Default, Serialize)]
pub struct DonationPayload {
    pub tables: BTreeMap<String, Vec<Record>>,
}

/// External sink accepting a donation payload as an opaque serializable
/// value.
#[async_trait]
pub trait DonationSink: Send + Sync {
    async fn accept(&self, payload: DonationPayload) -> ExploreResult<()>;
}

impl DonationPayload {
    /// Collect the selected rows of one table into a payload.
    pub async fn collect(
        store: &dyn RowStore,
        table: &str,
        selection: &Selection,
    ) -> ExploreResult<DonationPayload> {
        let rows = match selection {
            Selection::All => {
                let total = store.count(table).await? as usize;
                store.page_batch(table, 0, total).await?
            }
            Selection::Ids(ids) => store.rows_by_ids(table, ids).await?,
        };
        let mut tables = BTreeMap::new();
        tables.insert(table.to_string(), rows);
        Ok(DonationPayload { tables })
    }

    /// Merge another table's rows into this payload.
    pub fn merge(&mut self, other: DonationPayload) {
        for (table, rows) in other.tables {
            self.tables.entry(table).or_default().extend(rows);
        }
    }
}

//! Free-text facet: case-insensitive substring search over configured
//! fields.

use futures::TryStreamExt;

use super::{Generation, Loading};
use crate::error::ExploreResult;
use crate::selection::Selection;
use crate::store::RowStore;

/// How many rows to scan between staleness checks.
const CANCEL_CHECK_INTERVAL: usize = 256;

#[derive(Debug, Default)]
pub struct TextQuery {
    fields: Vec<String>,
    query: String,
    pub generation: Generation,
    pub loading: Loading,
}

impl TextQuery {
    pub fn new(fields: Vec<String>) -> Self {
        TextQuery {
            fields,
            ..Default::default()
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Store a new query and return the generation a matching recompute
    /// must carry. Any scan started for an older query is now stale.
    pub fn set_query(&mut self, query: &str) -> u64 {
        self.query = query.trim().to_string();
        self.generation.bump()
    }

    /// Compute the out-selection for the current query.
    ///
    /// Returns `Ok(None)` when the scan was superseded: a newer generation
    /// exists and the result must not be committed. A missing table yields
    /// an empty selection, not an error.
    pub async fn evaluate(
        &self,
        store: &dyn RowStore,
        table: &str,
        captured: u64,
    ) -> ExploreResult<Option<Selection>> {
        if self.query.is_empty() {
            return Ok(self.commit(captured, Selection::All));
        }

        self.loading.set(true);
        let needle = self.query.to_lowercase();
        let mut ids = Vec::new();
        let mut scanned = 0usize;

        let mut stream = store.scan_all(table);
        loop {
            let record = match stream.try_next().await {
                Ok(Some(record)) => record,
                Ok(None) => break,
                Err(e) if e.is_store_unavailable() => {
                    return Ok(self.commit(captured, Selection::empty()));
                }
                Err(e) => {
                    self.loading.set(false);
                    return Err(e);
                }
            };

            scanned += 1;
            if scanned % CANCEL_CHECK_INTERVAL == 0 && !self.generation.is_current(captured) {
                self.loading.set(false);
                tracing::debug!(table, query = %self.query, "text scan superseded mid-flight");
                return Ok(None);
            }

            let matches = self.fields.iter().any(|field| {
                record
                    .field_values(field)
                    .iter()
                    .any(|value| value.to_lowercase().contains(&needle))
            });
            if matches {
                ids.push(record.id);
            }
        }

        // Ascending already: scan_all yields in id order.
        Ok(self.commit(captured, Selection::Ids(ids)))
    }

    fn commit(&self, captured: u64, selection: Selection) -> Option<Selection> {
        self.loading.set(false);
        if self.generation.is_current(captured) {
            Some(selection)
        } else {
            tracing::debug!(query = %self.query, "discarding stale text selection");
            None
        }
    }
}

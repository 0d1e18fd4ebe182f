//! Key facet: filter on a categorical field (domain, search word, channel).
//!
//! Key values are normalized before counting and matching: hostnames are
//! reduced to their last two dot-separated labels, so
//! `www.sub.example.com` and `example.com` count together. This is a
//! heuristic, not a public-suffix algorithm; multi-label suffixes such as
//! `co.uk` are mis-normalized.

use std::collections::{BTreeMap, BTreeSet};

use futures::TryStreamExt;

use super::{Generation, Loading};
use crate::error::ExploreResult;
use crate::selection::Selection;
use crate::store::RowStore;

/// Reduce a key to its last two dot-separated labels.
pub fn normalize_key(raw: &str) -> String {
    let labels: Vec<&str> = raw.split('.').collect();
    if labels.len() <= 2 {
        raw.to_string()
    } else {
        labels[labels.len() - 2..].join(".")
    }
}

/// Count and member ids for one distinct key value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyEntry {
    pub count: u64,
    pub ids: Vec<u64>,
}

/// Frequency map over a candidate selection, keyed by normalized value.
pub type KeyCounts = BTreeMap<String, KeyEntry>;

#[derive(Debug, Default)]
pub struct KeySet {
    field: String,
    chosen: BTreeSet<String>,
    pub generation: Generation,
    pub loading: Loading,
}

impl KeySet {
    pub fn new(field: impl Into<String>) -> Self {
        KeySet {
            field: field.into(),
            ..Default::default()
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn chosen(&self) -> &BTreeSet<String> {
        &self.chosen
    }

    /// Replace the chosen key set (values are normalized on the way in).
    /// Returns the generation a matching recompute must carry.
    pub fn set_chosen<I, S>(&mut self, keys: I) -> u64
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.chosen = keys
            .into_iter()
            .map(|k| normalize_key(k.as_ref()))
            .collect();
        self.generation.bump()
    }

    /// The single chosen key, when exactly one is selected. Gates the
    /// per-URL drill-down level.
    pub fn drilldown_key(&self) -> Option<&str> {
        if self.chosen.len() == 1 {
            self.chosen.iter().next().map(String::as_str)
        } else {
            None
        }
    }

    /// Compute the out-selection: ids whose normalized key is in the
    /// chosen set, over the full table. `All` when no keys are chosen.
    /// `Ok(None)` means the scan was superseded and must be discarded.
    pub async fn evaluate(
        &self,
        store: &dyn RowStore,
        table: &str,
        captured: u64,
    ) -> ExploreResult<Option<Selection>> {
        if self.chosen.is_empty() {
            return Ok(self.commit(captured, Selection::All));
        }

        self.loading.set(true);
        let mut ids = Vec::new();
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

            if !self.generation.is_current(captured) {
                self.loading.set(false);
                return Ok(None);
            }

            let matches = record
                .field_values(&self.field)
                .into_iter()
                .filter(|v| !v.is_empty())
                .any(|v| self.chosen.contains(&normalize_key(v)));
            if matches {
                ids.push(record.id);
            }
        }

        Ok(self.commit(captured, Selection::Ids(ids)))
    }

    /// Frequency map over the candidate selection. Built over the *full*
    /// candidate set, not just the chosen keys, so a picker can show every
    /// distinct value with its count.
    pub async fn key_counts(
        &self,
        store: &dyn RowStore,
        table: &str,
        candidates: &Selection,
    ) -> ExploreResult<KeyCounts> {
        let mut counts = KeyCounts::new();
        let mut stream = scan_candidates(store, table, candidates);
        loop {
            let record = match stream.try_next().await {
                Ok(Some(record)) => record,
                Ok(None) => break,
                Err(e) if e.is_store_unavailable() => return Ok(counts),
                Err(e) => return Err(e),
            };
            for value in record.field_values(&self.field) {
                if value.is_empty() {
                    continue;
                }
                let entry = counts.entry(normalize_key(value)).or_default();
                entry.count += 1;
                entry.ids.push(record.id);
            }
        }
        Ok(counts)
    }

    /// Per-URL counts under the single chosen key, restricted to candidate
    /// rows that already match that key. Empty unless exactly one key is
    /// chosen.
    pub async fn drilldown_counts(
        &self,
        store: &dyn RowStore,
        table: &str,
        candidates: &Selection,
        url_field: &str,
    ) -> ExploreResult<KeyCounts> {
        let key = match self.drilldown_key() {
            Some(key) => key.to_string(),
            None => return Ok(KeyCounts::new()),
        };

        let mut counts = KeyCounts::new();
        let mut stream = scan_candidates(store, table, candidates);
        loop {
            let record = match stream.try_next().await {
                Ok(Some(record)) => record,
                Ok(None) => break,
                Err(e) if e.is_store_unavailable() => return Ok(counts),
                Err(e) => return Err(e),
            };
            let in_key = record
                .field_values(&self.field)
                .into_iter()
                .any(|v| normalize_key(v) == key);
            if !in_key {
                continue;
            }
            if let Some(url) = record.field_str(url_field) {
                if url != key {
                    let entry = counts.entry(url.to_string()).or_default();
                    entry.count += 1;
                    entry.ids.push(record.id);
                }
            }
        }
        Ok(counts)
    }

    fn commit(&self, captured: u64, selection: Selection) -> Option<Selection> {
        self.loading.set(false);
        if self.generation.is_current(captured) {
            Some(selection)
        } else {
            tracing::debug!(field = %self.field, "discarding stale key selection");
            None
        }
    }
}

/// Scan either the whole table or only the candidate ids.
pub(crate) fn scan_candidates(
    store: &dyn RowStore,
    table: &str,
    candidates: &Selection,
) -> crate::store::RecordStream {
    match candidates {
        Selection::All => store.scan_all(table),
        Selection::Ids(ids) => store.scan_by_ids(table, ids.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_keeps_last_two_labels() {
        assert_eq!(normalize_key("www.sub.example.com"), "example.com");
        assert_eq!(normalize_key("example.com"), "example.com");
        assert_eq!(normalize_key("localhost"), "localhost");
        assert_eq!(normalize_key("rust"), "rust");
    }

    #[test]
    fn drilldown_requires_exactly_one_key() {
        let mut facet = KeySet::new("domain");
        assert_eq!(facet.drilldown_key(), None);
        facet.set_chosen(["a.com"]);
        assert_eq!(facet.drilldown_key(), Some("a.com"));
        facet.set_chosen(["a.com", "b.com"]);
        assert_eq!(facet.drilldown_key(), None);
    }
}

//! Row selections: ordered id sets with an explicit "no filter" sentinel.
//!
//! A `Selection` is either `All` (the facet places no restriction) or an
//! ascending, duplicate-free list of row ids. `Ids(vec![])` is a real,
//! empty result and is distinct from `All`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
    /// No filter active: every row in the table is selected.
    All,
    /// Ascending, duplicate-free row ids.
    Ids(Vec<u64>),
}

impl Selection {
    /// An empty but *filtered* selection.
    pub fn empty() -> Self {
        Selection::Ids(Vec::new())
    }

    /// Build a selection from ids in arbitrary order (sorts and dedups).
    pub fn from_unsorted(mut ids: Vec<u64>) -> Self {
        ids.sort_unstable();
        ids.dedup();
        Selection::Ids(ids)
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }

    /// Number of selected rows, given the table's total row count.
    pub fn count(&self, total: u64) -> u64 {
        match self {
            Selection::All => total,
            Selection::Ids(ids) => ids.len() as u64,
        }
    }

    pub fn contains(&self, id: u64) -> bool {
        match self {
            Selection::All => true,
            Selection::Ids(ids) => ids.binary_search(&id).is_ok(),
        }
    }

    /// The ids in `[offset, offset + limit)`, preserving selection order.
    /// Past-the-end requests yield an empty slice, never an error.
    pub fn window(&self, offset: usize, limit: usize) -> &[u64] {
        match self {
            Selection::All => &[],
            Selection::Ids(ids) => {
                let start = offset.min(ids.len());
                let end = offset.saturating_add(limit).min(ids.len());
                &ids[start..end]
            }
        }
    }

    /// Intersect two selections. `All` is the identity element. For two id
    /// lists this is a single linear merge over the ascending inputs, so
    /// the cost is O(|a| + |b|) rather than a nested membership scan.
    pub fn intersect(&self, other: &Selection) -> Selection {
        match (self, other) {
            (Selection::All, _) => other.clone(),
            (_, Selection::All) => self.clone(),
            (Selection::Ids(a), Selection::Ids(b)) => {
                let mut out = Vec::with_capacity(a.len().min(b.len()));
                let (mut i, mut j) = (0, 0);
                while i < a.len() && j < b.len() {
                    match a[i].cmp(&b[j]) {
                        std::cmp::Ordering::Less => i += 1,
                        std::cmp::Ordering::Greater => j += 1,
                        std::cmp::Ordering::Equal => {
                            out.push(a[i]);
                            i += 1;
                            j += 1;
                        }
                    }
                }
                Selection::Ids(out)
            }
        }
    }

    /// Intersect any number of selections. Returns `All` only when every
    /// input is `All`; otherwise the merge of all id lists.
    pub fn intersect_all<'a, I>(parts: I) -> Selection
    where
        I: IntoIterator<Item = &'a Selection>,
    {
        let mut acc = Selection::All;
        for part in parts {
            if part.is_all() {
                continue;
            }
            acc = acc.intersect(part);
            if let Selection::Ids(ids) = &acc {
                if ids.is_empty() {
                    break;
                }
            }
        }
        acc
    }
}

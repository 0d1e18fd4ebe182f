//! The three facet evaluators and the machinery they share.
//!
//! Each facet owns its raw parameter (query string, chosen keys, date
//! bounds) and computes an *out-selection* from the store alone. The
//! candidate ("in") selection a facet exposes to consumers is derived by
//! the explorer from the *other* facets' outputs, never from its own —
//! that is what keeps the dependency graph acyclic.

pub mod date;
pub mod key;
pub mod text;

pub use date::DateRange;
pub use key::{KeyCounts, KeyEntry, KeySet};
pub use text::TextQuery;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::selection::Selection;

/// The three filter dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetKind {
    Text,
    Key,
    Date,
}

impl FacetKind {
    pub const ALL: [FacetKind; 3] = [FacetKind::Text, FacetKind::Key, FacetKind::Date];

    pub fn index(self) -> usize {
        match self {
            FacetKind::Text => 0,
            FacetKind::Key => 1,
            FacetKind::Date => 2,
        }
    }
}

/// One facet's current selections.
#[derive(Debug, Clone)]
pub struct FacetState {
    /// Candidates supplied by the other facets.
    pub input: Selection,
    /// This facet's own matches.
    pub output: Selection,
}

impl Default for FacetState {
    fn default() -> Self {
        FacetState {
            input: Selection::All,
            output: Selection::All,
        }
    }
}

/// Monotone generation counter for cancel-on-supersede.
///
/// A recomputation captures the counter value when it starts; a completing
/// scan commits only if its captured value is still current. Bumping the
/// counter (new parameter, store delete) silently invalidates every scan
/// still in flight.
#[derive(Debug, Default)]
pub struct Generation(AtomicU64);

impl Generation {
    pub fn bump(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, captured: u64) -> bool {
        self.current() == captured
    }
}

/// Per-facet in-flight flag; the explorer ORs the three together into the
/// single consolidated loading signal.
#[derive(Debug, Default)]
pub struct Loading(AtomicBool);

impl Loading {
    pub fn set(&self, value: bool) {
        self.0.store(value, Ordering::SeqCst);
    }

    pub fn get(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_invalidates_older_captures() {
        let generation = Generation::default();
        let captured = generation.bump();
        assert!(generation.is_current(captured));
        generation.bump();
        assert!(!generation.is_current(captured));
    }
}

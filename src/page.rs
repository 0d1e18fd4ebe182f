//! Paginated row access over a selection, and the delete flow that a list
//! view drives.

use serde::{Deserialize, Serialize};

use crate::error::{ExploreError, ExploreResult};
use crate::selection::Selection;
use crate::store::{Record, RowStore};

/// Fetch one ordered page of rows for a selection.
///
/// With no active filter this delegates to the store's native paged scan
/// (ascending by id). With an id selection it resolves
/// `selection[offset..offset + limit]` against the store, preserving the
/// selection's own order. Requests past the end return an empty batch.
pub async fn page(
    store: &dyn RowStore,
    table: &str,
    selection: &Selection,
    offset: usize,
    limit: usize,
) -> ExploreResult<Vec<Record>> {
    let result = match selection {
        Selection::All => store.page_batch(table, offset, limit).await,
        Selection::Ids(_) => {
            let window = selection.window(offset, limit);
            store.rows_by_ids(table, window).await
        }
    };
    match result {
        Ok(rows) => Ok(rows),
        Err(e) if e.is_store_unavailable() => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

/// Whether a delete call should ask first. Explicit per call; the caller
/// owns any "don't ask again" persistence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DeleteConfig {
    pub confirm: bool,
}

impl Default for DeleteConfig {
    fn default() -> Self {
        DeleteConfig { confirm: true }
    }
}

/// The delete flow: `Idle → ConfirmPending → Deleting → Idle`, with the
/// confirmation step skipped when the config says not to ask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletePhase {
    Idle,
    ConfirmPending { ids: Vec<u64> },
    Deleting,
}

#[derive(Debug)]
pub struct DeleteFlow {
    phase: DeletePhase,
}

impl Default for DeleteFlow {
    fn default() -> Self {
        DeleteFlow {
            phase: DeletePhase::Idle,
        }
    }
}

impl DeleteFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &DeletePhase {
        &self.phase
    }

    /// Request deletion of `ids`. Returns the ids to delete right away
    /// when no confirmation is needed, otherwise parks them in
    /// `ConfirmPending`.
    pub fn request(&mut self, ids: Vec<u64>, config: DeleteConfig) -> Option<Vec<u64>> {
        if config.confirm {
            self.phase = DeletePhase::ConfirmPending { ids };
            None
        } else {
            self.phase = DeletePhase::Deleting;
            Some(ids)
        }
    }

    /// Confirm a pending request; returns the ids to delete.
    pub fn confirm(&mut self) -> Option<Vec<u64>> {
        match std::mem::replace(&mut self.phase, DeletePhase::Idle) {
            DeletePhase::ConfirmPending { ids } => {
                self.phase = DeletePhase::Deleting;
                Some(ids)
            }
            other => {
                self.phase = other;
                None
            }
        }
    }

    /// Abandon a pending request.
    pub fn cancel(&mut self) {
        if matches!(self.phase, DeletePhase::ConfirmPending { .. }) {
            self.phase = DeletePhase::Idle;
        }
    }

    /// Run the store delete for ids previously released by `request` or
    /// `confirm`, then return to `Idle`. A store failure also returns to
    /// `Idle`: facet state is not corrupted, the next recompute simply
    /// reads the store's actual contents.
    pub async fn execute(
        &mut self,
        store: &dyn RowStore,
        table: &str,
        ids: &[u64],
    ) -> ExploreResult<()> {
        let result = store.delete_by_ids(table, ids).await;
        self.phase = DeletePhase::Idle;
        result.map_err(|e| ExploreError::DeleteFailure(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirm_path_walks_all_phases() {
        let mut flow = DeleteFlow::new();
        assert_eq!(*flow.phase(), DeletePhase::Idle);

        let released = flow.request(vec![1, 2], DeleteConfig { confirm: true });
        assert!(released.is_none());
        assert!(matches!(flow.phase(), DeletePhase::ConfirmPending { .. }));

        let ids = flow.confirm().unwrap();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(*flow.phase(), DeletePhase::Deleting);
    }

    #[test]
    fn dont_ask_skips_confirmation() {
        let mut flow = DeleteFlow::new();
        let released = flow.request(vec![7], DeleteConfig { confirm: false });
        assert_eq!(released, Some(vec![7]));
        assert_eq!(*flow.phase(), DeletePhase::Deleting);
    }

    #[test]
    fn cancel_returns_to_idle() {
        let mut flow = DeleteFlow::new();
        flow.request(vec![1], DeleteConfig { confirm: true });
        flow.cancel();
        assert_eq!(*flow.phase(), DeletePhase::Idle);
        assert!(flow.confirm().is_none());
    }
}

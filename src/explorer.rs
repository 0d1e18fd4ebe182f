//! The exploration session: one table, three facets, one combined
//! selection.
//!
//! Facet outputs are leaf values recomputed from the store and the
//! facet's own parameter. Everything else — each facet's candidate input
//! and the combined selection — is a pure derivation over the current
//! outputs, recomputed after every committed change. A facet never
//! consumes its own output, so there is no feedback cycle and nothing to
//! invalidate by hand.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::aggregate::{CalendarHistogram, FrequencyTree, Statistics, TemporalFacts};
use crate::config::TableConfig;
use crate::donate::DonationPayload;
use crate::error::ExploreResult;
use crate::facet::key::KeyCounts;
use crate::facet::{DateRange, FacetKind, FacetState, KeySet, TextQuery};
use crate::page::{self, DeleteConfig, DeleteFlow, DeletePhase};
use crate::selection::Selection;
use crate::store::{Record, RowStore};

/// What a delete request did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Rows were removed and all facets recomputed.
    Deleted,
    /// Waiting for `confirm_delete` / `cancel_delete`.
    ConfirmPending,
}

pub struct Explorer {
    store: Arc<dyn RowStore>,
    config: TableConfig,
    /// Every table the session reports per-source totals for.
    all_tables: Vec<String>,
    text: TextQuery,
    key: KeySet,
    date: DateRange,
    states: [FacetState; 3],
    combined: Selection,
    delete_flow: DeleteFlow,
}

impl Explorer {
    pub fn new(store: Arc<dyn RowStore>, config: TableConfig, all_tables: Vec<String>) -> Self {
        let text = TextQuery::new(config.search_on.clone());
        let key = KeySet::new(config.key_field.clone());
        Explorer {
            store,
            config,
            all_tables,
            text,
            key,
            date: DateRange::new(),
            states: Default::default(),
            combined: Selection::All,
            delete_flow: DeleteFlow::new(),
        }
    }

    pub fn table(&self) -> &str {
        &self.config.table
    }

    /// The combined selection: intersection of all facet outputs, or
    /// `All` when no facet filters.
    pub fn selection(&self) -> &Selection {
        &self.combined
    }

    pub fn facet_state(&self, kind: FacetKind) -> &FacetState {
        &self.states[kind.index()]
    }

    /// The candidate selection facet `kind` may consume: the intersection
    /// of every *other* facet's output.
    pub fn input_for(&self, kind: FacetKind) -> &Selection {
        &self.states[kind.index()].input
    }

    /// Consolidated busy signal: true while any facet scan is in flight.
    pub fn loading(&self) -> bool {
        self.text.loading.get() || self.key.loading.get() || self.date.loading.get()
    }

    // --- facet parameter changes -----------------------------------------

    pub async fn set_query(&mut self, query: &str) -> ExploreResult<()> {
        let captured = self.text.set_query(query);
        tracing::debug!(table = %self.config.table, query, "text facet changed");
        self.recompute(FacetKind::Text, captured).await
    }

    pub async fn set_keys<I, S>(&mut self, keys: I) -> ExploreResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let captured = self.key.set_chosen(keys);
        tracing::debug!(table = %self.config.table, "key facet changed");
        self.recompute(FacetKind::Key, captured).await
    }

    pub async fn set_start(&mut self, day: NaiveDate) -> ExploreResult<()> {
        let captured = self.date.set_start(day);
        self.recompute(FacetKind::Date, captured).await
    }

    pub async fn set_end(&mut self, day: NaiveDate) -> ExploreResult<()> {
        let captured = self.date.set_end(day);
        self.recompute(FacetKind::Date, captured).await
    }

    pub async fn clear_range(&mut self) -> ExploreResult<()> {
        let captured = self.date.clear();
        self.recompute(FacetKind::Date, captured).await
    }

    /// Recompute one facet's output; commit and re-derive unless a newer
    /// generation superseded the scan while it ran.
    async fn recompute(&mut self, kind: FacetKind, captured: u64) -> ExploreResult<()> {
        let store = self.store.clone();
        let table = self.config.table.clone();
        let committed = match kind {
            FacetKind::Text => self.text.evaluate(store.as_ref(), &table, captured).await?,
            FacetKind::Key => self.key.evaluate(store.as_ref(), &table, captured).await?,
            FacetKind::Date => self.date.evaluate(store.as_ref(), &table, captured).await?,
        };
        if let Some(output) = committed {
            self.states[kind.index()].output = output;
            self.derive();
        }
        Ok(())
    }

    /// Pure re-derivation of inputs and the combined selection from the
    /// three current outputs. Synchronous; never suspends.
    fn derive(&mut self) {
        let outputs: Vec<Selection> =
            self.states.iter().map(|s| s.output.clone()).collect();
        self.combined = Selection::intersect_all(outputs.iter());
        for kind in FacetKind::ALL {
            let others = outputs
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != kind.index())
                .map(|(_, s)| s);
            self.states[kind.index()].input = Selection::intersect_all(others);
        }
    }

    /// Recompute every facet output against the store's current contents.
    pub async fn refresh_all(&mut self) -> ExploreResult<()> {
        for kind in FacetKind::ALL {
            let captured = match kind {
                FacetKind::Text => self.text.generation.bump(),
                FacetKind::Key => self.key.generation.bump(),
                FacetKind::Date => self.date.generation.bump(),
            };
            self.recompute(kind, captured).await?;
        }
        Ok(())
    }

    // --- aggregates ------------------------------------------------------

    /// Key frequency map for the picker, over this facet's candidates.
    pub async fn key_counts(&self) -> ExploreResult<KeyCounts> {
        self.key
            .key_counts(
                self.store.as_ref(),
                &self.config.table,
                self.input_for(FacetKind::Key),
            )
            .await
    }

    /// The frequency tree: categories, keys, and the drill-down URL level
    /// when exactly one key is chosen.
    pub async fn tree(&self) -> ExploreResult<FrequencyTree> {
        let candidates = self.input_for(FacetKind::Key);
        let keys = self
            .key
            .key_counts(self.store.as_ref(), &self.config.table, candidates)
            .await?;
        let urls = self
            .key
            .drilldown_counts(
                self.store.as_ref(),
                &self.config.table,
                candidates,
                &self.config.url_field,
            )
            .await?;
        Ok(FrequencyTree::build(
            &keys,
            &self.config.categories,
            self.key.drilldown_key(),
            &urls,
        ))
    }

    /// Calendar histogram over the date facet's candidates — never over
    /// its own output, or selecting a range would empty the chart.
    pub async fn calendar(&self) -> ExploreResult<CalendarHistogram> {
        CalendarHistogram::compute(
            self.store.as_ref(),
            &self.config.table,
            self.input_for(FacetKind::Date),
        )
        .await
    }

    pub async fn statistics(&self) -> ExploreResult<Statistics> {
        let keys = self
            .key
            .key_counts(self.store.as_ref(), &self.config.table, &self.combined)
            .await?;
        Statistics::compute(
            self.store.as_ref(),
            &self.config.table,
            &self.combined,
            &keys,
            &self.all_tables,
        )
        .await
    }

    pub async fn facts(&self) -> ExploreResult<TemporalFacts> {
        TemporalFacts::compute(self.store.as_ref(), &self.config.table, &self.combined).await
    }

    // --- rows ------------------------------------------------------------

    /// One ordered page of the combined selection. Monotone offsets give
    /// infinite-scroll accumulation; the accumulator lives with the
    /// caller and must be dropped after a delete.
    pub async fn page(&self, offset: usize, limit: usize) -> ExploreResult<Vec<Record>> {
        page::page(
            self.store.as_ref(),
            &self.config.table,
            &self.combined,
            offset,
            limit,
        )
        .await
    }

    /// Package the currently selected rows for an external donation sink.
    pub async fn donation(&self) -> ExploreResult<DonationPayload> {
        DonationPayload::collect(self.store.as_ref(), &self.config.table, &self.combined).await
    }

    // --- deletion --------------------------------------------------------

    pub fn delete_phase(&self) -> &DeletePhase {
        self.delete_flow.phase()
    }

    /// Ask to delete rows. With `confirm` set this parks the ids until
    /// `confirm_delete`; otherwise the delete runs immediately.
    pub async fn request_delete(
        &mut self,
        ids: Vec<u64>,
        config: DeleteConfig,
    ) -> ExploreResult<DeleteOutcome> {
        match self.delete_flow.request(ids, config) {
            Some(ids) => {
                self.execute_delete(ids).await?;
                Ok(DeleteOutcome::Deleted)
            }
            None => Ok(DeleteOutcome::ConfirmPending),
        }
    }

    pub async fn confirm_delete(&mut self) -> ExploreResult<DeleteOutcome> {
        match self.delete_flow.confirm() {
            Some(ids) => {
                self.execute_delete(ids).await?;
                Ok(DeleteOutcome::Deleted)
            }
            None => Ok(DeleteOutcome::ConfirmPending),
        }
    }

    pub fn cancel_delete(&mut self) {
        self.delete_flow.cancel();
    }

    async fn execute_delete(&mut self, ids: Vec<u64>) -> ExploreResult<()> {
        let store = self.store.clone();
        let table = self.config.table.clone();
        tracing::info!(table = %table, n = ids.len(), "deleting rows");

        // Any scan that started before the delete saw rows that may no
        // longer exist; bump every generation so those results are
        // discarded at commit time.
        self.text.generation.bump();
        self.key.generation.bump();
        self.date.generation.bump();

        self.delete_flow
            .execute(store.as_ref(), &table, &ids)
            .await?;
        self.refresh_all().await
    }
}

/// Build an explorer with the default category map merged from config.
pub fn explorer_for(
    store: Arc<dyn RowStore>,
    config: &crate::config::ExploreConfig,
    table: &str,
) -> Option<Explorer> {
    let table_config = config.table(table)?.clone();
    Some(Explorer::new(store, table_config, config.table_names()))
}

impl std::fmt::Debug for Explorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Explorer")
            .field("table", &self.config.table)
            .field("query", &self.text.query())
            .field("chosen", &self.key.chosen())
            .field("combined", &self.combined)
            .finish()
    }
}

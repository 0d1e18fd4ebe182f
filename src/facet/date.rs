//! Date-range facet: inclusive `[start, end]` over row timestamps.
//!
//! Bounds are set one at a time from a calendar day. The start bound
//! normalizes to that day's midnight, the end bound to 23:59:59. Setting
//! a bound that would invert the range clamps it to the existing opposite
//! bound instead of producing an invalid range.

use chrono::{NaiveDate, NaiveDateTime};
use futures::TryStreamExt;

use super::{Generation, Loading};
use crate::error::ExploreResult;
use crate::selection::Selection;
use crate::store::RowStore;

#[derive(Debug, Default)]
pub struct DateRange {
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
    pub generation: Generation,
    pub loading: Loading,
}

impl DateRange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self) -> Option<NaiveDateTime> {
        self.start
    }

    pub fn end(&self) -> Option<NaiveDateTime> {
        self.end
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Set the start bound to `day` at 00:00:00, clamping to the existing
    /// end when `day` lies past it. Returns the recompute generation.
    pub fn set_start(&mut self, day: NaiveDate) -> u64 {
        let mut day = day;
        if let Some(end) = self.end {
            if end.date() < day {
                day = end.date();
            }
        }
        self.start = day.and_hms_opt(0, 0, 0);
        self.generation.bump()
    }

    /// Set the end bound to `day` at 23:59:59, clamping to the existing
    /// start when `day` lies before it.
    pub fn set_end(&mut self, day: NaiveDate) -> u64 {
        let mut day = day;
        if let Some(start) = self.start {
            if start.date() > day {
                day = start.date();
            }
        }
        self.end = day.and_hms_opt(23, 59, 59);
        self.generation.bump()
    }

    /// Drop both bounds.
    pub fn clear(&mut self) -> u64 {
        self.start = None;
        self.end = None;
        self.generation.bump()
    }

    /// Compute the out-selection: ids whose date falls inside the bounds,
    /// over the full table. `All` when both bounds are unset. `Ok(None)`
    /// means the scan was superseded and must be discarded.
    pub async fn evaluate(
        &self,
        store: &dyn RowStore,
        table: &str,
        captured: u64,
    ) -> ExploreResult<Option<Selection>> {
        if self.is_unbounded() {
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

            if self.contains(record.date) {
                ids.push(record.id);
            }
        }

        Ok(self.commit(captured, Selection::Ids(ids)))
    }

    fn contains(&self, date: NaiveDateTime) -> bool {
        if let Some(start) = self.start {
            if date < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if date > end {
                return false;
            }
        }
        true
    }

    fn commit(&self, captured: u64, selection: Selection) -> Option<Selection> {
        self.loading.set(false);
        if self.generation.is_current(captured) {
            Some(selection)
        } else {
            tracing::debug!("discarding stale date selection");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn bounds_normalize_to_day_edges() {
        let mut range = DateRange::new();
        range.set_start(day(5));
        range.set_end(day(8));
        assert_eq!(range.start().unwrap(), day(5).and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(range.end().unwrap(), day(8).and_hms_opt(23, 59, 59).unwrap());
    }

    #[test]
    fn inverted_start_clamps_to_end() {
        let mut range = DateRange::new();
        range.set_end(day(8));
        range.set_start(day(20));
        assert_eq!(range.start().unwrap().date(), day(8));
    }

    #[test]
    fn inverted_end_clamps_to_start() {
        let mut range = DateRange::new();
        range.set_start(day(10));
        range.set_end(day(2));
        assert_eq!(range.end().unwrap().date(), day(10));
        assert_eq!(range.end().unwrap(), day(10).and_hms_opt(23, 59, 59).unwrap());
    }

    #[test]
    fn clear_drops_both_bounds() {
        let mut range = DateRange::new();
        range.set_start(day(1));
        range.set_end(day(2));
        range.clear();
        assert!(range.is_unbounded());
    }
}

//! Calendar histogram: one count per day over a contiguous span, plus a
//! day-of-week histogram.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use futures::TryStreamExt;
use serde::Serialize;

use crate::error::ExploreResult;
use crate::facet::key::scan_candidates;
use crate::selection::Selection;
use crate::store::RowStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCount {
    pub date: NaiveDate,
    pub count: u64,
}

/// Per-day counts spanning `[min, max]` of the candidate dates with no
/// holes (zero-count days included, as heatmap rendering requires), plus
/// counts per weekday indexed from Monday.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CalendarHistogram {
    pub days: Vec<DayCount>,
    pub weekdays: [u64; 7],
    pub min: Option<NaiveDate>,
    pub max: Option<NaiveDate>,
}

impl CalendarHistogram {
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Build the histogram over the candidate rows of a table.
    pub async fn compute(
        store: &dyn RowStore,
        table: &str,
        candidates: &Selection,
    ) -> ExploreResult<CalendarHistogram> {
        let mut per_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();
        let mut weekdays = [0u64; 7];

        let mut stream = scan_candidates(store, table, candidates);
        loop {
            let record = match stream.try_next().await {
                Ok(Some(record)) => record,
                Ok(None) => break,
                Err(e) if e.is_store_unavailable() => break,
                Err(e) => return Err(e),
            };
            let day = record.date.date();
            *per_day.entry(day).or_insert(0) += 1;
            weekdays[record.date.weekday().num_days_from_monday() as usize] += 1;
        }

        let (min, max) = match (per_day.keys().next(), per_day.keys().next_back()) {
            (Some(&min), Some(&max)) => (min, max),
            _ => return Ok(CalendarHistogram::default()),
        };

        // Fill the zero-count days so the span is contiguous.
        let mut days = Vec::new();
        let mut day = min;
        while day <= max {
            days.push(DayCount {
                date: day,
                count: per_day.get(&day).copied().unwrap_or(0),
            });
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }

        Ok(CalendarHistogram {
            days,
            weekdays,
            min: Some(min),
            max: Some(max),
        })
    }
}

//! Temporal "fun facts" derived from the filtered timestamps.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use futures::TryStreamExt;

use crate::error::ExploreResult;
use crate::facet::key::scan_candidates;
use crate::selection::Selection;
use crate::store::RowStore;

/// Facts over the selected rows' timestamps. Every field is "no data"
/// (`None` / zero) when the selection is empty; a single row makes the
/// typical start and end equal its own time-of-day and the longest gap 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemporalFacts {
    /// Day of the week with the most rows.
    pub modal_weekday: Option<Weekday>,
    /// Average time-of-day of each day's first row.
    pub typical_start: Option<NaiveTime>,
    /// Average time-of-day of each day's last row.
    pub typical_end: Option<NaiveTime>,
    /// The single day with the most rows, and that count.
    pub busiest_day: Option<(NaiveDate, u64)>,
    /// Longest gap in days between temporally adjacent rows.
    pub longest_gap_days: i64,
    /// Time-of-day of the row at the sorted-by-time-of-day midpoint.
    pub median_time: Option<NaiveTime>,
}

impl TemporalFacts {
    /// Collect the selection's timestamps and derive the facts.
    pub async fn compute(
        store: &dyn RowStore,
        table: &str,
        selection: &Selection,
    ) -> ExploreResult<TemporalFacts> {
        let mut times = Vec::new();
        let mut stream = scan_candidates(store, table, selection);
        loop {
            match stream.try_next().await {
                Ok(Some(record)) => times.push(record.date),
                Ok(None) => break,
                Err(e) if e.is_store_unavailable() => break,
                Err(e) => return Err(e),
            }
        }
        Ok(TemporalFacts::from_timestamps(times))
    }

    /// Derive the facts from raw timestamps (any order).
    pub fn from_timestamps(mut times: Vec<NaiveDateTime>) -> TemporalFacts {
        if times.is_empty() {
            return TemporalFacts::default();
        }
        times.sort_unstable();

        // Per-weekday and per-day tallies, one pass.
        let mut weekday_counts = [0u64; 7];
        let mut per_day: BTreeMap<NaiveDate, (u64, NaiveTime, NaiveTime)> = BTreeMap::new();
        for t in &times {
            weekday_counts[t.weekday().num_days_from_monday() as usize] += 1;
            let entry = per_day
                .entry(t.date())
                .or_insert((0, t.time(), t.time()));
            entry.0 += 1;
            entry.1 = entry.1.min(t.time());
            entry.2 = entry.2.max(t.time());
        }

        let modal_weekday = weekday_counts
            .iter()
            .enumerate()
            .max_by_key(|(i, &count)| (count, std::cmp::Reverse(*i)))
            .map(|(i, _)| weekday_from_monday_index(i));

        let n_days = per_day.len() as u64;
        let first_sum: u64 = per_day.values().map(|(_, first, _)| seconds(*first)).sum();
        let last_sum: u64 = per_day.values().map(|(_, _, last)| seconds(*last)).sum();
        let typical_start = time_from_seconds(first_sum / n_days);
        let typical_end = time_from_seconds(last_sum / n_days);

        let busiest_day = per_day
            .iter()
            .max_by_key(|(date, (count, _, _))| (*count, std::cmp::Reverse(**date)))
            .map(|(date, (count, _, _))| (*date, *count));

        let longest_gap_days = times
            .windows(2)
            .map(|pair| {
                let seconds = (pair[1] - pair[0]).num_seconds() as f64;
                (seconds / 86_400.0).round() as i64
            })
            .max()
            .unwrap_or(0);

        let mut by_time: Vec<NaiveTime> = times.iter().map(|t| t.time()).collect();
        by_time.sort_unstable();
        let median_time = Some(by_time[by_time.len() / 2]);

        TemporalFacts {
            modal_weekday,
            typical_start,
            typical_end,
            busiest_day,
            longest_gap_days,
            median_time,
        }
    }
}

fn seconds(t: NaiveTime) -> u64 {
    t.num_seconds_from_midnight() as u64
}

fn time_from_seconds(s: u64) -> Option<NaiveTime> {
    NaiveTime::from_num_seconds_from_midnight_opt(s as u32, 0)
}

fn weekday_from_monday_index(i: usize) -> Weekday {
    match i {
        0 => Weekday::Mon,
        1 => Weekday::Tue,
        2 => Weekday::Wed,
        3 => Weekday::Thu,
        4 => Weekday::Fri,
        5 => Weekday::Sat,
        _ => Weekday::Sun,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn no_rows_means_no_data() {
        let facts = TemporalFacts::from_timestamps(vec![]);
        assert_eq!(facts, TemporalFacts::default());
        assert_eq!(facts.longest_gap_days, 0);
        assert!(facts.modal_weekday.is_none());
    }

    #[test]
    fn single_row_start_equals_end() {
        let facts = TemporalFacts::from_timestamps(vec![at(3, 14, 30)]);
        assert_eq!(facts.longest_gap_days, 0);
        let t = NaiveTime::from_hms_opt(14, 30, 0).unwrap();
        assert_eq!(facts.typical_start, Some(t));
        assert_eq!(facts.typical_end, Some(t));
        assert_eq!(facts.median_time, Some(t));
    }

    #[test]
    fn gap_and_busiest_day() {
        // Three rows on day 1, one row on day 9.
        let times = vec![at(1, 9, 0), at(1, 12, 0), at(1, 20, 0), at(9, 10, 0)];
        let facts = TemporalFacts::from_timestamps(times);
        assert_eq!(facts.longest_gap_days, 8);
        assert_eq!(
            facts.busiest_day,
            Some((NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 3))
        );
    }

    #[test]
    fn typical_start_averages_daily_first_events() {
        // Day 1 starts 08:00, day 2 starts 10:00 -> typical start 09:00.
        let times = vec![at(1, 8, 0), at(1, 22, 0), at(2, 10, 0), at(2, 20, 0)];
        let facts = TemporalFacts::from_timestamps(times);
        assert_eq!(facts.typical_start, NaiveTime::from_hms_opt(9, 0, 0));
        assert_eq!(facts.typical_end, NaiveTime::from_hms_opt(21, 0, 0));
    }
}

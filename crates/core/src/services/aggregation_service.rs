use log::{debug, warn};
use std::collections::BTreeMap;

use crate::errors::CoreError;
use crate::models::chart::{AggregatedPoint, Frequency, MonthlyRecord};
use crate::models::date_key::DateKey;
use crate::models::observation::ObservationStore;
use crate::models::settings::{AggregationQuery, MAX_RANGE_DAYS};

/// Length of the trailing window summed by the rolling series, in days (inclusive).
pub const ROLLING_WINDOW_DAYS: i64 = 30;

/// How far back the rolling series looks for its year-over-year comparison.
///
/// A fixed 365 days, so across a leap day the compared window sits one day
/// off the true same-season window.
pub const PRIOR_YEAR_OFFSET_DAYS: i64 = 365;

/// Round to 2 decimal places. Applied only where a value is attached to output.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage change from `prev` to `curr`.
///
/// `None` when `prev` is missing or zero; division by zero is never attempted.
pub fn growth_pct(curr: f64, prev: Option<f64>) -> Option<f64> {
    match prev {
        Some(p) if p != 0.0 => Some((curr - p) / p * 100.0),
        _ => None,
    }
}

/// Derives the daily, rolling-30 and monthly views of an observation store.
///
/// Every method is a pure function of its inputs: the store is only borrowed,
/// so a caller may hand the engine any snapshot and decide refresh timing itself.
pub struct AggregationService;

impl AggregationService {
    pub fn new() -> Self {
        Self
    }

    /// Produce the series requested by `query`.
    ///
    /// Returns `NoData` when the store cannot anchor the window or the window
    /// contains nothing to aggregate.
    pub fn aggregate(
        &self,
        store: &ObservationStore,
        query: &AggregationQuery,
    ) -> Result<Vec<AggregatedPoint>, CoreError> {
        let (from, to) = self.resolve_window(store, query)?;

        let points = match query.frequency {
            Frequency::Daily => self.daily(store, from, to),
            Frequency::Rolling30 => self.rolling30(store, from, to),
        };
        debug!(
            "{} aggregation {from}..{to}: {} points",
            query.frequency,
            points.len()
        );

        if points.iter().all(|p| p.units.is_none()) {
            return Err(CoreError::NoData(format!(
                "no observations between {from} and {to}"
            )));
        }
        Ok(points)
    }

    /// Resolve the inclusive `[from, to]` window of a query.
    ///
    /// `to` defaults to the latest observed date, `from` to `to` minus the
    /// clamped range length. Reversed bounds are swapped. A window longer than
    /// [`MAX_RANGE_DAYS`] keeps its `to` and has `from` pulled forward.
    pub fn resolve_window(
        &self,
        store: &ObservationStore,
        query: &AggregationQuery,
    ) -> Result<(DateKey, DateKey), CoreError> {
        let to = query
            .to
            .or_else(|| store.latest())
            .ok_or_else(|| CoreError::NoData("the store has no observations".into()))?;
        let from = query
            .from
            .unwrap_or_else(|| to.sub_days(i64::from(query.effective_range_days())));

        let (from, to) = if from > to { (to, from) } else { (from, to) };

        let earliest_from = to.sub_days(i64::from(MAX_RANGE_DAYS));
        if from < earliest_from {
            warn!("window {from}..{to} exceeds {MAX_RANGE_DAYS} days; starting at {earliest_from}");
            return Ok((earliest_from, to));
        }
        Ok((from, to))
    }

    /// One point per observed date in `[from, to]`, compared with the same
    /// calendar day a year earlier.
    pub fn daily(&self, store: &ObservationStore, from: DateKey, to: DateKey) -> Vec<AggregatedPoint> {
        store
            .range(from, to)
            .map(|obs| {
                let prev = store.lookup_opt(obs.date.same_calendar_day_prior_year());
                AggregatedPoint {
                    date: obs.date,
                    label: obs.date.to_display(),
                    units: Some(round2(obs.value)),
                    prev_year_units: prev.map(round2),
                    yoy_pct: growth_pct(obs.value, prev).map(round2),
                    mom_pct: None,
                }
            })
            .collect()
    }

    /// One point per calendar day in `[from, to]`: the sum of observed values
    /// over the 30 days ending that day, against the window ending 365 days earlier.
    ///
    /// Missing days are skipped rather than counted as zero; a window with no
    /// observed day at all has no sum.
    pub fn rolling30(
        &self,
        store: &ObservationStore,
        from: DateKey,
        to: DateKey,
    ) -> Vec<AggregatedPoint> {
        let capacity = usize::try_from(to.days_since(from) + 1).unwrap_or(0);
        let mut points = Vec::with_capacity(capacity);
        let mut day = from;

        while day <= to {
            let current = trailing_sum(store, day);
            let prior = trailing_sum(store, day.sub_days(PRIOR_YEAR_OFFSET_DAYS));

            points.push(AggregatedPoint {
                date: day,
                label: day.to_display(),
                units: current.map(round2),
                prev_year_units: prior.map(round2),
                yoy_pct: current.and_then(|c| growth_pct(c, prior)).map(round2),
                mom_pct: None,
            });

            let next = day.add_days(1);
            if next == day {
                break;
            }
            day = next;
        }

        points
    }

    /// Calendar-month totals over the whole store, ascending by month.
    ///
    /// Growth is month-to-date comparable: a month whose latest observation is
    /// on day `k` is compared against days `1..=k` of the previous month (MoM)
    /// and of the same month a year earlier (YoY), never their full totals.
    pub fn monthly_rollup(&self, store: &ObservationStore) -> Vec<MonthlyRecord> {
        let mut months: BTreeMap<(i32, u32), (f64, u32)> = BTreeMap::new();
        for obs in store {
            let entry = months
                .entry((obs.date.year(), obs.date.month()))
                .or_insert((0.0, 0));
            entry.0 += obs.value;
            entry.1 = entry.1.max(obs.date.day());
        }

        months
            .into_iter()
            .map(|((year, month), (total, max_day))| {
                let (prev_year, prev_month) = if month == 1 {
                    (year - 1, 12)
                } else {
                    (year, month - 1)
                };
                let prev_month_mtd = month_to_date_sum(store, prev_year, prev_month, max_day);
                let last_year_mtd = month_to_date_sum(store, year - 1, month, max_day);

                MonthlyRecord {
                    month: format!("{year:04}-{month:02}"),
                    total_gwh: round2(total),
                    max_day,
                    yoy_pct: growth_pct(total, last_year_mtd).map(round2),
                    mom_pct: growth_pct(total, prev_month_mtd).map(round2),
                }
            })
            .collect()
    }

    /// Keep the records whose month overlaps `[from, to]` (bounds swapped if reversed).
    pub fn monthly_in_range(
        &self,
        records: &[MonthlyRecord],
        from: DateKey,
        to: DateKey,
    ) -> Vec<MonthlyRecord> {
        let (from, to) = if from > to { (to, from) } else { (from, to) };
        let (first, last) = (from.month_key(), to.month_key());
        records
            .iter()
            .filter(|r| r.month >= first && r.month <= last)
            .cloned()
            .collect()
    }
}

impl Default for AggregationService {
    fn default() -> Self {
        Self::new()
    }
}

/// Sum over the inclusive window `[end - 29, end]`; `None` if no day in it is observed.
fn trailing_sum(store: &ObservationStore, end: DateKey) -> Option<f64> {
    let start = end.sub_days(ROLLING_WINDOW_DAYS - 1);
    let (sum, count) = store.range_sum(start, end);
    (count > 0).then_some(sum)
}

/// Sum of days `1..=max_day` of the given month; `None` if none of those days is observed.
///
/// `max_day` is capped at the month's length (e.g. 31 against February).
fn month_to_date_sum(store: &ObservationStore, year: i32, month: u32, max_day: u32) -> Option<f64> {
    let first = DateKey::from_ymd(year, month, 1).ok()?;
    let last = (1..=max_day)
        .rev()
        .find_map(|day| DateKey::from_ymd(year, month, day).ok())?;
    let (sum, count) = store.range_sum(first, last);
    (count > 0).then_some(sum)
}

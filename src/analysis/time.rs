//! Day / ISO-week / month / year buckets over watch dates.

use super::buckets::{BucketEntry, BucketMap};
use crate::item::Item;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// Parse a stored `updated_at`. Anything after the date part is ignored.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            value
                .get(..10)
                .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        })
}

/// ISO-8601 week label, e.g. `2021-W01`. The year is the week-based year.
pub fn week_key(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

#[derive(Debug, Clone, Default)]
pub struct TimeAggregation {
    pub daily: BucketMap,
    pub weekly: BucketMap,
    pub monthly: BucketMap,
    pub yearly: BucketMap,
    pub earliest: Option<NaiveDate>,
    pub latest: Option<NaiveDate>,
    pub dated_count: usize,
}

impl TimeAggregation {
    /// Dated items per month that has any.
    pub fn monthly_pace(&self) -> Option<f64> {
        (self.dated_count > 0 && !self.monthly.is_empty())
            .then(|| self.dated_count as f64 / self.monthly.len() as f64)
    }
}

pub fn build_time_aggregations(items: &[&Item]) -> TimeAggregation {
    let mut agg = TimeAggregation::default();
    for item in items {
        let Some(date) = parse_date(&item.updated_at) else {
            continue;
        };
        agg.dated_count += 1;
        agg.earliest = Some(agg.earliest.map_or(date, |e| e.min(date)));
        agg.latest = Some(agg.latest.map_or(date, |l| l.max(date)));

        agg.daily.add(&date.format("%Y-%m-%d").to_string(), item.rating);
        agg.weekly.add(&week_key(date), item.rating);
        agg.monthly.add(&month_key(date), item.rating);
        agg.yearly.add(&date.year().to_string(), item.rating);
    }
    agg
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Rising,
    Falling,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSummary {
    pub peak_month: Option<BucketEntry>,
    pub low_month: Option<BucketEntry>,
    /// Last month's count against the first month's; needs two months.
    pub trend: Option<Trend>,
    pub monthly_pace: Option<f64>,
    pub earliest: Option<NaiveDate>,
    pub latest: Option<NaiveDate>,
}

pub fn summarize(agg: &TimeAggregation) -> TimeSummary {
    let months = agg.monthly.by_key();

    let mut peak: Option<&BucketEntry> = None;
    let mut low: Option<&BucketEntry> = None;
    for month in &months {
        if peak.is_none_or(|p| month.count > p.count) {
            peak = Some(month);
        }
        if low.is_none_or(|l| month.count < l.count) {
            low = Some(month);
        }
    }

    let trend = match (months.first(), months.last()) {
        (Some(first), Some(last)) if months.len() > 1 => Some(match last.count.cmp(&first.count) {
            std::cmp::Ordering::Greater => Trend::Rising,
            std::cmp::Ordering::Less => Trend::Falling,
            std::cmp::Ordering::Equal => Trend::Stable,
        }),
        _ => None,
    };

    TimeSummary {
        peak_month: peak.cloned(),
        low_month: low.cloned(),
        trend,
        monthly_pace: agg.monthly_pace(),
        earliest: agg.earliest,
        latest: agg.latest,
    }
}

//! Rating distribution, runtime bins, decades and the genre/region/decade
//! correlation table.

use super::buckets::{Bucket, BucketEntry, BucketMap, share};
use super::fields::{genres, regions};
use crate::item::Item;
use serde::Serialize;

const CORRELATION_MIN_COUNT: usize = 2;
const CORRELATION_ROWS: usize = 8;

pub const UNKNOWN_GENRE: &str = "未知类型";
pub const UNKNOWN_REGION: &str = "未知地区";
pub const UNKNOWN_DECADE: &str = "未知年代";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub label: String,
    pub stars: u8,
    pub count: usize,
    /// Percent of rated items, one decimal.
    pub share: f64,
}

pub fn rating_histogram(ratings: &[u8]) -> Vec<HistogramBin> {
    (1..=5u8)
        .map(|stars| {
            let count = ratings.iter().filter(|&&r| r == stars).count();
            HistogramBin {
                label: format!("{stars}星"),
                stars,
                count,
                share: share(count, ratings.len()),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quantiles {
    pub min: f64,
    pub median: f64,
    pub max: f64,
}

/// Linear interpolation between the two closest ranks.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = (sorted.len() - 1) as f64 * q;
    let base = pos.floor() as usize;
    let rest = pos - base as f64;
    Some(match sorted.get(base + 1) {
        Some(next) => sorted[base] + rest * (next - sorted[base]),
        None => sorted[base],
    })
}

pub fn quantiles(ratings: &[u8]) -> Option<Quantiles> {
    let mut sorted: Vec<f64> = ratings.iter().map(|&r| f64::from(r)).collect();
    sorted.sort_by(f64::total_cmp);
    Some(Quantiles {
        min: *sorted.first()?,
        median: quantile(&sorted, 0.5)?,
        max: *sorted.last()?,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationBin {
    pub label: &'static str,
    pub count: usize,
    /// Percent of all items in the range, one decimal.
    pub share: f64,
    pub avg_rating: Option<f64>,
}

/// Lower bounds are inclusive, upper bounds exclusive.
const DURATION_BINS: [(&str, u32, u32); 4] = [
    ("<90分钟", 0, 90),
    ("90-120分钟", 90, 120),
    ("120-150分钟", 120, 150),
    (">150分钟", 150, u32::MAX),
];

pub fn duration_bins(items: &[&Item]) -> Vec<DurationBin> {
    let mut buckets = [Bucket::default(); 4];
    for item in items {
        let Some(minutes) = item.detail.duration_minutes else {
            continue;
        };
        if let Some(idx) = DURATION_BINS
            .iter()
            .position(|&(_, lo, hi)| minutes >= lo && minutes < hi)
        {
            buckets[idx].add(item.rating);
        }
    }
    DURATION_BINS
        .iter()
        .zip(buckets)
        .map(|(&(label, _, _), bucket)| DurationBin {
            label,
            count: bucket.count,
            share: share(bucket.count, items.len()),
            avg_rating: bucket.avg_rating(),
        })
        .collect()
}

pub fn decade_label(year: Option<i32>) -> String {
    match year {
        Some(year) => format!("{}s", year.div_euclid(10) * 10),
        None => UNKNOWN_DECADE.to_string(),
    }
}

/// Per-decade counts, oldest first. Items without a release year are left out.
pub fn decade_summary(items: &[&Item]) -> Vec<BucketEntry> {
    let mut map = BucketMap::new();
    for item in items {
        if let Some(year) = item.detail.release_year {
            map.add(&decade_label(Some(year)), item.rating);
        }
    }
    map.by_key()
}

/// Best-rated (primary genre, primary region, decade) combinations seen at
/// least twice.
pub fn correlations(items: &[&Item]) -> Vec<BucketEntry> {
    let mut map = BucketMap::new();
    for item in items {
        let genre = genres(item).into_iter().next().unwrap_or_else(|| UNKNOWN_GENRE.to_string());
        let region = regions(item).into_iter().next().unwrap_or_else(|| UNKNOWN_REGION.to_string());
        let decade = decade_label(item.detail.release_year);
        map.add(&format!("{genre} × {region} × {decade}"), item.rating);
    }
    let mut rows: Vec<BucketEntry> = map
        .entries()
        .into_iter()
        .filter(|row| row.count >= CORRELATION_MIN_COUNT)
        .collect();
    rows.sort_by(|a, b| {
        b.avg_rating
            .unwrap_or(0.0)
            .total_cmp(&a.avg_rating.unwrap_or(0.0))
    });
    rows.truncate(CORRELATION_ROWS);
    rows
}

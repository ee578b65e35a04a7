//! Dashboard statistics over the movie history.
//!
//! [`analyze`] is a pure function of the items and a date range: every call
//! rebuilds its buckets from scratch, so identical input always yields an
//! identical [`Dashboard`].

pub mod buckets;
pub mod comments;
pub mod fields;
pub mod persona;
pub mod ratings;
pub mod time;

use crate::error::{DashboardError, FetchError};
use crate::fetch::USER_AGENT;
use crate::history::parse_items;
use crate::item::Item;
use buckets::{BucketEntry, mean, share};
use chrono::NaiveDate;
use comments::CommentAnalysis;
use fields::CreatorTables;
use persona::{Persona, PersonaInputs};
use ratings::{DurationBin, HistogramBin, Quantiles};
use reqwest::header;
use serde::Serialize;
use time::TimeSummary;

const TOP_LIST_LEN: usize = 5;
const GENRE_PREFERENCE_LEN: usize = 8;
const GENRE_COMBO_LEN: usize = 10;
const SHARE_LIST_LEN: usize = 10;
const RECENT_MONTHS: usize = 12;
/// Ranges shorter than this hide the year-over-year list.
const YEARLY_MIN_SPAN_DAYS: i64 = 2 * 365;

/// Inclusive date bounds; a missing bound is open on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_bounded(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    /// Items whose date cannot be parsed, empty ones included, always pass.
    pub fn contains(&self, item: &Item) -> bool {
        let Some(date) = time::parse_date(&item.updated_at) else {
            return true;
        };
        self.start.is_none_or(|start| date >= start) && self.end.is_none_or(|end| date <= end)
    }

    /// Both bounds set and less than two years apart.
    pub fn hides_yearly(&self) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => (end - start).num_days() < YEARLY_MIN_SPAN_DAYS,
            _ => false,
        }
    }
}

pub fn filter_items<'a>(items: &'a [Item], range: &DateRange) -> Vec<&'a Item> {
    items.iter().filter(|item| range.contains(item)).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryCards {
    pub total: usize,
    pub avg_rating: Option<f64>,
    pub avg_duration: Option<f64>,
    pub total_watch_hours: Option<f64>,
    /// Raw comment length, surrounding whitespace included.
    pub total_comment_chars: usize,
}

fn summary_cards(items: &[&Item]) -> SummaryCards {
    let durations: Vec<f64> = items
        .iter()
        .filter_map(|i| i.detail.duration_minutes)
        .map(f64::from)
        .collect();
    let total_minutes: f64 = durations.iter().sum();
    SummaryCards {
        total: items.len(),
        avg_rating: mean(items.iter().filter_map(|i| i.rating).map(f64::from)),
        avg_duration: mean(durations.iter().copied()),
        total_watch_hours: (!durations.is_empty())
            .then(|| (total_minutes / 60.0 * 10.0).round() / 10.0),
        total_comment_chars: items
            .iter()
            .flat_map(|i| &i.comments)
            .map(|c| c.chars().count())
            .sum(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopLists {
    pub genres: Vec<Tally>,
    pub languages: Vec<Tally>,
    /// Keyed `"N 星"`.
    pub ratings: Vec<Tally>,
}

fn tallies(entries: &[BucketEntry]) -> Vec<Tally> {
    entries
        .iter()
        .take(TOP_LIST_LEN)
        .map(|e| Tally {
            label: e.key.clone(),
            count: e.count,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareEntry {
    pub key: String,
    pub count: usize,
    /// Percent of all occurrences of the field, one decimal.
    pub share: f64,
    pub avg_rating: Option<f64>,
}

fn share_list(entries: &[BucketEntry]) -> Vec<ShareEntry> {
    let total: usize = entries.iter().map(|e| e.count).sum();
    entries
        .iter()
        .take(SHARE_LIST_LEN)
        .map(|e| ShareEntry {
            key: e.key.clone(),
            count: e.count,
            share: share(e.count, total),
            avg_rating: e.avg_rating,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSection {
    pub summary: TimeSummary,
    pub daily: Vec<BucketEntry>,
    /// ISO weeks, `2021-W01`.
    pub weekly: Vec<BucketEntry>,
    /// Last twelve months with data, oldest first.
    pub recent_months: Vec<BucketEntry>,
    pub yearly: Vec<BucketEntry>,
    pub hide_yearly: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingSection {
    pub histogram: Vec<HistogramBin>,
    pub quantiles: Option<Quantiles>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub range: DateRange,
    pub summary: SummaryCards,
    pub top_lists: TopLists,
    pub time: TimeSection,
    pub ratings: RatingSection,
    pub genre_preference: Vec<BucketEntry>,
    pub genre_combos: Vec<BucketEntry>,
    pub creators: CreatorTables,
    pub regions: Vec<ShareEntry>,
    pub languages: Vec<ShareEntry>,
    pub durations: Vec<DurationBin>,
    pub decades: Vec<BucketEntry>,
    pub comments: CommentAnalysis,
    pub correlations: Vec<BucketEntry>,
    pub persona: Persona,
}

/// Every dashboard section for the items inside `range`.
pub fn analyze(items: &[Item], range: &DateRange) -> Dashboard {
    let items = filter_items(items, range);
    let items = items.as_slice();

    let time_agg = time::build_time_aggregations(items);
    let months = time_agg.monthly.by_key();
    let recent_months = months[months.len().saturating_sub(RECENT_MONTHS)..].to_vec();

    let ratings: Vec<u8> = items.iter().filter_map(|i| i.rating).collect();

    let genres = fields::field_stats(items, fields::genres);
    let regions = fields::field_stats(items, fields::regions);
    let languages = fields::field_stats(items, fields::languages);
    let directors = fields::field_stats(items, fields::directors);
    let rating_counts = fields::field_stats(items, |i| {
        i.rating.map(|r| vec![format!("{r} 星")]).unwrap_or_default()
    });

    let persona = persona::build_persona(PersonaInputs {
        monthly_pace: time_agg.monthly_pace(),
        genres: &genres,
        regions: &regions,
        languages: &languages,
        directors: &directors,
    });

    Dashboard {
        range: *range,
        summary: summary_cards(items),
        top_lists: TopLists {
            genres: tallies(&genres),
            languages: tallies(&languages),
            ratings: tallies(&rating_counts),
        },
        time: TimeSection {
            summary: time::summarize(&time_agg),
            daily: time_agg.daily.by_key(),
            weekly: time_agg.weekly.by_key(),
            recent_months,
            yearly: time_agg.yearly.by_key(),
            hide_yearly: range.hides_yearly(),
        },
        ratings: RatingSection {
            histogram: ratings::rating_histogram(&ratings),
            quantiles: ratings::quantiles(&ratings),
        },
        genre_preference: genres.iter().take(GENRE_PREFERENCE_LEN).cloned().collect(),
        genre_combos: fields::genre_combos(items)
            .into_iter()
            .take(GENRE_COMBO_LEN)
            .collect(),
        creators: fields::creator_tables(items),
        regions: share_list(&regions),
        languages: share_list(&languages),
        durations: ratings::duration_bins(items),
        decades: ratings::decade_summary(items),
        comments: comments::analyze_comments(items),
        correlations: ratings::correlations(items),
        persona,
    }
}

/// Load the movies document from a path or an `http(s)://` URL.
///
/// Unlike the history store this is strict: the dashboard has nothing to
/// show without its data.
pub async fn load_items(source: &str) -> Result<Vec<Item>, DashboardError> {
    let body = if source.starts_with("http://") || source.starts_with("https://") {
        let resp = reqwest::Client::new()
            .get(source)
            .header(header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(FetchError::from)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: source.to_string(),
            }
            .into());
        }
        resp.text().await.map_err(FetchError::from)?
    } else {
        tokio::fs::read_to_string(source).await?
    };
    Ok(parse_items(&body)?)
}

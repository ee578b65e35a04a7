//! Frequency and rating statistics over multi-valued fields.

#![allow(clippy::expect_used)]

use super::buckets::{BucketEntry, BucketMap};
use crate::item::{FieldValue, Item};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static FIELD_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[，,、/;|]+").expect("FIELD_SPLIT regex"));

/// Present on nearly every movie, so it says nothing about taste.
pub const EXCLUDED_GENRE: &str = "剧情";

/// Creators need this many items before they show up in a table.
pub const CREATOR_MIN_COUNT: usize = 5;
const CREATOR_TABLE_LEN: usize = 50;

/// Individual values of a stored field.
pub fn normalize_field(value: Option<&FieldValue>) -> Vec<String> {
    match value {
        None => Vec::new(),
        Some(FieldValue::Many(values)) => values
            .iter()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect(),
        Some(FieldValue::One(text)) => FIELD_SPLIT
            .split(text)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect(),
    }
}

pub fn normalize_genres(value: Option<&FieldValue>) -> Vec<String> {
    normalize_field(value)
        .into_iter()
        .filter(|g| g != EXCLUDED_GENRE)
        .collect()
}

pub fn genres(item: &Item) -> Vec<String> {
    normalize_genres(item.detail.genres.as_ref())
}

pub fn regions(item: &Item) -> Vec<String> {
    normalize_field(item.detail.regions.as_ref())
}

pub fn languages(item: &Item) -> Vec<String> {
    normalize_field(item.detail.languages.as_ref())
}

pub fn directors(item: &Item) -> Vec<String> {
    normalize_field(item.detail.directors.as_ref())
}

pub fn writers(item: &Item) -> Vec<String> {
    normalize_field(item.detail.writers.as_ref())
}

pub fn actors(item: &Item) -> Vec<String> {
    normalize_field(item.detail.actors.as_ref())
}

/// Occurrence count and average rating per value, most frequent first.
pub fn field_stats<F>(items: &[&Item], extract: F) -> Vec<BucketEntry>
where
    F: Fn(&Item) -> Vec<String>,
{
    let mut map = BucketMap::new();
    for item in items {
        for value in extract(item) {
            map.add(&value, item.rating);
        }
    }
    map.by_count()
}

/// Tally of each item's first two genres, unordered, joined by `" × "`.
pub fn genre_combos(items: &[&Item]) -> Vec<BucketEntry> {
    let mut map = BucketMap::new();
    for item in items {
        let mut pair: Vec<String> = genres(item).into_iter().take(2).collect();
        if pair.is_empty() {
            continue;
        }
        pair.sort();
        map.add(&pair.join(" × "), item.rating);
    }
    map.by_count()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatorTables {
    pub directors: Vec<BucketEntry>,
    pub writers: Vec<BucketEntry>,
    pub actors: Vec<BucketEntry>,
}

pub fn creator_tables(items: &[&Item]) -> CreatorTables {
    let table = |extract: fn(&Item) -> Vec<String>| -> Vec<BucketEntry> {
        field_stats(items, extract)
            .into_iter()
            .filter(|row| row.count >= CREATOR_MIN_COUNT)
            .take(CREATOR_TABLE_LEN)
            .collect()
    };
    CreatorTables {
        directors: table(directors),
        writers: table(writers),
        actors: table(actors),
    }
}

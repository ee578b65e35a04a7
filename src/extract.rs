//! Field extraction for listing nodes and movie detail pages. No I/O here.

#![allow(clippy::expect_used)]

use crate::category::CommentRule;
use crate::dom::{QueryNode, Sibling};
use crate::item::{FieldValue, MovieDetail};
use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("WHITESPACE regex"));
static TITLE_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*/\s*").expect("TITLE_SPLIT regex"));
static VALUE_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+/\s+").expect("VALUE_SPLIT regex"));
static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("ISO_DATE regex"));
static RATING_T: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"rating([1-5])-t").expect("RATING_T regex"));
static ALLSTAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"allstar([1-5])").expect("ALLSTAR regex"));
static MINUTES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*分钟?").expect("MINUTES regex"));
static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("DIGITS regex"));
static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4}").expect("YEAR regex"));
static LEADING_COLON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[：:\s]+").expect("LEADING_COLON regex"));

const MORE_MARKER: &str = "更多...";

/// Detail-page labels, as printed in the `#info` block.
pub mod labels {
    pub const DIRECTOR: &str = "导演";
    pub const WRITER: &str = "编剧";
    pub const CAST: &str = "主演";
    pub const GENRE: &str = "类型";
    pub const REGION: &str = "制片国家/地区";
    pub const LANGUAGE: &str = "语言";
    pub const RELEASE_DATE: &str = "上映日期";
    pub const RUNTIME: &str = "片长";
}

pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Title, full multi-title string and link of one listing node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TitleParts {
    pub title: String,
    pub title_arr: String,
    pub link: String,
}

pub fn extract_title<N: QueryNode>(node: &N) -> TitleParts {
    let Some(anchor) = node
        .select_first("h2 a[title]")
        .or_else(|| node.select_first(".title a"))
    else {
        return TitleParts::default();
    };

    let raw = anchor
        .attr_value("title")
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| anchor.inner_text());
    let title_arr = collapse_whitespace(&raw);
    let title = TITLE_SPLIT
        .split(&title_arr)
        .next()
        .unwrap_or_default()
        .to_string();

    TitleParts {
        title,
        title_arr,
        link: anchor.attr_value("href").unwrap_or_default(),
    }
}

pub fn extract_cover<N: QueryNode>(node: &N) -> String {
    node.select_first("img")
        .and_then(|img| img.attr_value("src"))
        .unwrap_or_default()
}

/// Publication / track line, `.intro` first then `.pub`.
pub fn extract_desc<N: QueryNode>(node: &N) -> String {
    [".intro", ".pub"]
        .iter()
        .filter_map(|css| node.select_first(css))
        .map(|el| el.inner_text().trim().to_string())
        .find(|text| !text.is_empty())
        .unwrap_or_default()
}

/// Star level from the node's class tokens (`ratingN-t`, else `allstarN`).
pub fn extract_rating<N: QueryNode>(node: &N) -> Option<u8> {
    let classes = node.class_tokens().join(" ");
    RATING_T
        .captures(&classes)
        .or_else(|| ALLSTAR.captures(&classes))
        .and_then(|caps| caps[1].parse().ok())
}

/// First `YYYY-MM-DD` in `text`, or `""`.
pub fn extract_date(text: &str) -> String {
    ISO_DATE
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

pub fn extract_updated_at<N: QueryNode>(node: &N) -> String {
    node.select_first(".date")
        .map(|el| extract_date(el.inner_text().trim()))
        .unwrap_or_default()
}

pub fn extract_comment<N: QueryNode>(node: &N, rule: CommentRule) -> Option<String> {
    let text = match rule {
        CommentRule::Element(css) => node.select_first(css)?.inner_text(),
        CommentRule::Nth {
            selector,
            index,
            discard_prefix,
        } => {
            let text = node.select_all(selector).get(index)?.inner_text();
            if discard_prefix.is_some_and(|prefix| text.trim().starts_with(prefix)) {
                return None;
            }
            text
        }
    };
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

pub fn clean_info_text(text: &str) -> String {
    let text = text.replace('\u{a0}', " ").replace(MORE_MARKER, "");
    let text = LEADING_COLON.replace(&text, "");
    collapse_whitespace(&text)
}

/// Raw text following `label` inside the detail page's info block.
pub fn info_field<N: QueryNode>(info: &N, label: &str) -> String {
    let Some(marker) = info
        .select_all("span.pl")
        .into_iter()
        .find(|span| span.inner_text().trim().starts_with(label))
    else {
        return String::new();
    };

    let attrs = marker
        .parent_element()
        .filter(|parent| parent.tag_name() == "span")
        .and_then(|parent| parent.child_elements().into_iter().find(|c| c.has_class("attrs")));
    if let Some(attrs) = attrs {
        return clean_info_text(&attrs.inner_text());
    }

    let mut segments = String::new();
    for sibling in marker.following_siblings() {
        match sibling {
            Sibling::Element(el) if el.tag_name() == "br" => break,
            Sibling::Element(el) => segments.push_str(&el.inner_text()),
            Sibling::Text(text) => segments.push_str(&text),
        }
    }
    clean_info_text(&segments)
}

/// Split a `" / "`-separated value line into trimmed, non-empty parts.
pub fn split_values(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    VALUE_SPLIT
        .split(text)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// The first `<digits>分钟` value, else the first digit run of any value.
pub fn extract_duration_minutes(values: &[String]) -> Option<u32> {
    values
        .iter()
        .find_map(|v| MINUTES.captures(v).and_then(|c| c[1].parse().ok()))
        .or_else(|| {
            values
                .iter()
                .find_map(|v| DIGITS.find(v).and_then(|m| m.as_str().parse().ok()))
        })
}

/// Earliest year among the release dates.
pub fn extract_release_year(values: &[String]) -> Option<i32> {
    values
        .iter()
        .filter_map(|v| YEAR.find(v).and_then(|m| m.as_str().parse().ok()))
        .min()
}

/// Structured metadata from a movie detail page's `#info` block.
pub fn extract_movie_detail<N: QueryNode>(root: &N) -> MovieDetail {
    let Some(info) = root.select_first("#info") else {
        return MovieDetail::default();
    };
    let grab = |label: &str| split_values(&info_field(&info, label));
    let field = |label: &str| Some(FieldValue::from_values(grab(label)));

    MovieDetail {
        directors: field(labels::DIRECTOR),
        writers: field(labels::WRITER),
        actors: field(labels::CAST),
        genres: field(labels::GENRE),
        regions: field(labels::REGION),
        languages: field(labels::LANGUAGE),
        duration_minutes: extract_duration_minutes(&grab(labels::RUNTIME)),
        release_year: extract_release_year(&grab(labels::RELEASE_DATE)),
    }
}

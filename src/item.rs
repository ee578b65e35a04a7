//! The persisted item record and its lenient serde helpers.
//!
//! Category documents are hand-edited now and then and older runs stored
//! `''` for missing numbers, so every field here deserializes leniently:
//! numbers may arrive as numbers or numeric strings, empty strings mean
//! "absent", and anything we don't know about is carried through `extra`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// A multi-valued detail attribute (directors, genres, ...).
///
/// A single value is stored as a bare string, anything else as an array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    One(String),
    Many(Vec<String>),
}

impl FieldValue {
    /// Collapse a list of values: exactly one value becomes a bare string,
    /// an empty list becomes `""`, longer lists stay lists.
    pub fn from_values(mut values: Vec<String>) -> Self {
        match values.len() {
            0 => FieldValue::One(String::new()),
            1 => FieldValue::One(values.remove(0)),
            _ => FieldValue::Many(values),
        }
    }
}

/// Detail-page metadata for one movie. Every field is optional so a failed
/// fetch overlays nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovieDetail {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "field_value")]
    pub directors: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "field_value")]
    pub writers: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "field_value")]
    pub actors: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "field_value")]
    pub genres: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "field_value")]
    pub regions: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "field_value")]
    pub languages: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "number")]
    pub duration_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "number")]
    pub release_year: Option<i32>,
}

impl MovieDetail {
    pub fn is_empty(&self) -> bool {
        *self == MovieDetail::default()
    }
}

/// One collected work, as stored in a category document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(default, deserialize_with = "string")]
    pub title: String,
    #[serde(default, deserialize_with = "string")]
    pub title_arr: String,
    #[serde(default, deserialize_with = "string")]
    pub link: String,
    #[serde(default, deserialize_with = "string")]
    pub cover: String,
    #[serde(default, deserialize_with = "number", serialize_with = "rating_or_blank")]
    pub rating: Option<u8>,
    #[serde(default, deserialize_with = "string")]
    pub updated_at: String,
    #[serde(default, deserialize_with = "comments")]
    pub comments: Vec<String>,
    #[serde(default, deserialize_with = "optional_string", skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(flatten)]
    pub detail: MovieDetail,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Item {
    /// Shallow overlay: fields present in `detail` replace ours, absent ones
    /// leave ours untouched.
    pub fn apply_detail(&mut self, detail: MovieDetail) {
        let MovieDetail {
            directors,
            writers,
            actors,
            genres,
            regions,
            languages,
            duration_minutes,
            release_year,
        } = detail;
        let d = &mut self.detail;
        if directors.is_some() {
            d.directors = directors;
        }
        if writers.is_some() {
            d.writers = writers;
        }
        if actors.is_some() {
            d.actors = actors;
        }
        if genres.is_some() {
            d.genres = genres;
        }
        if regions.is_some() {
            d.regions = regions;
        }
        if languages.is_some() {
            d.languages = languages;
        }
        if duration_minutes.is_some() {
            d.duration_minutes = duration_minutes;
        }
        if release_year.is_some() {
            d.release_year = release_year;
        }
    }
}

fn rating_or_blank<S: Serializer>(rating: &Option<u8>, s: S) -> Result<S::Ok, S::Error> {
    match rating {
        Some(r) => s.serialize_u8(*r),
        None => s.serialize_str(""),
    }
}

fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

fn optional_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Array(values) => Some(
            values
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect::<Vec<_>>()
                .join(" / "),
        ),
        other => Some(other.to_string()),
    })
}

fn number<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    let n = match Value::deserialize(d)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    Ok(n.and_then(|n| T::try_from(n).ok()))
}

fn comments<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) if !s.is_empty() => vec![s],
        Value::Array(values) => values
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        _ => Vec::new(),
    })
}

fn field_value<'de, D: Deserializer<'de>>(d: D) -> Result<Option<FieldValue>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Some(FieldValue::One(s)),
        Value::Array(values) => Some(FieldValue::Many(
            values
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect(),
        )),
        Value::Null => None,
        other => Some(FieldValue::One(other.to_string())),
    })
}

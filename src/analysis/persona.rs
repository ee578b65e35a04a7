use super::buckets::BucketEntry;
use serde::Serialize;

/// One-glance summary of viewing habits.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Persona {
    pub monthly_pace: Option<f64>,
    pub top_genre: Option<String>,
    pub top_region: Option<String>,
    pub top_language: Option<String>,
    pub top_director: Option<String>,
    /// Highest average rating among genres that have one.
    pub best_rated_genre: Option<String>,
}

/// Inputs are the count-sorted field tables built for the dashboard.
pub struct PersonaInputs<'a> {
    pub monthly_pace: Option<f64>,
    pub genres: &'a [BucketEntry],
    pub regions: &'a [BucketEntry],
    pub languages: &'a [BucketEntry],
    pub directors: &'a [BucketEntry],
}

fn top(entries: &[BucketEntry]) -> Option<String> {
    entries.first().map(|e| e.key.clone())
}

pub fn build_persona(inputs: PersonaInputs<'_>) -> Persona {
    let mut best: Option<(&str, f64)> = None;
    for entry in inputs.genres {
        let Some(avg) = entry.avg_rating else {
            continue;
        };
        if best.is_none_or(|(_, b)| avg > b) {
            best = Some((&entry.key, avg));
        }
    }

    Persona {
        monthly_pace: inputs.monthly_pace,
        top_genre: top(inputs.genres),
        top_region: top(inputs.regions),
        top_language: top(inputs.languages),
        top_director: top(inputs.directors),
        best_rated_genre: best.map(|(key, _)| key.to_string()),
    }
}

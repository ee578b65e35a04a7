//! Turns preset / date / year-month selections into a [`DateRange`] and
//! re-runs the dashboard whenever the range changes.

use crate::analysis::DateRange;
use crate::analysis::time::parse_date;
use crate::item::Item;
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

const FALLBACK_YEARS: i32 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    #[default]
    ThisYear,
    ThisMonth,
    #[serde(rename = "last-3-months")]
    #[value(name = "last-3-months")]
    Last3Months,
    LastYear,
    All,
    Custom,
}

impl Preset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::ThisYear => "this-year",
            Preset::ThisMonth => "this-month",
            Preset::Last3Months => "last-3-months",
            Preset::LastYear => "last-year",
            Preset::All => "all",
            Preset::Custom => "custom",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "this-year" => Ok(Preset::ThisYear),
            "this-month" => Ok(Preset::ThisMonth),
            "last-3-months" => Ok(Preset::Last3Months),
            "last-year" => Ok(Preset::LastYear),
            "all" => Ok(Preset::All),
            "custom" => Ok(Preset::Custom),
            other => Err(format!("unknown preset: {other}")),
        }
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Concrete bounds for a preset relative to `today`. `Custom` has none: the
/// bounds were set directly.
pub fn preset_range(preset: Preset, today: NaiveDate) -> Option<DateRange> {
    let month_start = first_of_month(today);
    let range = match preset {
        Preset::ThisYear => DateRange::new(NaiveDate::from_ymd_opt(today.year(), 1, 1), Some(today)),
        Preset::ThisMonth => DateRange::new(Some(month_start), Some(today)),
        Preset::Last3Months => DateRange::new(
            month_start.checked_sub_months(Months::new(2)),
            Some(today),
        ),
        Preset::LastYear => {
            let year = today.year() - 1;
            DateRange::new(
                NaiveDate::from_ymd_opt(year, 1, 1),
                NaiveDate::from_ymd_opt(year, 12, 31),
            )
        }
        Preset::All => DateRange::all(),
        Preset::Custom => return None,
    };
    Some(range)
}

/// Year and month give that month; a year alone gives the calendar year.
/// A month without a year clears both bounds.
pub fn year_month_range(year: Option<i32>, month: Option<u32>) -> DateRange {
    match (year, month) {
        (Some(year), Some(month)) => {
            let start = NaiveDate::from_ymd_opt(year, month, 1);
            let end = start
                .and_then(|s| s.checked_add_months(Months::new(1)))
                .and_then(|next| next.pred_opt());
            DateRange::new(start, end)
        }
        (Some(year), None) => DateRange::new(
            NaiveDate::from_ymd_opt(year, 1, 1),
            NaiveDate::from_ymd_opt(year, 12, 31),
        ),
        _ => DateRange::all(),
    }
}

type OnChange = Box<dyn FnMut(&DateRange) + Send>;

/// Holds the current selection and calls back on every bound change.
pub struct FilterController {
    range: DateRange,
    preset: Preset,
    on_change: OnChange,
}

impl fmt::Debug for FilterController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterController")
            .field("range", &self.range)
            .field("preset", &self.preset)
            .finish_non_exhaustive()
    }
}

impl FilterController {
    pub fn new(on_change: impl FnMut(&DateRange) + Send + 'static) -> Self {
        Self {
            range: DateRange::all(),
            preset: Preset::All,
            on_change: Box::new(on_change),
        }
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn preset(&self) -> Preset {
        self.preset
    }

    fn refresh(&mut self) {
        (self.on_change)(&self.range);
    }

    /// `refresh = false` is for the initial selection made before any data
    /// is loaded.
    pub fn apply_preset(&mut self, preset: Preset, today: NaiveDate, refresh: bool) {
        self.preset = preset;
        if let Some(range) = preset_range(preset, today) {
            self.range = range;
        }
        if refresh {
            self.refresh();
        }
    }

    pub fn set_start(&mut self, start: Option<NaiveDate>) {
        self.range.start = start;
        self.preset = Preset::Custom;
        self.refresh();
    }

    pub fn set_end(&mut self, end: Option<NaiveDate>) {
        self.range.end = end;
        self.preset = Preset::Custom;
        self.refresh();
    }

    /// Nothing happens when both are `None`.
    pub fn select_year_month(&mut self, year: Option<i32>, month: Option<u32>) {
        if year.is_none() && month.is_none() {
            return;
        }
        self.range = year_month_range(year, month);
        self.preset = Preset::Custom;
        self.refresh();
    }
}

/// One filter request from the command line or the dashboard endpoint.
///
/// Applied in order: preset, then year/month, then explicit bounds, the
/// same order a user would click through them.
#[derive(Debug, Clone, Default, Deserialize, clap::Args)]
pub struct FilterQuery {
    /// this-year, this-month, last-3-months, last-year, all, custom
    #[arg(long, value_enum)]
    pub preset: Option<Preset>,
    /// Inclusive start, YYYY-MM-DD
    #[arg(long, value_parser = parse_day)]
    #[serde(default, deserialize_with = "optional_day")]
    pub start: Option<NaiveDate>,
    /// Inclusive end, YYYY-MM-DD
    #[arg(long, value_parser = parse_day)]
    #[serde(default, deserialize_with = "optional_day")]
    pub end: Option<NaiveDate>,
    #[arg(long)]
    pub year: Option<i32>,
    #[arg(long)]
    pub month: Option<u32>,
}

impl FilterQuery {
    pub fn resolve(&self, today: NaiveDate) -> DateRange {
        let mut filter = FilterController::new(|_| {});
        filter.apply_preset(self.preset.unwrap_or_default(), today, false);
        filter.select_year_month(self.year, self.month);
        if let Some(start) = self.start {
            filter.set_start(Some(start));
        }
        if let Some(end) = self.end {
            filter.set_end(Some(end));
        }
        filter.range()
    }
}

fn parse_day(text: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD, got {text:?}: {e}"))
}

/// A blank value is no bound, as a cleared date picker sends it.
fn optional_day<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
    match Option::<String>::deserialize(d)? {
        Some(text) if !text.trim().is_empty() => {
            parse_day(&text).map(Some).map_err(serde::de::Error::custom)
        }
        _ => Ok(None),
    }
}

/// Years offered by the year picker, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearOptions {
    pub years: Vec<i32>,
    /// The current year when offered, else the newest.
    pub selected: Option<i32>,
}

/// Watch years, falling back to the release year for undated items. With no
/// years at all, the ten most recent calendar years.
pub fn year_options(items: &[Item], current_year: i32) -> YearOptions {
    let mut years: BTreeSet<i32> = items
        .iter()
        .filter_map(|item| match parse_date(&item.updated_at) {
            Some(date) => Some(date.year()),
            None => item.detail.release_year,
        })
        .collect();
    if years.is_empty() {
        years.extend(current_year - (FALLBACK_YEARS - 1)..=current_year);
    }
    let years: Vec<i32> = years.into_iter().rev().collect();
    let selected = if years.contains(&current_year) {
        Some(current_year)
    } else {
        years.first().copied()
    };
    YearOptions { years, selected }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn recording() -> (FilterController, Arc<Mutex<Vec<DateRange>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let filter = FilterController::new(move |range| sink.lock().unwrap().push(*range));
        (filter, seen)
    }

    #[test]
    fn presets_resolve_against_today() {
        let today = d("2024-05-17");
        let this_year = preset_range(Preset::ThisYear, today).unwrap();
        assert_eq!(this_year, DateRange::new(Some(d("2024-01-01")), Some(today)));

        let this_month = preset_range(Preset::ThisMonth, today).unwrap();
        assert_eq!(this_month.start, Some(d("2024-05-01")));

        let last3 = preset_range(Preset::Last3Months, today).unwrap();
        assert_eq!(last3.start, Some(d("2024-03-01")));
        assert_eq!(last3.end, Some(today));

        let last_year = preset_range(Preset::LastYear, today).unwrap();
        assert_eq!(
            last_year,
            DateRange::new(Some(d("2023-01-01")), Some(d("2023-12-31")))
        );

        assert_eq!(preset_range(Preset::All, today), Some(DateRange::all()));
        assert_eq!(preset_range(Preset::Custom, today), None);
    }

    #[test]
    fn last_three_months_crosses_the_year() {
        let range = preset_range(Preset::Last3Months, d("2024-01-31")).unwrap();
        assert_eq!(range.start, Some(d("2023-11-01")));
    }

    #[test]
    fn year_month_ranges() {
        assert_eq!(
            year_month_range(Some(2024), Some(2)),
            DateRange::new(Some(d("2024-02-01")), Some(d("2024-02-29")))
        );
        assert_eq!(
            year_month_range(Some(2023), Some(12)),
            DateRange::new(Some(d("2023-12-01")), Some(d("2023-12-31")))
        );
        assert_eq!(
            year_month_range(Some(2022), None),
            DateRange::new(Some(d("2022-01-01")), Some(d("2022-12-31")))
        );
        assert_eq!(year_month_range(None, Some(3)), DateRange::all());
    }

    #[test]
    fn custom_preset_keeps_bounds() {
        let (mut filter, seen) = recording();
        filter.set_start(Some(d("2020-01-01")));
        filter.apply_preset(Preset::Custom, d("2024-05-17"), true);
        assert_eq!(filter.range().start, Some(d("2020-01-01")));
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn direct_edits_force_custom_and_refresh() {
        let (mut filter, seen) = recording();
        filter.apply_preset(Preset::ThisYear, d("2024-05-17"), false);
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(filter.preset(), Preset::ThisYear);

        filter.set_end(Some(d("2024-03-31")));
        assert_eq!(filter.preset(), Preset::Custom);
        assert_eq!(
            filter.range(),
            DateRange::new(Some(d("2024-01-01")), Some(d("2024-03-31")))
        );

        filter.apply_preset(Preset::All, d("2024-05-17"), true);
        filter.select_year_month(Some(2021), Some(7));
        assert_eq!(filter.preset(), Preset::Custom);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[1], DateRange::all());
        assert_eq!(
            seen[2],
            DateRange::new(Some(d("2021-07-01")), Some(d("2021-07-31")))
        );
    }

    #[test]
    fn empty_year_month_selection_is_ignored() {
        let (mut filter, seen) = recording();
        filter.select_year_month(None, None);
        assert_eq!(filter.preset(), Preset::All);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn query_applies_explicit_bounds_last() {
        let query = FilterQuery {
            preset: Some(Preset::LastYear),
            end: Some(d("2023-06-30")),
            ..FilterQuery::default()
        };
        assert_eq!(
            query.resolve(d("2024-05-17")),
            DateRange::new(Some(d("2023-01-01")), Some(d("2023-06-30")))
        );

        let query = FilterQuery {
            year: Some(2019),
            ..FilterQuery::default()
        };
        assert_eq!(query.resolve(d("2024-05-17")), year_month_range(Some(2019), None));
    }

    #[derive(clap::Parser)]
    struct AnalyzeArgs {
        #[command(flatten)]
        filter: FilterQuery,
    }

    #[test]
    fn malformed_bounds_are_rejected() {
        use clap::Parser;

        let args = AnalyzeArgs::try_parse_from(["analyze", "--start", "2023-02-01"]).unwrap();
        assert_eq!(args.filter.start, Some(d("2023-02-01")));
        assert!(AnalyzeArgs::try_parse_from(["analyze", "--start", "2023-13-40"]).is_err());
        assert!(AnalyzeArgs::try_parse_from(["analyze", "--end", "last week"]).is_err());

        let query: FilterQuery =
            serde_json::from_value(serde_json::json!({"start": "", "end": "2023-06-30"})).unwrap();
        assert_eq!(query.start, None);
        assert_eq!(query.end, Some(d("2023-06-30")));
        assert!(serde_json::from_value::<FilterQuery>(serde_json::json!({"end": "2023-02-30"})).is_err());
    }

    #[test]
    fn preset_names() {
        assert_eq!("last-3-months".parse::<Preset>(), Ok(Preset::Last3Months));
        assert_eq!(Preset::ThisMonth.to_string(), "this-month");
        assert!("yesterday".parse::<Preset>().is_err());
    }

    #[test]
    fn year_options_fall_back_sensibly() {
        let mut undated = Item::default();
        undated.detail.release_year = Some(1994);
        let items = vec![
            Item {
                updated_at: "2022-04-01".into(),
                ..Item::default()
            },
            Item {
                updated_at: "2024-01-01".into(),
                ..Item::default()
            },
            undated,
        ];
        let options = year_options(&items, 2024);
        assert_eq!(options.years, vec![2024, 2022, 1994]);
        assert_eq!(options.selected, Some(2024));

        let options = year_options(&items, 2025);
        assert_eq!(options.selected, Some(2024));

        let options = year_options(&[], 2024);
        assert_eq!(options.years.len(), 10);
        assert_eq!(options.years[0], 2024);
        assert_eq!(options.years[9], 2015);
    }
}

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Serialize;

/// One normalized row of viewing activity.
///
/// Calendar fields are derived from `timestamp` once, at normalization,
/// using its wall-clock value as parsed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewingRecord {
    pub source_row: usize,
    pub title: String,
    pub timestamp: NaiveDateTime,
    pub profile_name: Option<String>,
    pub year: i32,
    pub month: u32,
    pub weekday_name: &'static str,
    pub hour: u32,
    pub is_movie: bool,
    pub is_tv_show: bool,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl ViewingRecord {
    pub fn date(&self) -> chrono::NaiveDate {
        self.timestamp.date()
    }

    pub fn content_kind(&self) -> ContentKind {
        if self.is_movie {
            ContentKind::Movie
        } else {
            ContentKind::TvShow
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Movie,
    TvShow,
}

impl ContentKind {
    pub fn label(self) -> &'static str {
        match self {
            ContentKind::Movie => "movie",
            ContentKind::TvShow => "tv_show",
        }
    }
}

pub fn weekday_name(day: chrono::Weekday) -> &'static str {
    match day {
        chrono::Weekday::Mon => "Monday",
        chrono::Weekday::Tue => "Tuesday",
        chrono::Weekday::Wed => "Wednesday",
        chrono::Weekday::Thu => "Thursday",
        chrono::Weekday::Fri => "Friday",
        chrono::Weekday::Sat => "Saturday",
        chrono::Weekday::Sun => "Sunday",
    }
}

pub const WEEKDAYS: [chrono::Weekday; 7] = [
    chrono::Weekday::Mon,
    chrono::Weekday::Tue,
    chrono::Weekday::Wed,
    chrono::Weekday::Thu,
    chrono::Weekday::Fri,
    chrono::Weekday::Sat,
    chrono::Weekday::Sun,
];

//! # Normalizer
//!
//! Turns raw rows into [`ViewingRecord`]s: reconciles column aliases,
//! parses timestamps, derives calendar features and classifies titles.
//!
//! The movie/TV split is a heuristic. A title counts as a movie only when
//! it carries a parenthesized four-digit year, so movies exported without
//! one are reported as TV.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::record::{ViewingRecord, weekday_name};
use crate::source::RawRow;

static MOVIE_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\([0-9]{4}\)").expect("movie year pattern"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("row {row}: unparseable timestamp {value:?}")]
    MalformedTimestamp { row: usize, value: String },
    #[error("row {row}: missing required field `{field}`")]
    MissingField { row: usize, field: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalField {
    Title,
    Date,
    ProfileName,
}

impl CanonicalField {
    pub fn name(self) -> &'static str {
        match self {
            CanonicalField::Title => "title",
            CanonicalField::Date => "date",
            CanonicalField::ProfileName => "profile_name",
        }
    }
}

const COLUMN_ALIASES: &[(&str, CanonicalField)] = &[
    ("title", CanonicalField::Title),
    ("date", CanonicalField::Date),
    ("profile name", CanonicalField::ProfileName),
    ("profile_name", CanonicalField::ProfileName),
    ("profile", CanonicalField::ProfileName),
];

/// Map a raw header to its canonical field, if it is a known alias.
pub fn canonical_field(column: &str) -> Option<CanonicalField> {
    let key = column.trim().to_lowercase();
    COLUMN_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, field)| *field)
}

/// Timestamp formats tried in order after RFC 3339.
#[derive(Debug, Clone)]
pub struct TimestampFormats {
    pub datetime: Vec<String>,
    pub date: Vec<String>,
}

impl TimestampFormats {
    pub fn from_config(cfg: &crate::config::Config) -> Self {
        Self {
            datetime: cfg.datetime_formats.clone(),
            date: cfg.date_formats.clone(),
        }
    }

    /// Parse a wall-clock timestamp. Offsets are kept as local time, never
    /// converted.
    pub fn parse(&self, value: &str) -> Option<NaiveDateTime> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Some(dt.naive_local());
        }
        for fmt in &self.datetime {
            if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
                return Some(dt);
            }
        }
        for fmt in &self.date {
            if let Ok(d) = NaiveDate::parse_from_str(value, fmt) {
                return d.and_hms_opt(0, 0, 0);
            }
        }
        None
    }
}

pub fn is_movie_title(title: &str) -> bool {
    MOVIE_YEAR.is_match(title)
}

/// Normalize rows in input order. Fails on the first invalid row.
pub fn normalize(
    rows: &[RawRow],
    formats: &TimestampFormats,
) -> Result<Vec<ViewingRecord>, NormalizeError> {
    let mut records = Vec::with_capacity(rows.len());
    for (idx, row) in rows.iter().enumerate() {
        records.push(normalize_row(idx + 1, row, formats)?);
    }
    debug!("normalized {} rows", records.len());
    Ok(records)
}

fn normalize_row(
    source_row: usize,
    row: &RawRow,
    formats: &TimestampFormats,
) -> Result<ViewingRecord, NormalizeError> {
    let mut title: Option<&str> = None;
    let mut date: Option<&str> = None;
    let mut profile: Option<&str> = None;
    let mut extra = BTreeMap::new();

    for (column, value) in row.iter() {
        let slot = match canonical_field(column) {
            Some(CanonicalField::Title) => &mut title,
            Some(CanonicalField::Date) => &mut date,
            Some(CanonicalField::ProfileName) => &mut profile,
            None => {
                extra.insert(column.to_string(), value.to_string());
                continue;
            }
        };
        if slot.is_none() {
            *slot = Some(value);
        } else {
            extra.insert(column.to_string(), value.to_string());
        }
    }

    let title = title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(NormalizeError::MissingField {
            row: source_row,
            field: CanonicalField::Title.name(),
        })?;
    let raw_date = date.ok_or(NormalizeError::MissingField {
        row: source_row,
        field: CanonicalField::Date.name(),
    })?;
    let timestamp = formats
        .parse(raw_date)
        .ok_or_else(|| NormalizeError::MalformedTimestamp {
            row: source_row,
            value: raw_date.to_string(),
        })?;
    let profile_name = profile
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string);

    let is_movie = is_movie_title(title);
    Ok(ViewingRecord {
        source_row,
        title: title.to_string(),
        timestamp,
        profile_name,
        year: timestamp.year(),
        month: timestamp.month(),
        weekday_name: weekday_name(timestamp.weekday()),
        hour: timestamp.hour(),
        is_movie,
        is_tv_show: !is_movie,
        extra,
    })
}

//! # Statistics
//!
//! Descriptive aggregates over normalized records and the session table.
//! Every aggregate accepts empty input; averages and percentages become
//! `None` instead of dividing by zero.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::record::{WEEKDAYS, ViewingRecord, weekday_name};
use crate::sessions::{self, SessionTable};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewingSummary {
    pub total_views: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub active_days: usize,
    pub avg_views_per_active_day: Option<f64>,
    pub movies: usize,
    pub tv_shows: usize,
    pub movie_pct: Option<f64>,
    pub tv_pct: Option<f64>,
}

pub fn summarize(records: &[ViewingRecord]) -> ViewingSummary {
    let total_views = records.len();
    let days: HashSet<NaiveDate> = records.iter().map(ViewingRecord::date).collect();
    let active_days = days.len();
    let movies = records.iter().filter(|r| r.is_movie).count();
    let tv_shows = records.iter().filter(|r| r.is_tv_show).count();

    ViewingSummary {
        total_views,
        first_date: days.iter().min().copied(),
        last_date: days.iter().max().copied(),
        active_days,
        avg_views_per_active_day: ratio(total_views, active_days),
        movies,
        tv_shows,
        movie_pct: ratio(movies, total_views).map(|r| r * 100.0),
        tv_pct: ratio(tv_shows, total_views).map(|r| r * 100.0),
    }
}

fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
    if denominator == 0 {
        None
    } else {
        Some(numerator as f64 / denominator as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TitleCount {
    pub title: String,
    pub views: usize,
}

/// Most watched titles, by count descending. Ties keep first appearance.
pub fn top_titles(records: &[ViewingRecord], n: usize) -> Vec<TitleCount> {
    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<TitleCount> = Vec::new();
    for record in records {
        match first_seen.get(record.title.as_str()) {
            Some(&pos) => counts[pos].views += 1,
            None => {
                first_seen.insert(record.title.as_str(), counts.len());
                counts.push(TitleCount {
                    title: record.title.clone(),
                    views: 1,
                });
            }
        }
    }
    counts.sort_by(|a, b| b.views.cmp(&a.views));
    counts.truncate(n);
    counts
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub label: String,
    pub views: usize,
}

/// Views per weekday, Monday first, zero-filled.
pub fn weekday_distribution(records: &[ViewingRecord]) -> Vec<Bucket> {
    WEEKDAYS
        .iter()
        .map(|day| {
            let name = weekday_name(*day);
            Bucket {
                label: name.to_string(),
                views: records.iter().filter(|r| r.weekday_name == name).count(),
            }
        })
        .collect()
}

/// Views per hour of day, 0 through 23, zero-filled.
pub fn hour_distribution(records: &[ViewingRecord]) -> Vec<Bucket> {
    let mut counts = [0usize; 24];
    for record in records {
        counts[record.hour as usize] += 1;
    }
    counts
        .iter()
        .enumerate()
        .map(|(hour, views)| Bucket {
            label: format!("{hour:02}"),
            views: *views,
        })
        .collect()
}

/// Views per calendar month present in the data, chronological.
pub fn monthly_distribution(records: &[ViewingRecord]) -> Vec<Bucket> {
    let mut months: BTreeMap<(i32, u32), usize> = BTreeMap::new();
    for record in records {
        *months.entry((record.year, record.month)).or_default() += 1;
    }
    months
        .into_iter()
        .map(|((year, month), views)| Bucket {
            label: format!("{year:04}-{month:02}"),
            views,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BingeSummary {
    pub binge_sessions: usize,
    pub longest_views: Option<usize>,
    pub average_views: Option<f64>,
    pub longest_hours: Option<f64>,
}

pub fn binge_summary(table: &SessionTable) -> BingeSummary {
    let binges: Vec<_> = table.binge_sessions().collect();
    let total: usize = binges.iter().map(|s| s.view_count).sum();
    BingeSummary {
        binge_sessions: binges.len(),
        longest_views: binges.iter().map(|s| s.view_count).max(),
        average_views: ratio(total, binges.len()),
        longest_hours: binges
            .iter()
            .map(|s| s.duration_hours)
            .fold(None, |acc: Option<f64>, h| Some(acc.map_or(h, |a| a.max(h)))),
    }
}

/// Everything one run derives from the normalized records.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub records: Vec<ViewingRecord>,
    pub sessions: SessionTable,
    pub summary: ViewingSummary,
    pub top_titles: Vec<TitleCount>,
    pub by_weekday: Vec<Bucket>,
    pub by_hour: Vec<Bucket>,
    pub by_month: Vec<Bucket>,
    pub binge: BingeSummary,
}

impl Analysis {
    pub fn build(records: Vec<ViewingRecord>, gap_threshold: Duration, top_n: usize) -> Self {
        let sessions = sessions::segment(&records, gap_threshold);
        Self {
            summary: summarize(&records),
            top_titles: top_titles(&records, top_n),
            by_weekday: weekday_distribution(&records),
            by_hour: hour_distribution(&records),
            by_month: monthly_distribution(&records),
            binge: binge_summary(&sessions),
            sessions,
            records,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{TimestampFormats, normalize};
    use crate::source::RawRow;

    fn records(rows: &[(&str, &str)]) -> Vec<ViewingRecord> {
        let cfg = crate::config::load_config(None).expect("config").config;
        let raw: Vec<RawRow> = rows
            .iter()
            .map(|(t, d)| RawRow::from_pairs([("Title", *t), ("Date", *d)]))
            .collect();
        normalize(&raw, &TimestampFormats::from_config(&cfg)).expect("normalize")
    }

    #[test]
    fn summary_counts() {
        let recs = records(&[
            ("Inception (2010)", "2024-01-01 20:00:00"),
            ("Show: E1", "2024-01-01 21:00:00"),
            ("Show: E2", "2024-01-03 21:00:00"),
            ("Show: E3", "2024-01-03 22:00:00"),
        ]);
        let s = summarize(&recs);
        assert_eq!(s.total_views, 4);
        assert_eq!(s.active_days, 2);
        assert_eq!(s.avg_views_per_active_day, Some(2.0));
        assert_eq!(s.movies, 1);
        assert_eq!(s.tv_shows, 3);
        assert_eq!(s.movie_pct, Some(25.0));
        assert_eq!(s.tv_pct, Some(75.0));
        assert_eq!(s.first_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(s.last_date, NaiveDate::from_ymd_opt(2024, 1, 3));
    }

    #[test]
    fn empty_summary_has_no_averages() {
        let s = summarize(&[]);
        assert_eq!(s.total_views, 0);
        assert_eq!(s.active_days, 0);
        assert_eq!(s.avg_views_per_active_day, None);
        assert_eq!(s.movie_pct, None);
        assert_eq!(s.first_date, None);
    }

    #[test]
    fn top_titles_breaks_ties_by_first_seen() {
        let recs = records(&[
            ("B", "2024-01-01"),
            ("A", "2024-01-02"),
            ("A", "2024-01-03"),
            ("C", "2024-01-04"),
            ("B", "2024-01-05"),
            ("D", "2024-01-06"),
        ]);
        let top = top_titles(&recs, 3);
        let names: Vec<(&str, usize)> = top.iter().map(|t| (t.title.as_str(), t.views)).collect();
        assert_eq!(names, vec![("B", 2), ("A", 2), ("C", 1)]);
    }

    #[test]
    fn distributions_are_zero_filled() {
        let recs = records(&[("X", "2024-01-01 09:15:00"), ("Y", "2024-02-03 23:00:00")]);
        let weekdays = weekday_distribution(&recs);
        assert_eq!(weekdays.len(), 7);
        assert_eq!(weekdays[0].label, "Monday");
        assert_eq!(weekdays[0].views, 1);
        assert_eq!(weekdays[5].views, 1);
        let hours = hour_distribution(&recs);
        assert_eq!(hours.len(), 24);
        assert_eq!(hours[9].views, 1);
        assert_eq!(hours[23].views, 1);
        let months = monthly_distribution(&recs);
        let labels: Vec<&str> = months.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["2024-01", "2024-02"]);
    }

    #[test]
    fn binge_summary_ignores_singletons() {
        let recs = records(&[
            ("E1", "2024-01-01 10:00:00"),
            ("E2", "2024-01-01 11:00:00"),
            ("E3", "2024-01-01 12:00:00"),
            ("Solo", "2024-01-05 12:00:00"),
            ("F1", "2024-01-09 12:00:00"),
            ("F2", "2024-01-09 12:30:00"),
        ]);
        let analysis = Analysis::build(recs, Duration::hours(6), 10);
        assert_eq!(analysis.sessions.len(), 3);
        assert_eq!(analysis.binge.binge_sessions, 2);
        assert_eq!(analysis.binge.longest_views, Some(3));
        assert_eq!(analysis.binge.average_views, Some(2.5));
        assert_eq!(analysis.binge.longest_hours, Some(2.0));
    }

    #[test]
    fn empty_analysis() {
        let analysis = Analysis::build(Vec::new(), Duration::hours(6), 10);
        assert!(analysis.sessions.is_empty());
        assert!(analysis.top_titles.is_empty());
        assert!(analysis.by_month.is_empty());
        assert_eq!(analysis.binge.binge_sessions, 0);
        assert_eq!(analysis.binge.average_views, None);
        assert_eq!(analysis.binge.longest_views, None);
    }
}

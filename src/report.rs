//! Human-readable console report, including text bar charts.

use std::io::{self, Write};

use crate::stats::{Analysis, Bucket};

#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
    /// Requested N for the top-titles heading, even when fewer titles exist.
    pub top_titles: usize,
    pub label_width: usize,
    pub chart_width: usize,
}

impl ReportOptions {
    pub fn from_config(cfg: &crate::config::Config) -> Self {
        Self {
            top_titles: cfg.top_titles,
            label_width: cfg.title_label_width,
            chart_width: cfg.chart_width,
        }
    }
}

const RULE: &str = "==================================================";

pub fn render<W: Write>(out: &mut W, analysis: &Analysis, opts: &ReportOptions) -> io::Result<()> {
    render_basic_stats(out, analysis)?;
    render_top_titles(out, analysis, opts)?;
    render_chart(out, "VIEWING BY DAY OF WEEK", &analysis.by_weekday, opts)?;
    render_chart(out, "VIEWING BY HOUR OF DAY", &analysis.by_hour, opts)?;
    render_chart(out, "MONTHLY VIEWING ACTIVITY", &analysis.by_month, opts)?;
    render_binge(out, analysis)?;
    Ok(())
}

fn render_basic_stats<W: Write>(out: &mut W, analysis: &Analysis) -> io::Result<()> {
    let s = &analysis.summary;
    writeln!(out, "{RULE}")?;
    writeln!(out, "BASIC VIEWING STATISTICS")?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "Total views: {}", s.total_views)?;
    match (s.first_date, s.last_date) {
        (Some(first), Some(last)) => writeln!(
            out,
            "Date range: {} to {}",
            first.format("%Y-%m-%d"),
            last.format("%Y-%m-%d")
        )?,
        _ => writeln!(out, "Date range: n/a")?,
    }
    writeln!(out, "Days with activity: {}", s.active_days)?;
    writeln!(
        out,
        "Average views per active day: {}",
        fmt_opt(s.avg_views_per_active_day, 2)
    )?;
    writeln!(out)?;
    writeln!(out, "Movies watched: {} ({}%)", s.movies, fmt_opt(s.movie_pct, 1))?;
    writeln!(
        out,
        "TV episodes watched: {} ({}%)",
        s.tv_shows,
        fmt_opt(s.tv_pct, 1)
    )?;
    Ok(())
}

fn render_top_titles<W: Write>(
    out: &mut W,
    analysis: &Analysis,
    opts: &ReportOptions,
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "TOP {} MOST WATCHED TITLES", opts.top_titles)?;
    writeln!(out, "{}", "-".repeat(30))?;
    for (rank, entry) in analysis.top_titles.iter().enumerate() {
        writeln!(
            out,
            "{}. {}: {} views",
            rank + 1,
            truncate_label(&entry.title, opts.label_width),
            entry.views
        )?;
    }
    Ok(())
}

fn render_chart<W: Write>(
    out: &mut W,
    title: &str,
    buckets: &[Bucket],
    opts: &ReportOptions,
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{title}")?;
    writeln!(out, "{}", "-".repeat(title.len()))?;
    if buckets.is_empty() {
        writeln!(out, "(no data)")?;
        return Ok(());
    }
    let max = buckets.iter().map(|b| b.views).max().unwrap_or(0);
    let label_width = buckets.iter().map(|b| b.label.len()).max().unwrap_or(0);
    for bucket in buckets {
        writeln!(
            out,
            "{:<label_width$} | {} {}",
            bucket.label,
            "#".repeat(bar_len(bucket.views, max, opts.chart_width)),
            bucket.views
        )?;
    }
    Ok(())
}

fn render_binge<W: Write>(out: &mut W, analysis: &Analysis) -> io::Result<()> {
    let b = &analysis.binge;
    writeln!(out)?;
    writeln!(out, "BINGE WATCHING ANALYSIS")?;
    writeln!(out, "{}", "-".repeat(25))?;
    writeln!(out, "Total sessions: {}", analysis.sessions.len())?;
    match (b.longest_views, b.average_views) {
        (Some(longest), Some(average)) => {
            writeln!(out, "Found {} potential binge sessions!", b.binge_sessions)?;
            writeln!(out, "Longest binge: {longest} episodes")?;
            writeln!(out, "Average binge: {average:.1} episodes")?;
            if let Some(hours) = b.longest_hours {
                writeln!(out, "Longest binge span: {hours:.1} hours")?;
            }
        }
        _ => writeln!(out, "No significant binge sessions detected.")?,
    }
    Ok(())
}

/// Scale `views` to a bar of at most `width` characters. Non-zero counts
/// always get at least one mark.
pub fn bar_len(views: usize, max: usize, width: usize) -> usize {
    if max == 0 || views == 0 {
        return 0;
    }
    ((views * width) / max).max(1)
}

pub fn truncate_label(title: &str, width: usize) -> String {
    if title.chars().count() > width {
        let head: String = title.chars().take(width).collect();
        format!("{head}...")
    } else {
        title.to_string()
    }
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{v:.precision$}"),
        None => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::Analysis;
    use chrono::Duration;

    fn opts() -> ReportOptions {
        ReportOptions {
            top_titles: 8,
            label_width: 10,
            chart_width: 20,
        }
    }

    #[test]
    fn truncates_long_titles() {
        assert_eq!(truncate_label("Short", 10), "Short");
        assert_eq!(truncate_label("A very long title", 6), "A very...");
    }

    #[test]
    fn scales_bars() {
        assert_eq!(bar_len(0, 10, 40), 0);
        assert_eq!(bar_len(10, 10, 40), 40);
        assert_eq!(bar_len(1, 1000, 40), 1);
        assert_eq!(bar_len(5, 0, 40), 0);
    }

    #[test]
    fn renders_empty_analysis() {
        let analysis = Analysis::build(Vec::new(), Duration::hours(6), 8);
        let mut buf = Vec::new();
        render(&mut buf, &analysis, &opts()).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("Total views: 0"));
        assert!(text.contains("Date range: n/a"));
        assert!(text.contains("Average views per active day: n/a"));
        assert!(text.contains("No significant binge sessions detected."));
        assert!(text.contains("(no data)"));
    }

    #[test]
    fn heading_shows_requested_top_count() {
        let ts = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(20, 0, 0))
            .expect("ts");
        let record = crate::record::ViewingRecord {
            source_row: 1,
            title: "Arrival (2016)".to_string(),
            timestamp: ts,
            profile_name: None,
            year: 2024,
            month: 1,
            weekday_name: "Monday",
            hour: 20,
            is_movie: true,
            is_tv_show: false,
            extra: Default::default(),
        };
        let analysis = Analysis::build(vec![record], Duration::hours(6), 8);
        assert_eq!(analysis.top_titles.len(), 1);

        let mut buf = Vec::new();
        render(&mut buf, &analysis, &opts()).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("TOP 8 MOST WATCHED TITLES"));
        assert!(text.contains("1. Arrival (2...: 1 views"));
    }
}

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use serde::Deserialize;

use crate::util::hash_bytes;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub run_id: String,
    pub candidate_files: Vec<PathBuf>,
    pub gap_threshold_hours: f64,
    pub top_titles: usize,
    pub title_label_width: usize,
    pub chart_width: usize,
    pub datetime_formats: Vec<String>,
    pub date_formats: Vec<String>,
    pub parquet_row_group_size: usize,
}

impl Config {
    /// Gap threshold as a duration, millisecond precision.
    pub fn gap_threshold(&self) -> chrono::Duration {
        chrono::Duration::milliseconds((self.gap_threshold_hours * 3_600_000.0).round() as i64)
    }

    pub fn set_gap_threshold_hours(&mut self, hours: f64) -> Result<()> {
        validate_gap_hours(hours)?;
        self.gap_threshold_hours = hours;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub config_hash: String,
}

pub fn load_config(path: Option<&Path>) -> Result<LoadedConfig> {
    let bytes: Vec<u8> = if let Some(p) = path {
        std::fs::read(p)?
    } else {
        include_bytes!("../config/default.yml").to_vec()
    };

    let mut config: Config = serde_yaml::from_slice(&bytes)?;
    if config.run_id.trim().is_empty() {
        config.run_id = generate_run_id();
    }
    validate_gap_hours(config.gap_threshold_hours)?;
    if config.datetime_formats.is_empty() && config.date_formats.is_empty() {
        bail!("config must list at least one datetime or date format");
    }

    let config_hash = hash_bytes(&bytes);

    Ok(LoadedConfig { config, config_hash })
}

fn validate_gap_hours(hours: f64) -> Result<()> {
    if !hours.is_finite() || hours < 0.0 {
        bail!("gap threshold must be a finite, non-negative number of hours (got {hours})");
    }
    Ok(())
}

fn generate_run_id() -> String {
    let now = chrono::Utc::now();
    format!("{}_{}", now.format("%Y%m%dT%H%M%SZ"), rand_suffix())
}

fn rand_suffix() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    format!("{:08x}", nanos)
}

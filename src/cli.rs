use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum ExportBackend {
    Jsonl,
    Csv,
    Parquet,
}

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct CliOptions {
    /// Viewing history file (skips candidate discovery)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Directory searched for the configured candidate file names
    #[arg(long, default_value = ".")]
    pub search_dir: PathBuf,

    /// Output directory for exported tables
    #[arg(short, long, default_value = "./output")]
    pub output: PathBuf,

    /// Optional path to config file (YAML)
    #[arg(long)]
    pub config_path: Option<PathBuf>,

    /// Session gap threshold, in hours (overrides config when set)
    #[arg(long)]
    pub gap_hours: Option<f64>,

    /// Number of titles in the ranking (overrides config when set)
    #[arg(long)]
    pub top: Option<usize>,

    /// Export backend
    #[arg(long, value_enum, default_value_t = ExportBackend::Jsonl)]
    pub export_backend: ExportBackend,

    /// Print the report only, write no tables
    #[arg(long)]
    pub no_export: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

impl CliOptions {
    /// Candidate input paths: the explicit `--input`, or the configured list.
    pub fn candidates(&self, configured: &[PathBuf]) -> Vec<PathBuf> {
        match &self.input {
            Some(path) => vec![path.clone()],
            None => configured.to_vec(),
        }
    }
}

pub fn parse() -> CliOptions {
    CliOptions::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn defaults_without_flags() {
        let opts = CliOptions::try_parse_from(["watchlens"]).expect("parse");
        assert!(opts.input.is_none());
        assert_eq!(opts.search_dir, PathBuf::from("."));
        assert!(matches!(opts.export_backend, ExportBackend::Jsonl));
        assert!(!opts.no_export);
    }

    #[test]
    fn parses_gap_and_backend() {
        let opts = CliOptions::try_parse_from([
            "watchlens",
            "--gap-hours",
            "2.5",
            "--export-backend",
            "parquet",
            "--top",
            "3",
        ])
        .expect("parse");
        assert_eq!(opts.gap_hours, Some(2.5));
        assert_eq!(opts.top, Some(3));
        assert!(matches!(opts.export_backend, ExportBackend::Parquet));
    }

    #[test]
    fn explicit_input_replaces_candidates() {
        let opts =
            CliOptions::try_parse_from(["watchlens", "--input", "mine.csv"]).expect("parse");
        let configured = vec![PathBuf::from("a.csv"), PathBuf::from("b.csv")];
        assert_eq!(opts.candidates(&configured), vec![PathBuf::from("mine.csv")]);

        let opts = CliOptions::try_parse_from(["watchlens"]).expect("parse");
        assert_eq!(opts.candidates(&configured), configured);
    }
}

//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use watchlens::config::{self, Config};
use watchlens::export::ExportBackendKind;
use watchlens::pipeline::{self, RunOptions, RunOutcome};

pub const SAMPLE_CSV: &str = "\
Title,Date,Profile Name
\"Stranger Things: Season 1: Chapter One\",2024-01-01 10:00:00,Sam
\"Stranger Things: Season 1: Chapter Two\",2024-01-01 11:00:00,Sam
\"Stranger Things: Season 1: Chapter Three\",2024-01-01 12:00:00,Sam
Inception (2010),2024-01-02 20:00:00,Sam
\"Stranger Things: Season 1: Chapter Four\",2024-01-06 21:00:00,Alex
\"Stranger Things: Season 1: Chapter Five\",2024-01-06 22:30:00,Alex
Arrival (2016),2024-02-10 19:00:00,Alex
";

/// Write `content` under `dir` with the given file name.
pub fn write_fixture(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("write fixture");
    path
}

pub fn test_config(run_id: &str) -> (Config, String) {
    let loaded = config::load_config(None).expect("config");
    let mut cfg = loaded.config;
    cfg.run_id = run_id.to_string();
    (cfg, loaded.config_hash)
}

pub fn run_options(
    cfg: &Config,
    config_hash: &str,
    search_dir: &Path,
    output_dir: &Path,
    backend: Option<ExportBackendKind>,
) -> RunOptions {
    RunOptions {
        candidates: cfg.candidate_files.clone(),
        search_dir: search_dir.to_path_buf(),
        output_dir: output_dir.to_path_buf(),
        export_backend: backend,
        config_hash: config_hash.to_string(),
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

/// Run the pipeline on a directory, returning the outcome and the report text.
pub fn run_in_dir(
    cfg: &Config,
    config_hash: &str,
    search_dir: &Path,
    output_dir: &Path,
    backend: Option<ExportBackendKind>,
) -> (RunOutcome, String) {
    let opts = run_options(cfg, config_hash, search_dir, output_dir, backend);
    let mut buf = Vec::new();
    let outcome = pipeline::run_analysis(cfg, &opts, &mut buf).expect("run analysis");
    (outcome, String::from_utf8(buf).expect("utf8 report"))
}

pub fn read_jsonl(path: &Path) -> Vec<serde_json::Value> {
    let content = fs::read_to_string(path).expect("read jsonl");
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).expect("json"))
        .collect()
}

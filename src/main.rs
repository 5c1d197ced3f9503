use anyhow::Result;
use tracing::{info, warn};

use watchlens::{cli, config, logging, pipeline, util};

fn main() -> Result<()> {
    let cli_opts = cli::parse();
    logging::init_logging(cli_opts.log_json);

    let loaded = config::load_config(cli_opts.config_path.as_deref())?;
    let mut cfg = loaded.config;
    if let Some(hours) = cli_opts.gap_hours {
        cfg.set_gap_threshold_hours(hours)?;
    }
    if let Some(top) = cli_opts.top {
        cfg.top_titles = top;
    }

    let opts = pipeline::RunOptions {
        candidates: cli_opts.candidates(&cfg.candidate_files),
        search_dir: cli_opts.search_dir.clone(),
        output_dir: cli_opts.output.clone(),
        export_backend: (!cli_opts.no_export).then(|| util::backend_from_cli(cli_opts.export_backend)),
        config_hash: loaded.config_hash.clone(),
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
    };

    info!(
        "starting run_id={} search_dir={} gap_hours={} output={}",
        cfg.run_id,
        opts.search_dir.display(),
        cfg.gap_threshold_hours,
        opts.output_dir.display()
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match pipeline::run_analysis(&cfg, &opts, &mut out)? {
        pipeline::RunOutcome::NoSource { searched } => {
            for path in &searched {
                warn!("not found: {}", path.display());
            }
            eprintln!("No viewing history file found.");
            eprintln!("Place an export CSV in the search directory or pass --input.");
        }
        pipeline::RunOutcome::Completed { .. } => {
            info!("watchlens run finished");
        }
    }
    Ok(())
}

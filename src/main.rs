//! Scheduled entrypoint: fetch the tournament page once, refresh the calendar
//! and change feed, persist the snapshot, exit.
//!
//! Exit status is non-zero whenever the run aborted; previous outputs are then
//! left as they were.

use std::process::ExitCode;

use egf_calendar::ingest::providers::http::HttpPageSource;
use egf_calendar::{run_once, telemetry, Config, JsonFileStore};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("run aborted: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let cfg = Config::load_default()?;
    let metrics = match &cfg.metrics_textfile {
        Some(_) => Some(telemetry::install_metrics()?),
        None => None,
    };

    let source = HttpPageSource::new(cfg.source_url.clone()).with_timeout(cfg.http_timeout_secs);
    let store = JsonFileStore::new(cfg.snapshot_path());
    let result = run_once(&cfg, &source, &store).await;

    // Export even on failure so the error counters are visible.
    if let (Some(handle), Some(path)) = (&metrics, &cfg.metrics_textfile) {
        if let Err(e) = telemetry::write_textfile(handle, path) {
            tracing::warn!("metrics textfile: {e:#}");
        }
    }

    result.map(|_| ())
}

// src/telemetry.rs
//! Logging and metrics wiring for the binary.

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::path::Path;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";
const DEFAULT_FILTER: &str = "egf_calendar=info,warn";

/// Install the global tracing subscriber.
/// `RUST_LOG` overrides the default filter; `LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json = std::env::var(ENV_LOG_FORMAT)
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact().with_target(false)).init();
    }
}

/// Install a Prometheus recorder so counters can be dumped after the run.
pub fn install_metrics() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .context("prometheus: install recorder")
}

/// Dump all series in exposition format, for the node_exporter textfile collector.
pub fn write_textfile(handle: &PrometheusHandle, path: &Path) -> Result<()> {
    crate::render::write_atomic(path, &handle.render())
        .with_context(|| format!("writing metrics textfile {}", path.display()))
}

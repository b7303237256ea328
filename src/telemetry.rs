use std::path::Path;

use anyhow::{Result, anyhow};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt};

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("streamgraph=info"))
        .unwrap_or_else(|_| EnvFilter::default().add_directive(Level::INFO.into()))
}

/// Log to a file. The terminal belongs to the UI while it runs.
///
/// Logs are flushed when the returned guard is dropped.
pub fn init_file(path: &Path) -> Result<WorkerGuard> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("log file {} has no file name", path.display()))?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));

    fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|err| anyhow!("failed to initialise tracing subscriber: {err}"))?;

    Ok(guard)
}

/// Log to stderr, leaving stdout for exported data
pub fn init_stderr() -> Result<()> {
    fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|err| anyhow!("failed to initialise tracing subscriber: {err}"))
}

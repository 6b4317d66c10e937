use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE_NAME: &str = "kanban.log";

/// Sends `tracing` output to `<data_dir>/kanban.log`.
///
/// The terminal belongs to the UI, so nothing is logged to stdout. `RUST_LOG`
/// takes precedence over `default_filter`. Keep the returned guard alive for
/// the life of the program or buffered lines are lost.
pub fn init_logging(data_dir: &Path, default_filter: &str) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(data_dir)?;
    let appender = tracing_appender::rolling::never(data_dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_filter))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err))?;

    Ok(guard)
}

//! Logging setup for the irori binaries.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// Logs go to stdout, or to `log_file` when one is given. The log level can
/// be overridden with the `RUST_LOG` environment variable.
///
/// Returns the appender guard when logging to a file; it must be kept alive
/// for the lifetime of the process or buffered lines are lost on exit.
pub fn setup_logger(
    binary_name: &str,
    default_log_level: &str,
    log_file: Option<&Path>,
) -> Option<WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "irori_shared={lvl},irori_server={lvl},irori_client={lvl},{bin}={lvl}",
            lvl = default_log_level,
            bin = binary_name.replace('-', "_"),
        )
        .into()
    });

    match log_file {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
            let file_name = path.file_name().unwrap_or(path.as_os_str());
            let appender =
                tracing_appender::rolling::never(dir.unwrap_or(Path::new(".")), file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
            None
        }
    }
}

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter when `RUST_LOG` is unset: our own events at INFO, HTTP
/// internals only when they warn.
const DEFAULT_FILTER: &str = "warn,sakura_nav=info";

/// Routes tracing output to a daily file under `dir` so it never draws over the TUI.
///
/// Keep the returned guard alive for the whole run; dropping it flushes the writer.
pub fn initialize_logging(dir: &Path) -> WorkerGuard {
    if let Err(e) = std::fs::create_dir_all(dir) {
        eprintln!("Could not create log directory {}: {}", dir.display(), e);
    }

    let file_appender = tracing_appender::rolling::daily(dir, "sakura-nav.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false).with_target(true))
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Logging initialized");
    guard
}

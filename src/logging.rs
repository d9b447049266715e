use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Wires the global subscriber: human-readable console output plus a
/// daily-rolling JSON file under `logs/`.
///
/// The returned guard flushes the file writer when dropped; the caller
/// holds it for the life of the process.
pub fn init_logging() -> WorkerGuard {
    let _ = fs::create_dir_all("logs");

    let rolling = tracing_appender::rolling::daily("logs", "coleta-api.log");
    let (file_writer, guard) = tracing_appender::non_blocking(rolling);

    let filter = EnvFilter::from_default_env()
        .add_directive("coleta_api=info".parse().expect("static directive parses"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_writer(file_writer))
        .with(fmt::layer().with_writer(std::io::stdout))
        .init();

    guard
}

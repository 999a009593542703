use std::{fs::File, path::Path, sync::OnceLock};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static SUBSCRIBER_SET: OnceLock<()> = OnceLock::new();
static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

pub fn setup_logger(log_dir: &str, _endpoint: &str) -> Result<(), Box<dyn std::error::Error>> {
    if SUBSCRIBER_SET.get().is_some() {
        return Ok(());
    }

    let file = File::create(Path::new(log_dir).join("catalog.log"))?;
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file);

    let filter = EnvFilter::try_from_env("CATALOG_LOG")
        .unwrap_or_else(|_| EnvFilter::new(Level::INFO.as_str()));
    let file_layer = fmt::layer()
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(non_blocking_writer)
        .with_filter(filter);

    LOG_GUARD.set(guard).ok();
    SUBSCRIBER_SET.get_or_init(|| {
        tracing_subscriber::registry().with(file_layer).try_init().ok();
    });

    Ok(())
}

pub fn shutdown() {}

#[cfg(feature = "debug-tracing")]
use std::{path::Path, sync::Mutex};

#[cfg(feature = "debug-tracing")]
use tracing_appender::non_blocking::WorkerGuard;
#[cfg(feature = "debug-tracing")]
use tracing_subscriber::EnvFilter;

#[cfg(feature = "debug-tracing")]
static TRACING_GUARD: Mutex<Option<WorkerGuard>> = Mutex::new(None);

#[cfg(feature = "debug-tracing")]
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Logs to stderr. `RUST_LOG` overrides the default `info` filter.
#[cfg(feature = "debug-tracing")]
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_level(true)
        .with_target(true);

    if subscriber.try_init().is_ok() {
        tracing::info!("tracing initialized");
    }
}

/// Logs to hourly rolling files under `dir`.
#[cfg(feature = "debug-tracing")]
pub fn init_file_tracing(dir: &Path) {
    let file_appender = tracing_appender::rolling::hourly(dir, "chat-bridge.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_level(true)
        .with_target(true);

    if subscriber.try_init().is_ok() {
        store_tracing_guard(guard);
        tracing::info!(dir = %dir.display(), "file tracing initialized");
    }
}

#[cfg(feature = "debug-tracing")]
fn store_tracing_guard(guard: WorkerGuard) {
    match TRACING_GUARD.lock() {
        Ok(mut slot) => *slot = Some(guard),
        Err(poisoned) => *poisoned.into_inner() = Some(guard),
    }
}

#[cfg(not(feature = "debug-tracing"))]
pub fn init_tracing() {}

#[cfg(not(feature = "debug-tracing"))]
pub fn init_file_tracing(_dir: &std::path::Path) {}

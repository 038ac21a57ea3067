//! Tracing setup for the server process.
//!
//! Under systemd the journal gets structured events. Run by hand, events go
//! to stderr and to a daily rolling file in the log directory. Requests are
//! traced by tower-http, so its target is raised to `debug` by default.

use anyhow::Result;
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,tower_http=debug";

/// Filter from an `AGO_LOG` value. Missing or unparsable values fall back to
/// [`DEFAULT_FILTER`].
fn env_filter(raw: Option<&str>) -> EnvFilter {
    raw.and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// systemd sets `JOURNAL_STREAM` when stdout/stderr are connected to the
/// journal; logging to both would record every line twice.
#[cfg(target_os = "linux")]
fn under_systemd() -> bool {
    std::env::var_os("JOURNAL_STREAM").is_some()
}

/// Install the global subscriber. `AGO_LOG` takes the usual `EnvFilter`
/// syntax, e.g. `AGO_LOG=ago=trace,tower_http=info`.
pub fn init(log_dir: PathBuf) -> Result<()> {
    let filter = env_filter(std::env::var("AGO_LOG").ok().as_deref());

    #[cfg(target_os = "linux")]
    if under_systemd() {
        if let Ok(journald) = tracing_journald::layer() {
            tracing_subscriber::registry().with(filter).with(journald).init();
            tracing::info!("Logging to journald");
            return Ok(());
        }
    }

    std::fs::create_dir_all(&log_dir)?;
    let (file_writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(&log_dir, "ago.log"));

    // Dropping the guard stops the writer thread; keep it for the process.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> = std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .init();

    tracing::info!(dir = %log_dir.display(), "Logging to stderr and daily file");
    Ok(())
}

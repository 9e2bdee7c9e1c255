//! Log sinks: a per-hostname file, mirrored to the console when verbose.

use crate::error::{DdnsError, Result};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Subscriber;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Log file for `hostname` inside `dir`, e.g. `aaaa-sync-home.example.com.log`.
pub fn log_file_path(dir: &Path, hostname: &str) -> PathBuf {
    let name: String = hostname
        .trim_end_matches('.')
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();

    dir.join(format!("aaaa-sync-{}.log", name))
}

/// Plain-text layer writing `<timestamp> <LEVEL> <message>` lines to `file`.
pub fn file_layer<S>(file: File) -> impl Layer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()))
}

/// Install the global subscriber.
///
/// Respects RUST_LOG if set, otherwise logs at INFO.
pub fn init(log_file: &Path, verbose: bool) -> Result<()> {
    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(log_file)?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let console_layer = verbose.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()))
            .compact()
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer(file))
        .with(console_layer)
        .try_init()
        .map_err(|e| DdnsError::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_per_hostname() {
        let dir = Path::new("/var/log/aaaa-sync");
        assert_eq!(
            log_file_path(dir, "home.example.com."),
            PathBuf::from("/var/log/aaaa-sync/aaaa-sync-home.example.com.log")
        );
        assert_eq!(
            log_file_path(dir, "*.lab/example.com"),
            PathBuf::from("/var/log/aaaa-sync/aaaa-sync-_.lab_example.com.log")
        );
    }
}

//! Logging Infrastructure
//!
//! Console output plus an optional daily rotating file in `LOG_DIR`.
//! Production uses JSON lines; development uses the pretty formatter.
//! `RUST_LOG` overrides the configured level when set.

use std::fs;
use std::path::Path;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

const LOG_FILE_PREFIX: &str = "fulfillment";
const LOG_FILE_SUFFIX: &str = "log";

/// Days of rotated log files kept by [`cleanup_old_logs`]
pub const LOG_RETENTION_DAYS: i64 = 14;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize the global subscriber
///
/// ```no_run
/// // development, console only
/// fulfillment_server::init_logger("debug", false, None)?;
///
/// // production, console + /var/log/fulfillment/fulfillment.YYYY-MM-DD.log
/// fulfillment_server::init_logger("info", true, Some("/var/log/fulfillment"))?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn init_logger(level: &str, json_format: bool, log_dir: Option<&str>) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let mut layers: Vec<BoxedLayer> = Vec::new();
    layers.push(if json_format {
        fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    });

    if let Some(dir) = log_dir {
        fs::create_dir_all(dir)?;
        let appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(LOG_FILE_PREFIX)
            .filename_suffix(LOG_FILE_SUFFIX)
            .build(dir)?;
        let writer = std::sync::Mutex::new(appender);
        layers.push(if json_format {
            fmt::layer().json().with_writer(writer).boxed()
        } else {
            fmt::layer().with_ansi(false).with_writer(writer).boxed()
        });
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()?;
    Ok(())
}

/// Delete rotated log files older than `retention_days`; returns how many were removed
pub fn cleanup_old_logs(log_dir: &Path, retention_days: i64) -> std::io::Result<usize> {
    let cutoff = chrono::Local::now().date_naive() - chrono::Duration::days(retention_days);
    let mut removed = 0;

    for entry in fs::read_dir(log_dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(date) = log_file_date(name) else {
            continue;
        };
        if date < cutoff {
            fs::remove_file(&path)?;
            tracing::info!(file = %name, "Deleted old log file");
            removed += 1;
        }
    }
    Ok(removed)
}

/// `fulfillment.2026-10-18.log` → 2026-10-18
fn log_file_date(name: &str) -> Option<chrono::NaiveDate> {
    let date = name
        .strip_prefix(LOG_FILE_PREFIX)?
        .strip_prefix('.')?
        .strip_suffix(LOG_FILE_SUFFIX)?
        .strip_suffix('.')?;
    chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_date() {
        assert_eq!(
            log_file_date("fulfillment.2026-10-18.log"),
            chrono::NaiveDate::from_ymd_opt(2026, 10, 18)
        );
        assert_eq!(log_file_date("fulfillment.log"), None);
        assert_eq!(log_file_date("other.2026-10-18.log"), None);
    }

    #[test]
    fn test_cleanup_keeps_recent_and_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let today = chrono::Local::now().date_naive();
        let old = today - chrono::Duration::days(LOG_RETENTION_DAYS + 1);

        let recent_name = format!("fulfillment.{}.log", today.format("%Y-%m-%d"));
        let old_name = format!("fulfillment.{}.log", old.format("%Y-%m-%d"));
        for name in [recent_name.as_str(), old_name.as_str(), "notes.txt"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }

        assert_eq!(cleanup_old_logs(dir.path(), LOG_RETENTION_DAYS).unwrap(), 1);
        assert!(dir.path().join(&recent_name).exists());
        assert!(!dir.path().join(&old_name).exists());
        assert!(dir.path().join("notes.txt").exists());
    }
}

use std::fs::{self, File};
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::Level;
use tracing_appender::non_blocking::{NonBlockingBuilder, WorkerGuard};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use crate::config::{LoggingConfig, ResolvedOutputs};

const TELEMETRY_FILE: &str = "telemetry.jsonl";

/// Keeps the background writer alive; dropping it flushes the file.
pub struct LoggingGuard {
    _worker: WorkerGuard,
    pub telemetry_path: PathBuf,
}

/// Installs a JSON subscriber writing to `telemetry.jsonl` next to the round
/// rows. `RUST_LOG` wins over the configured level when set.
pub fn init_logging(
    logging: &LoggingConfig,
    outputs: &ResolvedOutputs,
) -> Result<Option<LoggingGuard>> {
    if !logging.enable_structured {
        return Ok(None);
    }

    let telemetry_path = match outputs.jsonl.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating output directory {}", dir.display()))?;
            dir.join(TELEMETRY_FILE)
        }
        _ => PathBuf::from(TELEMETRY_FILE),
    };
    let file = File::create(&telemetry_path)
        .with_context(|| format!("opening {}", telemetry_path.display()))?;
    let (writer, worker) = NonBlockingBuilder::default().lossy(false).finish(file);

    let fallback = logging.level().unwrap_or(Level::INFO);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::from_level(fallback).into()));

    let installed = tracing_subscriber::fmt()
        .json()
        .with_target(true)
        .with_env_filter(filter)
        .with_writer(writer)
        .try_init();
    if let Err(err) = installed {
        tracing::debug!(%err, "keeping the subscriber that is already installed");
    }

    Ok(Some(LoggingGuard {
        _worker: worker,
        telemetry_path,
    }))
}

#[cfg(test)]
mod tests {
    use super::init_logging;
    use crate::config::{LoggingConfig, ResolvedOutputs};
    use tempfile::tempdir;

    fn outputs_in(dir: &std::path::Path) -> ResolvedOutputs {
        ResolvedOutputs {
            jsonl: dir.join("rows/rounds.jsonl"),
            summary_md: dir.join("summary.md"),
        }
    }

    #[test]
    fn disabled_logging_installs_nothing() {
        let dir = tempdir().expect("temp dir");
        let guard = init_logging(&LoggingConfig::default(), &outputs_in(dir.path()))
            .expect("no error");
        assert!(guard.is_none());
        assert!(!dir.path().join("rows").exists());
    }

    #[test]
    fn telemetry_lands_beside_the_round_rows() {
        let dir = tempdir().expect("temp dir");
        let logging = LoggingConfig {
            enable_structured: true,
            tracing_level: "debug".to_string(),
        };
        let guard = init_logging(&logging, &outputs_in(dir.path()))
            .expect("logging starts")
            .expect("guard returned");
        assert_eq!(guard.telemetry_path, dir.path().join("rows/telemetry.jsonl"));
        assert!(guard.telemetry_path.exists());
    }
}

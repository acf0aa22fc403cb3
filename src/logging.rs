// src/logging.rs

use color_eyre::eyre::Result;
use directories::ProjectDirs;
use lazy_static::lazy_static;
use std::fs::File;
use std::path::PathBuf;
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    self, fmt::writer::BoxMakeWriter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

lazy_static! {
    pub static ref PROJECT_NAME: String = env!("CARGO_CRATE_NAME").to_uppercase();
    pub static ref LOG_ENV: String = format!("{}_LOGLEVEL", PROJECT_NAME.as_str());
    pub static ref LOG_FILE: String = format!("{}.log", env!("CARGO_PKG_NAME"));
}

pub fn project_directory() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "subscout", env!("CARGO_PKG_NAME"))
}

pub fn get_data_dir() -> PathBuf {
    project_directory()
        .map(|dirs| dirs.data_local_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".").join(".data"))
}

/// Filter directive for the log layer: `RUST_LOG` wins over
/// `SUBSCOUT_LOGLEVEL`, and `subscout=info` applies when neither is set.
fn filter_directive(rust_log: Option<String>, app_log: Option<String>) -> String {
    rust_log
        .or(app_log)
        .filter(|directive| !directive.trim().is_empty())
        .unwrap_or_else(|| format!("{}=info", env!("CARGO_CRATE_NAME")))
}

fn open_log_file() -> std::io::Result<(PathBuf, File)> {
    let directory = get_data_dir();
    std::fs::create_dir_all(&directory)?;
    let path = directory.join(LOG_FILE.as_str());
    let file = File::create(&path)?;
    Ok((path, file))
}

/// Installs the global subscriber.
///
/// Stdout carries the JSON report, so log lines go to `<data dir>/subscout.log`.
/// When that file cannot be created the logs go to stderr instead.
pub fn initialize_logging() -> Result<()> {
    let directive = filter_directive(std::env::var("RUST_LOG").ok(), std::env::var(LOG_ENV.as_str()).ok());

    let (writer, destination, fallback_reason) = match open_log_file() {
        Ok((path, file)) => (BoxMakeWriter::new(file), path.display().to_string(), None),
        Err(e) => (BoxMakeWriter::new(std::io::stderr), "stderr".to_string(), Some(e)),
    };

    let log_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_target(false)
        .with_ansi(false)
        .with_filter(EnvFilter::new(&directive));

    tracing_subscriber::registry()
        .with(log_layer)
        .with(ErrorLayer::default())
        .try_init()?;

    if let Some(e) = fallback_reason {
        tracing::warn!(error = %e, data_dir = %get_data_dir().display(), "Log file unavailable, logging to stderr.");
    }
    tracing::debug!(destination = %destination, directive = %directive, "Logging initialized.");
    Ok(())
}

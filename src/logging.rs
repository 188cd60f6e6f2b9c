use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use crate::config::APP_NAME;

/// Overrides the level filter, e.g. `SHEETMERGE_LOG=sheetmerge::merge=trace`
pub const LOG_ENV: &str = "SHEETMERGE_LOG";

pub enum LogTarget {
    Stderr,
    /// Append to a file; used while the TUI owns the terminal.
    File(PathBuf),
}

/// `<cache dir>/sheetmerge/sheetmerge.log`
pub fn default_log_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join(APP_NAME).join("sheetmerge.log"))
}

fn level_filter(debug: bool) -> EnvFilter {
    if let Ok(spec) = std::env::var(LOG_ENV) {
        if let Ok(filter) = EnvFilter::try_new(&spec) {
            return filter;
        }
    }
    let level = if debug { "debug" } else { "warn" };
    EnvFilter::new(format!("sheetmerge={level},sheetmerge_cli={level}"))
}

pub fn init_logging(debug: bool, target: LogTarget) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(level_filter(debug))
        .with_target(false);

    let installed = match target {
        LogTarget::Stderr => builder.with_writer(std::io::stderr).try_init(),
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
    };
    installed.map_err(|e| eyre!("Failed to initialize logging: {}", e))
}

// logging.rs - tracing subscriber setup
//
// Diagnostics only; nothing asserts on log output. The filter comes from
// RUST_LOG and falls back to `info`.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stdout,
    /// Truncate and write plain (uncoloured) timestamped lines to this file.
    File(PathBuf),
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. A second call is a no-op, so tests may
/// call this freely.
pub fn init(target: &LogTarget) -> anyhow::Result<()> {
    let result = match target {
        LogTarget::Stdout => tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_target(false)
            .try_init(),
        LogTarget::File(path) => {
            let file = File::create(path)
                .map_err(|e| anyhow::anyhow!("failed to create log file {}: {}", path.display(), e))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
    };

    if let Err(e) = result {
        tracing::debug!("tracing subscriber already installed: {}", e);
    }
    Ok(())
}

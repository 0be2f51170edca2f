mod changes;
mod config;
pub mod event_db;
pub mod migrations;

pub use changes::{ChangeEvent, ChangeFeed, ChangeKind, Subscription};
pub use config::{Config, PriorityColors, RenderConfig, TimelineConfig};
pub use event_db::EventDb;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the SiteGrid data directory, creating it if needed.
///
/// `SITEGRID_HOME` wins when set. Otherwise `~/.config/sitegrid[-dev]/`,
/// where `SITEGRID_ENV=dev` selects the development directory.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("SITEGRID_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("SITEGRID_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("sitegrid-dev")
            } else {
                base_dir.join("sitegrid")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|source| ConfigError::DataDir {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}

pub use flock_core::config::*;

use anyhow::Context;
use std::path::Path;

/// Reads configuration from a TOML file.
///
/// A missing file yields the defaults; a file that exists but does not
/// parse or validate is an error.
pub fn load_config(path: impl AsRef<Path>) -> anyhow::Result<AppConfig> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::warn!(path = %path.display(), "Config file not found, using defaults");
        return Ok(AppConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    AppConfig::from_toml(&content).with_context(|| format!("Invalid config in {}", path.display()))
}

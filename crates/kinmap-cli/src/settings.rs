//! Layered settings: optional TOML file, then `KINMAP_*` environment
//! variables, then command-line flags.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use kinmap_layout::ForceConfig;
use serde::Deserialize;

const DEFAULT_DB_PATH: &str = "~/.local/share/kinmap/kinmap.db";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  #[serde(default = "default_db_path")]
  pub db_path:  PathBuf,
  /// Where the terminal UI writes its log. Unset means no log.
  #[serde(default)]
  pub log_file: Option<PathBuf>,
  /// Layout tuning from the `[forces]` table. Unset keys keep their defaults.
  #[serde(default)]
  pub forces:   ForceConfig,
}

fn default_db_path() -> PathBuf { PathBuf::from(DEFAULT_DB_PATH) }

impl Settings {
  pub fn load(file: &Path, db_override: Option<&Path>) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(file.to_path_buf()).required(false))
      .add_source(
        config::Environment::with_prefix("KINMAP")
          .prefix_separator("_")
          .separator("__"),
      )
      .set_override_option("db_path", db_override.map(|p| p.to_string_lossy().into_owned()))
      .context("failed to apply --db")?
      .build()
      .with_context(|| format!("failed to read config file {}", file.display()))?;

    let mut settings: Settings = settings
      .try_deserialize()
      .context("failed to deserialise settings")?;
    settings.db_path = expand_tilde(&settings.db_path);
    settings.log_file = settings.log_file.as_deref().map(expand_tilde);
    Ok(settings)
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

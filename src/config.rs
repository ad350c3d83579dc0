use serde::{Deserialize, Serialize};
use std::{
  env,
  fs,
  path::{Path, PathBuf},
};

use crate::error::{Result, TourneyError};
use crate::types::PLAYOFF_FIELD_SIZE;

pub const CONFIG_FILE_NAME: &str = "tourney.json";
pub const ENV_FILE_NAME: &str = ".env";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
  pub data_path: String,
  pub logs_dir: String,
  pub log_filter: String,
  pub playoff_size: usize,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      data_path: "tourney_data.json".to_string(),
      logs_dir: "logs".to_string(),
      log_filter: "info".to_string(),
      playoff_size: PLAYOFF_FIELD_SIZE,
    }
  }
}

impl AppConfig {
  pub fn data_path(&self, base: &Path) -> PathBuf {
    resolve_path(base, &self.data_path)
  }

  pub fn logs_dir(&self, base: &Path) -> PathBuf {
    resolve_path(base, &self.logs_dir)
  }

  fn validate(&self) -> Result<()> {
    if self.playoff_size != PLAYOFF_FIELD_SIZE {
      return Err(TourneyError::validation(format!(
        "playoffSize must be {PLAYOFF_FIELD_SIZE}; the bracket shape is fixed (got {}).",
        self.playoff_size
      )));
    }
    Ok(())
  }
}

pub fn resolve_path(base: &Path, raw: &str) -> PathBuf {
  let path = PathBuf::from(raw.trim());
  if path.is_absolute() {
    path
  } else {
    base.join(path)
  }
}

/// Environment keys read by this crate; anything else in `.env` is ignored.
pub const ENV_KEYS: [&str; 5] = [
  "TOURNEY_CONFIG_PATH",
  "TOURNEY_DATA_PATH",
  "TOURNEY_LOGS_DIR",
  "TOURNEY_LOG",
  "RUST_LOG",
];

fn non_empty(raw: &str) -> Option<String> {
  let value = raw.trim();
  (!value.is_empty()).then(|| value.to_string())
}

pub fn env_default(key: &str) -> Option<String> {
  env::var(key).ok().as_deref().and_then(non_empty)
}

pub fn config_path(base: &Path) -> PathBuf {
  match env_default("TOURNEY_CONFIG_PATH") {
    Some(raw) => resolve_path(base, &raw),
    None => base.join(CONFIG_FILE_NAME),
  }
}

pub fn apply_env_defaults(config: AppConfig) -> AppConfig {
  apply_env_defaults_with(config, env_default)
}

/// Environment fills fields the config file left empty.
pub fn apply_env_defaults_with<F>(mut config: AppConfig, lookup: F) -> AppConfig
where
  F: Fn(&str) -> Option<String>,
{
  if config.data_path.trim().is_empty() {
    if let Some(value) = lookup("TOURNEY_DATA_PATH") {
      config.data_path = value;
    }
  }
  if config.logs_dir.trim().is_empty() {
    if let Some(value) = lookup("TOURNEY_LOGS_DIR") {
      config.logs_dir = value;
    }
  }
  if config.log_filter.trim().is_empty() {
    if let Some(value) = lookup("TOURNEY_LOG") {
      config.log_filter = value;
    }
  }
  let defaults = AppConfig::default();
  if config.data_path.trim().is_empty() {
    config.data_path = defaults.data_path;
  }
  if config.logs_dir.trim().is_empty() {
    config.logs_dir = defaults.logs_dir;
  }
  if config.log_filter.trim().is_empty() {
    config.log_filter = defaults.log_filter;
  }
  config
}

pub fn load_config(path: &Path) -> Result<AppConfig> {
  if !path.is_file() {
    return Ok(apply_env_defaults(AppConfig::default()));
  }
  let data = fs::read_to_string(path)
    .map_err(|e| TourneyError::Storage(format!("read config {}: {e}", path.display())))?;
  let config = serde_json::from_str::<AppConfig>(&data)
    .map_err(|e| TourneyError::Storage(format!("parse config {}: {e}", path.display())))?;
  let config = apply_env_defaults(config);
  config.validate()?;
  Ok(config)
}

pub fn save_config(path: &Path, config: &AppConfig) -> Result<()> {
  let payload = serde_json::to_string_pretty(config)?;
  fs::write(path, payload)
    .map_err(|e| TourneyError::Storage(format!("write config {}: {e}", path.display())))?;
  Ok(())
}

/// Export the recognised `KEY=value` pairs of `base/.env` into the process
/// environment. Variables already set win. Returns the keys applied.
pub fn load_env_file(base: &Path) -> Vec<&'static str> {
  let Ok(contents) = fs::read_to_string(base.join(ENV_FILE_NAME)) else {
    return Vec::new();
  };
  let mut applied = Vec::new();
  for (key, value) in contents.lines().filter_map(parse_env_line) {
    if env::var_os(key).is_none() {
      env::set_var(key, value);
      applied.push(key);
    }
  }
  applied
}

/// One `.env` line as `(known key, value)`. Accepts an `export` prefix,
/// single or double quotes, and a trailing `#` comment on unquoted values.
pub fn parse_env_line(line: &str) -> Option<(&'static str, String)> {
  let line = line.trim();
  if line.starts_with('#') {
    return None;
  }
  let (key, value) = line.strip_prefix("export ").unwrap_or(line).split_once('=')?;
  let key = ENV_KEYS.iter().copied().find(|known| *known == key.trim())?;
  let value = value.trim();
  let unquoted = ['"', '\'']
    .iter()
    .find_map(|q| value.strip_prefix(*q).and_then(|v| v.strip_suffix(*q)));
  let value = match unquoted {
    Some(inner) => inner,
    None => value.split('#').next().unwrap_or_default().trim_end(),
  };
  Some((key, value.to_string()))
}

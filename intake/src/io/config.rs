//! Intake configuration stored in `intake.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default config file name, resolved against the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "intake.toml";

/// Intake configuration (TOML).
///
/// Missing fields fall back to defaults so an empty file is valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IntakeConfig {
    /// Directory holding the local draft file.
    pub draft_dir: PathBuf,

    pub submit: SubmitConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SubmitConfig {
    /// Base URL of the REST backend (e.g. `https://xyz.supabase.co`).
    pub endpoint: Option<String>,

    /// Table receiving one row per submission.
    pub table: String,

    /// Environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            table: "clients".to_string(),
            api_key_env: "SUPABASE_ANON_KEY".to_string(),
        }
    }
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            draft_dir: PathBuf::from(".intake"),
            submit: SubmitConfig::default(),
        }
    }
}

impl IntakeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.draft_dir.as_os_str().is_empty() {
            return Err(anyhow!("draft_dir must not be empty"));
        }
        if self.submit.table.trim().is_empty() {
            return Err(anyhow!("submit.table must not be empty"));
        }
        if self.submit.api_key_env.trim().is_empty() {
            return Err(anyhow!("submit.api_key_env must not be empty"));
        }
        if let Some(endpoint) = &self.submit.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(anyhow!("submit.endpoint must be an http(s) URL"));
            }
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `IntakeConfig::default()`.
pub fn load_config(path: &Path) -> Result<IntakeConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "config missing, using defaults");
        let cfg = IntakeConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: IntakeConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    debug!(path = %path.display(), "config loaded");
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &IntakeConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, IntakeConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("intake.toml");
        let mut cfg = IntakeConfig::default();
        cfg.submit.endpoint = Some("https://example.supabase.co".to_string());
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("intake.toml");
        fs::write(&path, "[submit]\ntable = \"leads\"\n").expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.submit.table, "leads");
        assert_eq!(cfg.submit.api_key_env, "SUPABASE_ANON_KEY");
        assert_eq!(cfg.draft_dir, PathBuf::from(".intake"));
    }

    #[test]
    fn non_http_endpoint_is_rejected() {
        let mut cfg = IntakeConfig::default();
        cfg.submit.endpoint = Some("ftp://example.com".to_string());
        let err = cfg.validate().expect_err("invalid");
        assert!(err.to_string().contains("submit.endpoint"));
    }
}

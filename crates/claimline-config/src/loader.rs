//! Config file discovery, parsing, and validation.

use crate::{ClaimlineConfig, ConfigError};
use directories::BaseDirs;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// Default config filename.
const DEFAULT_CONFIG_FILE: &str = "claimline.json5";
/// Default config directory under the user home.
const DEFAULT_CONFIG_DIR: &str = ".claimline";

/// Resolve the default config path under the user's home directory.
pub fn default_config_path() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| {
        dirs.home_dir()
            .join(DEFAULT_CONFIG_DIR)
            .join(DEFAULT_CONFIG_FILE)
    })
}

/// Load config from the default location, falling back to defaults when
/// no file exists.
pub fn load_config() -> Result<ClaimlineConfig, ConfigError> {
    match default_config_path() {
        Some(path) if path.is_file() => load_config_from_path(&path),
        _ => {
            debug!("no config file found, using defaults");
            Ok(ClaimlineConfig::default())
        }
    }
}

/// Load and validate config from an explicit path.
pub fn load_config_from_path(path: &Path) -> Result<ClaimlineConfig, ConfigError> {
    info!("loading config (path={})", path.display());
    let raw = fs::read_to_string(path)?;
    let config: ClaimlineConfig = json5::from_str(&raw)?;
    validate(&config)?;
    Ok(config)
}

/// Reject configs that would misbehave at runtime.
fn validate(config: &ClaimlineConfig) -> Result<(), ConfigError> {
    if config.chat.max_message_chars == 0 {
        return Err(invalid("chat.max_message_chars", "must be greater than zero"));
    }
    if config.chat.min_document_chars == 0 {
        return Err(invalid("chat.min_document_chars", "must be greater than zero"));
    }
    if config.retrieval.max_citations == 0 {
        return Err(invalid("retrieval.max_citations", "must be greater than zero"));
    }
    if config.referral.max_solicitors == 0 {
        return Err(invalid("referral.max_solicitors", "must be greater than zero"));
    }
    if !(0.0..=2.0).contains(&config.llm.temperature) {
        return Err(invalid("llm.temperature", "must be between 0.0 and 2.0"));
    }
    if config.llm.timeout_secs == 0 {
        return Err(invalid("llm.timeout_secs", "must be greater than zero"));
    }
    if config.llm.base_url.trim().is_empty() {
        return Err(invalid("llm.base_url", "must not be empty"));
    }
    Ok(())
}

fn invalid(path: &str, message: &str) -> ConfigError {
    ConfigError::InvalidField {
        path: path.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::load_config_from_path;
    use crate::ConfigError;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn load_config_parses_json5_with_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("claimline.json5");
        fs::write(
            &path,
            r#"{
                // streaming replies get chatty, keep them short
                chat: { max_message_chars: 500 },
                llm: { model: "gpt-4o-mini" },
            }"#,
        )
        .expect("write");

        let config = load_config_from_path(&path).expect("load");
        assert_eq!(config.chat.max_message_chars, 500);
        assert_eq!(config.chat.history_window, 6);
        assert_eq!(config.llm.model, "gpt-4o-mini".to_string());
        assert_eq!(config.retrieval.max_citations, 5);
        assert_eq!(config.referral.max_solicitors, 3);
    }

    #[test]
    fn load_config_rejects_zero_limits() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("claimline.json5");
        fs::write(&path, r#"{ retrieval: { max_citations: 0 } }"#).expect("write");

        let err = load_config_from_path(&path).expect_err("invalid");
        match err {
            ConfigError::InvalidField { path, .. } => {
                assert_eq!(path, "retrieval.max_citations".to_string())
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn load_config_rejects_out_of_range_temperature() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("claimline.json5");
        fs::write(&path, r#"{ llm: { temperature: 3.5 } }"#).expect("write");

        assert!(load_config_from_path(&path).is_err());
    }
}

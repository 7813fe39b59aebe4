use std::{
    fs,
    path::{Path, PathBuf},
};

use biolock_auth::sensor::PromptSpec;
use color_eyre::Result;
use dirs::config_dir;
use serde::{Deserialize, Serialize};

/// User-level configuration loaded from `<config_dir>/biolock/config.toml`.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Override for the preferences file holding encrypted records.
    pub prefs_path: Option<PathBuf>,
    /// Keyring service label the secret keys are stored under.
    pub keyring_service: Option<String>,
    /// Authentication dialog text (string-resource analog).
    pub prompt: Option<PromptConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct PromptConfig {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub negative_button: Option<String>,
}

/// Load config from the default path; if missing, return defaults.
pub fn load() -> Result<Config> {
    let path = default_path()?;
    load_from_path(path)
}

/// Load config from a given path; if missing or empty, return defaults.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    let cfg: Config = toml::from_str(&contents)?;
    Ok(cfg)
}

/// Resolve the default config path (platform aware).
pub fn default_path() -> Result<PathBuf> {
    let base = config_dir().ok_or_else(|| color_eyre::eyre::eyre!("no config dir available"))?;
    Ok(base.join("biolock").join("config.toml"))
}

/// Write the given config to disk, creating parent directories as needed.
/// Will not clobber an existing file.
pub fn write_default_if_missing(config: &Config) -> Result<PathBuf> {
    let path = default_path()?;
    if path.exists() {
        return Ok(path);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let body = toml::to_string_pretty(config)?;
    fs::write(&path, body)?;
    Ok(path)
}

/// Build the authentication dialog text, falling back to the sample's
/// stock strings where the config is silent.
pub fn prompt_spec(config: &Config) -> PromptSpec {
    let overrides = config.prompt.clone().unwrap_or_default();
    PromptSpec {
        title: overrides.title.unwrap_or_else(|| "Sign in".to_string()),
        subtitle: Some(
            overrides
                .subtitle
                .unwrap_or_else(|| "Biometric for Biolock".to_string()),
        ),
        description: Some(
            overrides
                .description
                .unwrap_or_else(|| "Confirm biometric to continue".to_string()),
        ),
        negative_button: overrides
            .negative_button
            .unwrap_or_else(|| "Use account password".to_string()),
        confirmation_required: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_default_when_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = load_from_path(dir.path().join("config.toml")).expect("load");
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn parses_custom_config() {
        let contents = r#"
            prefs_path = "/tmp/biolock-records.json"
            keyring_service = "biolock-dev"
            [prompt]
            title = "Unlock"
            negative_button = "Never mind"
        "#;
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, contents).expect("write temp config");

        let cfg = load_from_path(&path).expect("load");
        assert_eq!(
            cfg,
            Config {
                prefs_path: Some(PathBuf::from("/tmp/biolock-records.json")),
                keyring_service: Some("biolock-dev".into()),
                prompt: Some(PromptConfig {
                    title: Some("Unlock".into()),
                    subtitle: None,
                    description: None,
                    negative_button: Some("Never mind".into()),
                }),
            }
        );
    }

    #[test]
    fn prompt_overrides_merge_with_stock_strings() {
        let cfg = Config {
            prompt: Some(PromptConfig {
                title: Some("Unlock".into()),
                ..PromptConfig::default()
            }),
            ..Config::default()
        };

        let spec = prompt_spec(&cfg);
        assert_eq!(spec.title, "Unlock");
        assert_eq!(spec.subtitle.as_deref(), Some("Biometric for Biolock"));
        assert!(!spec.confirmation_required);
    }
}

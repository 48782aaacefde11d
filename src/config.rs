use crate::request::{check_max_output_tokens, check_model, check_temperature};
use anyhow::{anyhow, Result};
use dirs::home_dir;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_TEMPERATURE: f64 = 1.2;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1024;

/// Environment variable that points at an alternative config file.
pub const CONFIG_PATH_ENV: &str = "FK_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model: String,
    pub temperature: f64,
    pub max_output_tokens: u32,
    #[serde(deserialize_with = "deserialize_bool_like")]
    pub auto_confirm: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            auto_confirm: false,
        }
    }
}

/// The settable preference keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    Model,
    Temperature,
    MaxOutputTokens,
    AutoConfirm,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 4] = [
        ConfigKey::Model,
        ConfigKey::Temperature,
        ConfigKey::MaxOutputTokens,
        ConfigKey::AutoConfirm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::Model => "model",
            ConfigKey::Temperature => "temperature",
            ConfigKey::MaxOutputTokens => "max_output_tokens",
            ConfigKey::AutoConfirm => "auto_confirm",
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s.trim())
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("unknown config key '{0}' (expected one of: model, temperature, max_output_tokens, auto_confirm)")]
    UnknownKey(String),

    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: ConfigKey, reason: String },
}

/// How [`Config::load_from`] arrived at its result.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    /// No config file; defaults apply.
    Missing,
    Loaded,
    /// The file existed but could not be used; defaults apply.
    Fallback(String),
}

/// Per-invocation values that take precedence over the stored config.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_output_tokens: Option<u32>,
    pub auto_confirm: Option<bool>,
}

/// Parses boolean-like tokens: true/false, yes/no, 1/0, on/off.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Some(true),
        "false" | "no" | "0" | "off" => Some(false),
        _ => None,
    }
}

/// Accepts a TOML boolean, `0`/`1`, or any token `parse_bool` understands,
/// so hand-edited files such as `auto_confirm = "yes"` still load.
fn deserialize_bool_like<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolLike {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    let token = match BoolLike::deserialize(deserializer)? {
        BoolLike::Bool(value) => return Ok(value),
        BoolLike::Int(value) => value.to_string(),
        BoolLike::Text(value) => value,
    };
    parse_bool(&token).ok_or_else(|| {
        de::Error::custom(format!("auto_confirm must be true or false, got '{}'", token))
    })
}

impl Config {
    /// Load configuration from the default location. Never fails: any
    /// problem with the file falls back to defaults.
    pub fn load() -> (Self, LoadStatus) {
        match Self::get_config_path() {
            Ok(path) => Self::load_from(&path),
            Err(e) => {
                warn!("Could not resolve config path, using defaults: {}", e);
                (Self::default(), LoadStatus::Fallback(e.to_string()))
            }
        }
    }

    pub fn load_from(path: &Path) -> (Self, LoadStatus) {
        if !path.exists() {
            info!("No config file at {}, using defaults", path.display());
            return (Self::default(), LoadStatus::Missing);
        }

        match Self::read_file(path) {
            Ok(config) => {
                info!("Loaded config from: {}", path.display());
                (config, LoadStatus::Loaded)
            }
            Err(e) => {
                warn!("Ignoring config file {}: {}", path.display(), e);
                (Self::default(), LoadStatus::Fallback(e.to_string()))
            }
        }
    }

    fn read_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        info!("Saved config to: {}", path.display());
        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            if !path.trim().is_empty() {
                return Ok(PathBuf::from(path));
            }
        }
        let home = home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
        Ok(home.join(".fk").join("config.toml"))
    }

    /// Checks every field against its validator.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_model(&self.model).map_err(|reason| ConfigError::InvalidValue {
            key: ConfigKey::Model,
            reason,
        })?;
        check_temperature(self.temperature).map_err(|reason| ConfigError::InvalidValue {
            key: ConfigKey::Temperature,
            reason,
        })?;
        check_max_output_tokens(self.max_output_tokens).map_err(|reason| {
            ConfigError::InvalidValue {
                key: ConfigKey::MaxOutputTokens,
                reason,
            }
        })?;
        Ok(())
    }

    pub fn get(&self, key: ConfigKey) -> String {
        match key {
            ConfigKey::Model => self.model.clone(),
            ConfigKey::Temperature => self.temperature.to_string(),
            ConfigKey::MaxOutputTokens => self.max_output_tokens.to_string(),
            ConfigKey::AutoConfirm => self.auto_confirm.to_string(),
        }
    }

    pub fn entries(&self) -> Vec<(ConfigKey, String)> {
        ConfigKey::ALL.into_iter().map(|key| (key, self.get(key))).collect()
    }

    /// Validates `value` for `key` and applies it. On error nothing changes.
    pub fn set(&mut self, key: &str, value: &str) -> Result<ConfigKey, ConfigError> {
        let key: ConfigKey = key.parse()?;
        let invalid = |reason: String| ConfigError::InvalidValue { key, reason };

        match key {
            ConfigKey::Model => {
                self.model = check_model(value).map_err(invalid)?;
            }
            ConfigKey::Temperature => {
                let parsed: f64 = value
                    .trim()
                    .parse()
                    .map_err(|_| invalid(format!("'{}' is not a number", value)))?;
                self.temperature = check_temperature(parsed).map_err(invalid)?;
            }
            ConfigKey::MaxOutputTokens => {
                let parsed: u32 = value
                    .trim()
                    .parse()
                    .map_err(|_| invalid(format!("'{}' is not a positive integer", value)))?;
                self.max_output_tokens = check_max_output_tokens(parsed).map_err(invalid)?;
            }
            ConfigKey::AutoConfirm => {
                self.auto_confirm = parse_bool(value).ok_or_else(|| {
                    invalid(format!(
                        "'{}' is not a boolean (use true/false, yes/no, 1/0, on/off)",
                        value
                    ))
                })?;
            }
        }

        debug!("Config key {} set to {}", key, self.get(key));
        Ok(key)
    }

    /// Returns a copy of this config with every present override applied.
    pub fn merged(&self, overrides: &Overrides) -> Config {
        Config {
            model: overrides.model.clone().unwrap_or_else(|| self.model.clone()),
            temperature: overrides.temperature.unwrap_or(self.temperature),
            max_output_tokens: overrides.max_output_tokens.unwrap_or(self.max_output_tokens),
            auto_confirm: overrides.auto_confirm.unwrap_or(self.auto_confirm),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.temperature, 1.2);
        assert_eq!(config.max_output_tokens, 1024);
        assert!(!config.auto_confirm);
    }

    #[test]
    fn test_set_temperature_out_of_range_keeps_previous_value() {
        let mut config = Config::default();
        let err = config.set("temperature", "3.5").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { key: ConfigKey::Temperature, .. }
        ));
        assert!(err.to_string().contains("between 0 and 2"));
        assert_eq!(config.temperature, 1.2);
    }

    #[test]
    fn test_set_temperature_zero() {
        let mut config = Config::default();
        config.set("temperature", "0").unwrap();
        assert_eq!(config.temperature, 0.0);
    }

    #[test]
    fn test_set_temperature_rejects_non_numbers() {
        let mut config = Config::default();
        assert!(config.set("temperature", "warm").is_err());
        assert!(config.set("temperature", "inf").is_err());
        assert!(config.set("temperature", "NaN").is_err());
        assert_eq!(config.temperature, 1.2);
    }

    #[test]
    fn test_set_auto_confirm_accepts_boolean_like_tokens() {
        let mut config = Config::default();
        config.set("auto_confirm", "YES").unwrap();
        assert!(config.auto_confirm);
        config.set("auto_confirm", "off").unwrap();
        assert!(!config.auto_confirm);
        config.set("auto_confirm", "1").unwrap();
        assert!(config.auto_confirm);
    }

    #[test]
    fn test_set_auto_confirm_rejects_maybe() {
        let mut config = Config::default();
        let err = config.set("auto_confirm", "maybe").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { key: ConfigKey::AutoConfirm, .. }
        ));
        assert!(!config.auto_confirm);
    }

    #[test]
    fn test_set_max_output_tokens_bounds() {
        let mut config = Config::default();
        config.set("max_output_tokens", "8192").unwrap();
        assert_eq!(config.max_output_tokens, 8192);
        assert!(config.set("max_output_tokens", "0").is_err());
        assert!(config.set("max_output_tokens", "8193").is_err());
        assert!(config.set("max_output_tokens", "-5").is_err());
        assert!(config.set("max_output_tokens", "12.5").is_err());
        assert_eq!(config.max_output_tokens, 8192);
    }

    #[test]
    fn test_set_model_trims_and_rejects_empty() {
        let mut config = Config::default();
        config.set("model", "  gemini-2.5-pro  ").unwrap();
        assert_eq!(config.model, "gemini-2.5-pro");
        assert!(config.set("model", "   ").is_err());
        assert_eq!(config.model, "gemini-2.5-pro");
    }

    #[test]
    fn test_set_unknown_key() {
        let mut config = Config::default();
        let err = config.set("api_key", "secret").unwrap_err();
        assert_eq!(err, ConfigError::UnknownKey("api_key".to_string()));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_entries_lists_every_key_in_order() {
        let keys: Vec<&str> = Config::default()
            .entries()
            .into_iter()
            .map(|(key, _)| key.as_str())
            .collect();
        assert_eq!(keys, ["model", "temperature", "max_output_tokens", "auto_confirm"]);
    }

    #[test]
    fn test_merged_prefers_overrides() {
        let config = Config::default();
        let overrides = Overrides {
            model: Some("gemini-2.5-pro".to_string()),
            temperature: Some(0.2),
            max_output_tokens: None,
            auto_confirm: Some(true),
        };
        let merged = config.merged(&overrides);
        assert_eq!(merged.model, "gemini-2.5-pro");
        assert_eq!(merged.temperature, 0.2);
        assert_eq!(merged.max_output_tokens, 1024);
        assert!(merged.auto_confirm);
    }

    #[test]
    fn test_merged_without_overrides_is_identity() {
        let mut config = Config::default();
        config.auto_confirm = true;
        assert_eq!(config.merged(&Overrides::default()), config);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let (config, status) = Config::load_from(&dir.path().join("config.toml"));
        assert_eq!(config, Config::default());
        assert_eq!(status, LoadStatus::Missing);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.set("temperature", "0").unwrap();
        config.set("auto_confirm", "true").unwrap();
        config.save_to(&path).unwrap();

        let (loaded, status) = Config::load_from(&path);
        assert_eq!(status, LoadStatus::Loaded);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "auto_confirm = true\n").unwrap();

        let (config, status) = Config::load_from(&path);
        assert_eq!(status, LoadStatus::Loaded);
        assert!(config.auto_confirm);
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_load_corrupt_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "this is = = not toml [").unwrap();

        let (config, status) = Config::load_from(&path);
        assert_eq!(config, Config::default());
        assert!(matches!(status, LoadStatus::Fallback(_)));
    }

    #[test]
    fn test_load_out_of_range_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "temperature = 9.0\n").unwrap();

        let (config, status) = Config::load_from(&path);
        assert_eq!(config, Config::default());
        match status {
            LoadStatus::Fallback(reason) => assert!(reason.contains("temperature")),
            other => panic!("expected fallback, got {:?}", other),
        }
    }

    #[test]
    fn test_load_accepts_boolean_like_auto_confirm() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        for (content, expected) in [
            ("auto_confirm = \"yes\"\n", true),
            ("auto_confirm = \"Off\"\n", false),
            ("auto_confirm = 1\n", true),
            ("auto_confirm = true\n", true),
        ] {
            fs::write(&path, content).unwrap();
            let (config, status) = Config::load_from(&path);
            assert_eq!(status, LoadStatus::Loaded, "{}", content);
            assert_eq!(config.auto_confirm, expected, "{}", content);
        }
    }

    #[test]
    fn test_load_unknown_auto_confirm_token_falls_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "model = \"gemini-pro\"\nauto_confirm = \"maybe\"\n").unwrap();

        let (config, status) = Config::load_from(&path);
        assert_eq!(config, Config::default());
        match status {
            LoadStatus::Fallback(reason) => assert!(reason.contains("auto_confirm")),
            other => panic!("expected fallback, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_bool_tokens() {
        assert_eq!(parse_bool("True"), Some(true));
        assert_eq!(parse_bool(" no "), Some(false));
        assert_eq!(parse_bool("ON"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }
}

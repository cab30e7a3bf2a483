//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/outliner/outliner.toml`
//! 3. Local config: `<dir>/.outliner.toml`
//! 4. Environment variables: `OUTLINER_*` prefix, `__` between sections
//!    (e.g. `OUTLINER_CODEC__STRICTNESS=lenient`)

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::domain::{CodecStrictness, DescribeOptions, Locale};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("config error: {message}")]
    Config { message: String },
}

/// Interchange codec settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct CodecSettings {
    /// Handling of property values without a primitive form
    pub strictness: CodecStrictness,
}

/// Settings for human-readable node descriptions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DescribeSettings {
    /// Spaces per indent level
    pub indent_width: usize,
    pub locale: Locale,
}

impl Default for DescribeSettings {
    fn default() -> Self {
        Self {
            indent_width: 4,
            locale: Locale::default(),
        }
    }
}

/// Raw locale for intermediate parsing (None means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawLocale {
    pub decimal_separator: Option<String>,
    pub date_format: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawDescribeSettings {
    pub indent_width: Option<usize>,
    pub locale: RawLocale,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawCodecSettings {
    pub strictness: Option<CodecStrictness>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub codec: RawCodecSettings,
    pub describe: RawDescribeSettings,
}

/// Unified configuration for outliner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Settings {
    pub codec: CodecSettings,
    pub describe: DescribeSettings,
}

/// Get the XDG config directory for outliner.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "outliner").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("outliner.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".outliner.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, SettingsError> {
    let content = std::fs::read_to_string(path).map_err(|e| SettingsError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| SettingsError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        let locale = &overlay.describe.locale;
        Self {
            codec: CodecSettings {
                strictness: overlay.codec.strictness.unwrap_or(self.codec.strictness),
            },
            describe: DescribeSettings {
                indent_width: overlay
                    .describe
                    .indent_width
                    .unwrap_or(self.describe.indent_width),
                locale: Locale {
                    decimal_separator: locale
                        .decimal_separator
                        .clone()
                        .unwrap_or_else(|| self.describe.locale.decimal_separator.clone()),
                    date_format: locale
                        .date_format
                        .clone()
                        .unwrap_or_else(|| self.describe.locale.date_format.clone()),
                },
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a `.outliner.toml`
    pub fn load(local_dir: Option<&Path>) -> Result<Self, SettingsError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!("loading global config {}", global_path.display());
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        // 3. Local config
        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                debug!("loading local config {}", local_path.display());
                current = current.merge_with(&load_raw_settings(&local_path)?);
            }
        }

        // 4. Environment variables (explicit override)
        Self::apply_env_overrides(current)
    }

    /// Apply OUTLINER_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, SettingsError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("OUTLINER")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("codec.strictness") {
            settings.codec.strictness = parse_strictness(&val)?;
        }
        if let Ok(val) = config.get_string("describe.indent_width") {
            settings.describe.indent_width = val.parse().map_err(|e| SettingsError::Config {
                message: format!("describe.indent_width '{}': {}", val, e),
            })?;
        }
        if let Ok(val) = config.get_string("describe.locale.decimal_separator") {
            settings.describe.locale.decimal_separator = val;
        }
        if let Ok(val) = config.get_string("describe.locale.date_format") {
            settings.describe.locale.date_format = val;
        }

        Ok(settings)
    }

    /// Describe options matching these settings.
    pub fn describe_options(&self) -> DescribeOptions {
        DescribeOptions {
            locale: Some(self.describe.locale.clone()),
            indent_width: self.describe.indent_width,
            ..DescribeOptions::default()
        }
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, SettingsError> {
        toml::to_string_pretty(self).map_err(|e| SettingsError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# outliner configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/outliner/outliner.toml
#   Local:  <dir>/.outliner.toml
#   Env:    OUTLINER_* environment variables, e.g. OUTLINER_CODEC__STRICTNESS

[codec]
# "strict" fails on property values without a primitive form (timestamps,
# NaN); "lenient" leaves them out of the interchange form
# strictness = "strict"

[describe]
# Spaces per indent level
# indent_width = 4

[describe.locale]
# decimal_separator = "."
# date_format = "%Y-%m-%d %H:%M:%S"
"#
        .to_string()
    }
}

fn parse_strictness(value: &str) -> Result<CodecStrictness, SettingsError> {
    match value.to_ascii_lowercase().as_str() {
        "strict" => Ok(CodecStrictness::Strict),
        "lenient" => Ok(CodecStrictness::Lenient),
        other => Err(SettingsError::Config {
            message: format!("codec.strictness must be 'strict' or 'lenient', got '{}'", other),
        }),
    }
}

fn config_err(e: ConfigError) -> SettingsError {
    SettingsError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_no_overlay_values_when_merging_then_keeps_base() {
        let base = Settings::default();
        let merged = base.merge_with(&RawSettings::default());
        assert_eq!(merged, base);
    }

    #[test]
    fn given_partial_locale_overlay_when_merging_then_only_specified_fields_change() {
        let overlay: RawSettings = toml::from_str(
            r#"
[describe.locale]
decimal_separator = ","
"#,
        )
        .unwrap();
        let merged = Settings::default().merge_with(&overlay);
        assert_eq!(merged.describe.locale.decimal_separator, ",");
        assert_eq!(merged.describe.locale.date_format, "%Y-%m-%d %H:%M:%S");
        assert_eq!(merged.describe.indent_width, 4);
    }

    #[test]
    fn given_strictness_strings_when_parsing_then_accepts_known_values() {
        assert_eq!(parse_strictness("Lenient").unwrap(), CodecStrictness::Lenient);
        assert_eq!(parse_strictness("strict").unwrap(), CodecStrictness::Strict);
        assert!(parse_strictness("loose").is_err());
    }

    // only test in this binary touching OUTLINER_* variables
    #[test]
    fn given_env_vars_when_applying_overrides_then_env_wins() {
        std::env::set_var("OUTLINER_CODEC__STRICTNESS", "lenient");
        std::env::set_var("OUTLINER_DESCRIBE__INDENT_WIDTH", "2");
        std::env::set_var("OUTLINER_DESCRIBE__LOCALE__DECIMAL_SEPARATOR", ",");

        let result = Settings::apply_env_overrides(Settings::default());

        std::env::remove_var("OUTLINER_CODEC__STRICTNESS");
        std::env::remove_var("OUTLINER_DESCRIBE__INDENT_WIDTH");
        std::env::remove_var("OUTLINER_DESCRIBE__LOCALE__DECIMAL_SEPARATOR");

        let settings = result.unwrap();
        assert_eq!(settings.codec.strictness, CodecStrictness::Lenient);
        assert_eq!(settings.describe.indent_width, 2);
        assert_eq!(settings.describe.locale.decimal_separator, ",");
        assert_eq!(settings.describe.locale.date_format, "%Y-%m-%d %H:%M:%S");
    }

    #[test]
    fn given_template_when_parsed_then_yields_defaults() {
        let raw: RawSettings = toml::from_str(&Settings::template()).unwrap();
        assert_eq!(Settings::default().merge_with(&raw), Settings::default());
    }

    #[test]
    fn given_settings_when_serialized_then_round_trips_through_toml() {
        let settings = Settings::default();
        let toml = settings.to_toml().unwrap();
        let parsed: Settings = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, settings);
    }
}

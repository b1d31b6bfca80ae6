//! Settings structures and loading.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::DEFAULT_LABEL_BUNDLES;

/// Error type for settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Where generated design files land.
    pub output: OutputSettings,

    /// Display-label resolution.
    pub labels: LabelSettings,

    /// Forbidden-content scanning.
    pub security: SecuritySettings,
}

/// Output location for generated design artifacts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Directory for generated design files (supports ${ENV_VAR}).
    pub path: String,

    /// Design file extension, without the dot.
    pub extension: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            path: "runtime/reports".to_string(),
            extension: "rptdesign".to_string(),
        }
    }
}

impl OutputSettings {
    /// The output directory with environment variables expanded.
    pub fn resolved_path(&self) -> Result<PathBuf, SettingsError> {
        Ok(PathBuf::from(expand_env_vars(&self.path)?))
    }
}

/// Label bundle search order for field title resolution.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LabelSettings {
    pub bundles: Vec<String>,
}

impl Default for LabelSettings {
    fn default() -> Self {
        Self {
            bundles: DEFAULT_LABEL_BUNDLES.iter().map(|b| b.to_string()).collect(),
        }
    }
}

/// Markers that abort form override and design upload when present.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecuritySettings {
    pub forbidden_markers: Vec<String>,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            forbidden_markers: vec![
                "${groovy".to_string(),
                "${bsh".to_string(),
                "javascript:".to_string(),
            ],
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `REPORTSMITH_CONFIG`
    /// 2. `./reportsmith.toml`
    /// 3. Built-in defaults
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("REPORTSMITH_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("reportsmith.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        Ok(Settings::default())
    }
}

/// Expand `${VAR}` and `$VAR` references against the process environment.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' {
            if chars.peek() == Some(&'{') {
                chars.next();
                let mut var_name = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch == '}' {
                        chars.next();
                        break;
                    }
                    var_name.push(ch);
                    chars.next();
                }
                let value = env::var(&var_name)
                    .map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
                result.push_str(&value);
            } else {
                let mut var_name = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_alphanumeric() || ch == '_' {
                        var_name.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if var_name.is_empty() {
                    // Lone $, keep it.
                    result.push('$');
                } else {
                    let value = env::var(&var_name)
                        .map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
                    result.push_str(&value);
                }
            }
        } else {
            result.push(c);
        }
    }

    Ok(result)
}

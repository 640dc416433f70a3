//! Configuration management for Tether.
//!
//! Parses `tether.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! ```toml
//! [lifecycle]
//! isolate_callbacks = true
//! observe_all_attributes = false
//! extra_attributes = ["aria-expanded"]
//! ```
//!
//! Every field is optional; an empty file yields [`TetherConfig::default`].

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "tether.toml";

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TetherConfig {
    /// Lifecycle manager configuration.
    pub lifecycle: LifecycleConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Lifecycle manager configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Catch panics raised by directive factories and callbacks so one
    /// misbehaving directive cannot abort a mutation batch.
    pub isolate_callbacks: bool,
    /// Ignore the attribute names extracted from the selector and observe
    /// every attribute change.
    pub observe_all_attributes: bool,
    /// Attribute names observed in addition to the extracted watch-list.
    ///
    /// Useful when directives react to attributes their selector does not
    /// mention. Has no effect when the watch-list is empty, since every
    /// attribute is observed then.
    pub extra_attributes: Vec<String>,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            isolate_callbacks: true,
            observe_all_attributes: false,
            extra_attributes: Vec::new(),
        }
    }
}

impl LifecycleConfig {
    /// Validate lifecycle configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if an extra attribute name is empty
    /// or contains characters that cannot appear in attribute names.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for name in &self.extra_attributes {
            require_attribute_name(name, "lifecycle.extra_attributes")?;
        }
        Ok(())
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

/// Require an attribute name to be non-empty and free of separators.
fn require_attribute_name(name: &str, field: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::Validation(format!(
            "{field} cannot contain empty names"
        )));
    }
    if name
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '>' | '/' | '=' | '[' | ']'))
    {
        return Err(ConfigError::Validation(format!(
            "{field}: {name:?} is not a valid attribute name"
        )));
    }
    Ok(())
}

impl TetherConfig {
    /// Load configuration from file.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `tether.toml` in current directory and parents,
    /// falling back to defaults when none is found.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails or
    /// validation fails.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            return Self::load_from_file(path);
        }

        let discovered = std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::discover_config(&cwd));
        match discovered {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Parse configuration from a TOML string and validate it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed TOML and
    /// `ConfigError::Validation` for invalid values.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Search for config file in `start` and its parents.
    fn discover_config(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;
        config.config_path = Some(path.to_path_buf());
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.lifecycle.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = TetherConfig::default();
        assert!(config.lifecycle.isolate_callbacks);
        assert!(!config.lifecycle.observe_all_attributes);
        assert!(config.lifecycle.extra_attributes.is_empty());
        assert_eq!(config.config_path, None);
    }

    #[test]
    fn test_parse_minimal_config() {
        let config = TetherConfig::from_toml_str("").unwrap();
        assert_eq!(config.lifecycle, LifecycleConfig::default());
    }

    #[test]
    fn test_parse_lifecycle_config() {
        let toml = r#"
[lifecycle]
isolate_callbacks = false
observe_all_attributes = true
extra_attributes = ["aria-expanded", "data-state"]
"#;
        let config = TetherConfig::from_toml_str(toml).unwrap();
        assert_eq!(
            config.lifecycle,
            LifecycleConfig {
                isolate_callbacks: false,
                observe_all_attributes: true,
                extra_attributes: vec!["aria-expanded".to_owned(), "data-state".to_owned()],
            }
        );
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let toml = r#"
[lifecycle]
extra_attributes = ["hidden"]
"#;
        let config = TetherConfig::from_toml_str(toml).unwrap();
        assert!(config.lifecycle.isolate_callbacks);
        assert_eq!(config.lifecycle.extra_attributes, vec!["hidden".to_owned()]);
    }

    #[test]
    fn test_invalid_extra_attribute_rejected() {
        let toml = r#"
[lifecycle]
extra_attributes = ["ok", "not ok"]
"#;
        let err = TetherConfig::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("not ok"));

        let toml = r#"
[lifecycle]
extra_attributes = [""]
"#;
        assert!(matches!(
            TetherConfig::from_toml_str(toml),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_parse_error() {
        let err = TetherConfig::from_toml_str("[lifecycle\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        let err = TetherConfig::from_toml_str("[lifecycle]\nisolate_callbacks = \"yes\"\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[lifecycle]\nobserve_all_attributes = true\n").unwrap();

        let config = TetherConfig::load(Some(&path)).unwrap();
        assert!(config.lifecycle.observe_all_attributes);
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");

        let err = TetherConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(p) if p == path));
    }

    #[test]
    fn test_discover_config_in_parent() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "").unwrap();

        assert_eq!(
            TetherConfig::discover_config(&nested),
            Some(dir.path().join(CONFIG_FILENAME))
        );
    }

    #[test]
    fn test_discover_config_prefers_nearest() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("project");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "").unwrap();
        std::fs::write(nested.join(CONFIG_FILENAME), "").unwrap();

        assert_eq!(
            TetherConfig::discover_config(&nested),
            Some(nested.join(CONFIG_FILENAME))
        );
    }
}

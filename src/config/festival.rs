//! Festival configuration loading from festival.toml
//!
//! The file lists the booths to register on startup and whether their plaintext
//! passwords are kept for the operators' booth list.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire festival.toml file
#[derive(Debug, Deserialize)]
pub struct FestivalConfig {
    /// Keep a display-only plaintext copy of booth passwords
    #[serde(default)]
    pub retain_display_passwords: bool,
    /// Booths to seed
    #[serde(default)]
    pub booths: Vec<BoothConfig>,
}

/// Configuration for a single booth
#[derive(Debug, Deserialize, Clone)]
pub struct BoothConfig {
    /// `<grade>-<classroom>` id
    pub id: String,
    /// Display name
    pub name: String,
    /// Initial login password
    pub password: String,
}

/// Loads the festival configuration from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read or is not valid TOML for
/// [`FestivalConfig`].
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FestivalConfig> {
    let path = path.as_ref();
    tracing::debug!("Loading festival configuration from {}", path.display());
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path.display()),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path.display()),
    })
}

/// Loads the configuration named by `FESTIVAL_CONFIG`, or `./festival.toml`
pub fn load_default_config() -> Result<FestivalConfig> {
    let path = std::env::var("FESTIVAL_CONFIG").unwrap_or_else(|_| "festival.toml".to_string());
    load_config(path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_festival_config() {
        let toml_str = r#"
            retain_display_passwords = true

            [[booths]]
            id = "2-3"
            name = "Haunted House"
            password = "pumpkin"

            [[booths]]
            id = "1-1"
            name = "Tea Room"
            password = "oolong"
        "#;

        let config: FestivalConfig = toml::from_str(toml_str).unwrap();
        assert!(config.retain_display_passwords);
        assert_eq!(config.booths.len(), 2);
        assert_eq!(config.booths[0].id, "2-3");
        assert_eq!(config.booths[1].name, "Tea Room");
    }

    #[test]
    fn test_defaults_when_empty() {
        let config: FestivalConfig = toml::from_str("").unwrap();
        assert!(!config.retain_display_passwords);
        assert!(config.booths.is_empty());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = load_config("does/not/exist.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}

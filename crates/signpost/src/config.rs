//! Service configuration, loaded from a JSON file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

/// Directory service configuration.
///
/// Every field has a default so a partial config file works.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DirectoryConfig {
    /// Domain this authority registers names under.
    pub registration_domain: String,

    /// Sandbox instances skip rate limiting entirely.
    pub sandbox: bool,

    /// Refuse requests that arrive over an insecure transport.
    pub secure_mode: bool,

    /// Path of the hex-encoded 32-byte authority seed.
    pub key_file: PathBuf,

    /// Path of the SQLite database.
    pub database_file: PathBuf,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            registration_domain: "signpost.invalid".to_string(),
            sandbox: false,
            secure_mode: true,
            key_file: PathBuf::from("authority.key"),
            database_file: PathBuf::from("directory.db"),
        }
    }
}

impl DirectoryConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_config_gets_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"registration_domain": "example.net", "sandbox": true}}"#).unwrap();

        let config = DirectoryConfig::load(file.path()).unwrap();
        assert_eq!(config.registration_domain, "example.net");
        assert!(config.sandbox);
        assert!(config.secure_mode);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"registration_doman": "typo.net"}}"#).unwrap();
        assert!(DirectoryConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(DirectoryConfig::load("/nonexistent/config.json").is_err());
    }
}

//! Runtime configuration for the interactive shell

use crate::error::Result;
use crate::protocol::VERBS;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Shell configuration.
///
/// Every field is optional in a config file; missing fields take the
/// [`Default`] value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Line printed after each processed batch
    pub prompt: String,
    /// Print the usage text when input ends
    pub usage_on_exit: bool,
    /// `tracing` filter used when `REFVAULT_LOG` is unset
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompt: format!("Another Command?: {}", VERBS.join(",")),
            usage_on_exit: true,
            log_filter: "refvault=warn".to_string(),
        }
    }
}

impl Config {
    /// Load a JSON config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config = serde_json::from_str(&contents)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RefVaultError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_prompt_lists_verbs() {
        let config = Config::default();
        assert_eq!(
            config.prompt,
            "Another Command?: PUT,DELETE,PUTREF,GET,GETREF,QUIT"
        );
        assert!(config.usage_on_exit);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "usage_on_exit": false }}"#).unwrap();

        let config = Config::from_file(file.path()).unwrap();

        assert!(!config.usage_on_exit);
        assert_eq!(config.prompt, Config::default().prompt);
        assert_eq!(config.log_filter, "refvault=warn");
    }

    #[test]
    fn test_full_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "prompt": "> ", "usage_on_exit": true, "log_filter": "refvault=debug" }}"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();

        assert_eq!(config.prompt, "> ");
        assert_eq!(config.log_filter, "refvault=debug");
    }

    #[test]
    fn test_invalid_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, RefVaultError::Config(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file("/nonexistent/refvault.json").unwrap_err();
        assert!(matches!(err, RefVaultError::Io(_)));
    }
}

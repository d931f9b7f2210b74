//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors reading or checking `pagewatch.toml`
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("pagewatch.toml is not valid: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid pagewatch config: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_config_error_display() {
        let io_err = ConfigError::Io(
            PathBuf::from("pagewatch.toml"),
            Error::new(ErrorKind::PermissionDenied, "denied"),
        );
        let display = format!("{io_err}");
        assert!(display.contains("could not read"));
        assert!(display.contains("pagewatch.toml"));

        let validation_err = ConfigError::Validation("[watch] max_depth must be at least 1".into());
        assert!(format!("{validation_err}").contains("max_depth"));
    }

    #[test]
    fn test_toml_error_names_the_file_and_cause() {
        let err = toml::from_str::<crate::config::SiteConfig>("[watch]\nmax_depth = \"deep\"\n")
            .map_err(ConfigError::from)
            .unwrap_err();
        let display = err.to_string();
        assert!(display.starts_with("pagewatch.toml is not valid"));
        assert!(display.contains("max_depth"));
    }
}

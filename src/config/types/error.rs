//! Configuration and build error types.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// ConfigError
// ============================================================================

/// Failures while reading or parsing a config layer.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{}`", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse `{}`", .0.display())]
    Toml(PathBuf, #[source] toml::de::Error),

    #[error("failed to parse `{}`", .0.display())]
    Json(PathBuf, #[source] serde_json::Error),

    #[error("`{}` must contain a table at the top level", .0.display())]
    NotATable(PathBuf),
}

// ============================================================================
// BuildError
// ============================================================================

/// Failures surfaced when the host finalizes a build.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("One or more pages contain dead links.")]
    DeadLinks,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_config_error_display() {
        let io_err = ConfigError::Io(
            PathBuf::from("site.config.toml"),
            Error::new(ErrorKind::NotFound, "file not found"),
        );
        let display = format!("{io_err}");
        assert!(display.contains("IO error"));
        assert!(display.contains("site.config.toml"));
    }

    #[test]
    fn test_dead_links_message() {
        assert_eq!(
            BuildError::DeadLinks.to_string(),
            "One or more pages contain dead links."
        );
    }
}

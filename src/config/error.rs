//! Configuration error types.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading `sitevars.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read sitevars config `{}`", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("invalid sitevars config `{}`{}: {message}", .path.display(), at_line(.line))]
    Toml {
        path: PathBuf,
        /// 1-based line of the offending TOML, when known
        line: Option<usize>,
        message: String,
    },

    #[error("invalid sitevars config: {0}")]
    Validation(String),
}

impl ConfigError {
    /// Wrap a TOML error for `content` read from `path`.
    pub fn toml(path: &Path, content: &str, err: &toml::de::Error) -> Self {
        let line = err.span().map(|span| {
            let end = span.start.min(content.len());
            content.as_bytes()[..end].iter().filter(|b| **b == b'\n').count() + 1
        });
        Self::Toml {
            path: path.to_path_buf(),
            line,
            message: err.message().trim().to_owned(),
        }
    }
}

fn at_line(line: &Option<usize>) -> String {
    line.map(|line| format!(" at line {line}")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_config_error_display() {
        let io_err = ConfigError::Io(
            PathBuf::from("sitevars.toml"),
            Error::new(ErrorKind::NotFound, "file not found"),
        );
        assert_eq!(
            io_err.to_string(),
            "cannot read sitevars config `sitevars.toml`"
        );

        let validation_err = ConfigError::Validation("[site.origin] is empty".to_string());
        assert_eq!(
            validation_err.to_string(),
            "invalid sitevars config: [site.origin] is empty"
        );
    }

    #[test]
    fn test_toml_error_names_path_and_line() {
        let content = "[site]\norigin = \"https://example.com\"\nport = \n";
        let err = toml::from_str::<toml::Table>(content).unwrap_err();
        let err = ConfigError::toml(Path::new("site/sitevars.toml"), content, &err);

        let display = err.to_string();
        assert!(
            display.starts_with("invalid sitevars config `site/sitevars.toml` at line 3: "),
            "{display}"
        );
        assert!(matches!(err, ConfigError::Toml { line: Some(3), .. }));
    }
}

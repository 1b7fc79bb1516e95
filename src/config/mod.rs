//! Configuration management for `sitevars.toml`.
//!
//! # Sections
//!
//! | Section    | Purpose                                          |
//! |------------|--------------------------------------------------|
//! | `[site]`   | Built site directory and public origin           |
//! | `[fetch]`  | Variables / JSON-LD document locations           |
//! | `[facts]`  | Page and system fact toggles                     |
//! | `[page]`   | JSON-LD role, byline, editorial meta cleanup     |
//! | `[serve]`  | Preview server (interface, port)                 |
//!
//! Every section is optional; a missing config file means all defaults.
//!
//! # Example
//!
//! ```toml
//! [site]
//! root = "public"
//! origin = "https://example.com"
//!
//! [fetch]
//! mode = "local"
//!
//! [facts]
//! words_per_minute = 200
//!
//! [page]
//! default_role = "owner"
//! ```

pub mod defaults;
mod error;
mod facts;
mod fetch;
mod page;
mod serve;
mod site;

pub use error::ConfigError;
pub use facts::FactsSection;
pub use fetch::{FetchMode, FetchSection};
pub use page::PageSection;
pub use serve::ServeConfig;
pub use site::SiteSection;

use crate::cli::{Cli, Commands};
use anyhow::{Result, bail};
use chrono_tz::Tz;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use url::Url;

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing sitevars.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Site directory and origin
    #[serde(default)]
    pub site: SiteSection,

    /// Document locations
    #[serde(default)]
    pub fetch: FetchSection,

    /// Fact toggles
    #[serde(default)]
    pub facts: FactsSection,

    /// Page rewriting settings
    #[serde(default)]
    pub page: PageSection,

    /// Preview server settings
    #[serde(default)]
    pub serve: ServeConfig,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str, path: &Path) -> Result<Self> {
        let config: SiteConfig =
            toml::from_str(content).map_err(|err| ConfigError::toml(path, content, &err))?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content, path)
    }

    /// Load config for the given CLI invocation.
    ///
    /// A missing config file is not an error: every section has defaults.
    pub fn load(cli: &Cli) -> Result<Self> {
        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        let config_path = root.join(&cli.config);

        let mut config = if config_path.exists() {
            Self::from_path(&config_path)?
        } else {
            Self::default()
        };
        config.config_path = Self::normalize_path(&config_path);
        config.update_with_cli(cli, root);
        config.validate()?;
        Ok(config)
    }

    /// Parsed site origin.
    ///
    /// Only valid after [`SiteConfig::validate`] succeeded.
    pub fn origin(&self) -> Result<Url> {
        Ok(Url::parse(&self.site.origin)?)
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli, root: &Path) {
        Self::update_option(&mut self.site.root, cli.site.as_ref());
        Self::update_option(&mut self.site.origin, cli.origin.as_ref());
        Self::update_option(&mut self.fetch.mode, cli.mode.as_ref());

        self.site.root = Self::normalize_path(&root.join(&self.site.root));

        if let Commands::Serve { interface, port } = &cli.command {
            Self::update_option(&mut self.serve.interface, interface.as_ref());
            Self::update_option(&mut self.serve.port, port.as_ref());
        }
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            // For non-existent paths, manually make them absolute
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let origin = match Url::parse(&self.site.origin) {
            Ok(origin) => origin,
            Err(err) => bail!(ConfigError::Validation(format!(
                "[site.origin] is not an absolute URL: {err}"
            ))),
        };
        if !matches!(origin.scheme(), "http" | "https") {
            bail!(ConfigError::Validation(
                "[site.origin] must start with http:// or https://".into()
            ));
        }

        if let Some(zone) = &self.facts.timezone
            && zone.parse::<Tz>().is_err()
        {
            bail!(ConfigError::Validation(format!(
                "[facts.timezone] `{zone}` is not an IANA timezone name"
            )));
        }

        if self.facts.words_per_minute == 0 {
            bail!(ConfigError::Validation(
                "[facts.words_per_minute] must be greater than 0".into()
            ));
        }

        for (field, path) in [
            ("[fetch.variables]", &self.fetch.variables),
            ("[fetch.json_ld_dir]", &self.fetch.json_ld_dir),
        ] {
            if !path.starts_with('/') {
                bail!(ConfigError::Validation(format!("{field} must start with `/`")));
            }
        }

        if self.page.default_role.trim().is_empty() {
            bail!(ConfigError::Validation(
                "[page.default_role] must not be empty".into()
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_default_config_is_valid() {
        let config = SiteConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.origin().unwrap().as_str(), "http://localhost:5277/");
    }

    #[test]
    fn test_from_str_reports_parse_error() {
        let err = SiteConfig::from_str("[facts]\nword_count = 3\n", Path::new("sitevars.toml"))
            .unwrap_err()
            .to_string();
        assert!(err.starts_with("invalid sitevars config `sitevars.toml` at line 2: "), "{err}");
    }

    #[test]
    fn test_validate_rejects_unknown_timezone() {
        let mut config = SiteConfig::default();
        config.facts.timezone = Some("Mars/Olympus".into());
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("[facts.timezone]"));

        config.facts.timezone = Some("Asia/Tokyo".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_relative_origin() {
        let mut config = SiteConfig::default();
        config.site.origin = "example.com".into();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("[site.origin]"));
    }

    #[test]
    fn test_validate_rejects_non_http_origin() {
        let mut config = SiteConfig::default();
        config.site.origin = "ftp://example.com".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_reading_speed() {
        let mut config = SiteConfig::default();
        config.facts.words_per_minute = 0;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("words_per_minute"));
    }

    #[test]
    fn test_validate_rejects_relative_document_path() {
        let mut config = SiteConfig::default();
        config.fetch.variables = "config/variables.json".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_without_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_str().unwrap();
        let cli = Cli::try_parse_from(["sitevars", "--root", root, "apply"]).unwrap();

        let config = SiteConfig::load(&cli).unwrap();
        assert!(config.site.root.ends_with("public"));
        assert!(config.site.root.is_absolute());
    }

    #[test]
    fn test_load_with_cli_overrides() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("sitevars.toml"),
            "[site]\norigin = \"https://a.example\"\n[serve]\nport = 9000\n",
        )
        .unwrap();
        let root = dir.path().to_str().unwrap();
        let cli = Cli::try_parse_from([
            "sitevars",
            "--root",
            root,
            "--origin",
            "https://b.example",
            "serve",
            "--port",
            "9100",
        ])
        .unwrap();

        let config = SiteConfig::load(&cli).unwrap();
        assert_eq!(config.site.origin, "https://b.example");
        assert_eq!(config.serve.port, 9100);
    }
}

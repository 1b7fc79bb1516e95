//! `[fetch]` section configuration.
//!
//! Controls where the variables document and JSON-LD templates come from.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// Source for documents that live on the site's own origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Read same-origin URLs from the site directory (default).
    /// Foreign origins are still fetched over HTTP.
    #[default]
    Local,
    /// Fetch everything over HTTP.
    Http,
}

/// `[fetch]` section in sitevars.toml.
///
/// # Example
/// ```toml
/// [fetch]
/// mode = "http"
/// variables = "/config/variables.json"
/// json_ld_dir = "/config/json-ld"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct FetchSection {
    #[serde(default)]
    pub mode: FetchMode,

    /// Path of the variables document on the origin.
    #[serde(default = "defaults::fetch::variables")]
    #[educe(Default = defaults::fetch::variables())]
    pub variables: String,

    /// Directory holding `{role}.json` JSON-LD templates on the origin.
    #[serde(default = "defaults::fetch::json_ld_dir")]
    #[educe(Default = defaults::fetch::json_ld_dir())]
    pub json_ld_dir: String,
}

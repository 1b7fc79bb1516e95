//! `[site]` section configuration.
//!
//! Where the built site lives and the origin it is published under.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[site]` section in sitevars.toml.
///
/// # Example
/// ```toml
/// [site]
/// root = "public"
/// origin = "https://example.com"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteSection {
    /// Directory holding the built pages (relative to project root).
    #[serde(default = "defaults::site::root")]
    #[educe(Default = defaults::site::root())]
    pub root: PathBuf,

    /// Public origin the pages are served from (`scheme://host[:port]`).
    /// Page URLs, canonical links and config document URLs resolve against it.
    #[serde(default = "defaults::site::origin")]
    #[educe(Default = defaults::site::origin())]
    pub origin: String,
}

//! `[facts]` section configuration.
//!
//! Toggles for the page and system facts derived for every page.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[facts]` section in sitevars.toml.
///
/// # Example
/// ```toml
/// [facts]
/// word_count = true
/// author_fallback = false
/// words_per_minute = 200
/// timezone = "Europe/Berlin"
/// locale = "de-DE"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct FactsSection {
    /// Emit `$page:wordcount` and `$page:readspeed`.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub word_count: bool,

    /// Default `$page:author` to `$company:name` when the page has no author meta.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub author_fallback: bool,

    /// Reading speed used for `$page:readspeed`.
    #[serde(default = "defaults::facts::words_per_minute")]
    #[educe(Default = defaults::facts::words_per_minute())]
    pub words_per_minute: usize,

    /// IANA timezone reported as `$system:timezone` (detected when unset).
    #[serde(default)]
    pub timezone: Option<String>,

    /// BCP 47 locale used for `$system:locale` and friends (detected when unset).
    #[serde(default)]
    pub locale: Option<String>,
}

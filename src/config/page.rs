//! `[page]` section configuration.
//!
//! Structured data defaults and the decorations added to each page.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[page]` section in sitevars.toml.
///
/// # Example
/// ```toml
/// [page]
/// default_role = "organization"
/// byline = true
/// chatbot = false
/// editorial_meta = ["pageauthor", "pagereviewdate"]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct PageSection {
    /// JSON-LD role used when a page has no `<meta name="json-ld">`.
    #[serde(default = "defaults::page::default_role")]
    #[educe(Default = defaults::page::default_role())]
    pub default_role: String,

    /// Append the word count / reading time byline to the first `<h1>`.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub byline: bool,

    /// Append an empty `div.chatBot` mount point to the first `<h1>`.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub chatbot: bool,

    /// Editorial `<meta name=...>` directives stripped from published pages.
    #[serde(default = "defaults::page::editorial_meta")]
    #[educe(Default = defaults::page::editorial_meta())]
    pub editorial_meta: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;

    #[test]
    fn test_page_section() {
        let config = r#"
            [page]
            default_role = "organization"
            byline = false
            chatbot = true
            editorial_meta = ["pageauthor"]
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.page.default_role, "organization");
        assert!(!config.page.byline);
        assert!(config.page.chatbot);
        assert_eq!(config.page.editorial_meta, vec!["pageauthor".to_string()]);
    }

    #[test]
    fn test_page_section_defaults() {
        let config: SiteConfig = toml::from_str("").unwrap();

        assert_eq!(config.page.default_role, "owner");
        assert!(config.page.byline);
        assert!(!config.page.chatbot);
        assert_eq!(config.page.editorial_meta.len(), 6);
        assert!(config.page.editorial_meta.iter().any(|m| m == "pagecopyright-cc"));
    }
}

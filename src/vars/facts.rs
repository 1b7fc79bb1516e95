//! Page facts (`$page:*`, meta entries) derived from a scanned document.
//!
//! Pure: everything comes from the [`PageScan`], the page URL and one clock
//! reading, so a page always yields the same facts for the same inputs.

use super::{
    ConfigMap,
    system::{SystemInfo, system_facts},
};
use crate::{config::FactsSection, page::PageScan};
use chrono::NaiveDateTime;
use url::Url;

/// Collect the facts of one page.
///
/// `known` is the map being built (remote rows), consulted for the
/// `$page:author` fallback. The result only holds the new entries; merge it
/// over `known` to get the page's final map.
pub fn collect_facts(
    scan: &PageScan,
    page_url: &Url,
    now: NaiveDateTime,
    system: &SystemInfo,
    opts: &FactsSection,
    known: &ConfigMap,
) -> ConfigMap {
    let mut facts = ConfigMap::new();

    if opts.word_count {
        let words = scan.word_count();
        facts.insert("$page:wordcount", words.to_string());
        facts.insert(
            "$page:readspeed",
            read_minutes(words, opts.words_per_minute).to_string(),
        );
    }
    facts.insert("$page:linkcount", scan.link_count.to_string());
    facts.insert("$page:title", scan.title.as_deref().unwrap_or_default());

    for (key, name) in [
        ("$page:description", "description"),
        ("$page:keywords", "keywords"),
        ("$page:author", "author"),
    ] {
        if let Some(content) = scan.meta_content(name) {
            facts.insert(key, content);
        }
    }

    let canonical = scan
        .canonical
        .as_deref()
        .and_then(|href| page_url.join(href.trim()).ok())
        .map(String::from)
        .unwrap_or_default();
    facts.insert("$page:canonical", canonical);

    facts.merge(system_facts(now, system));

    for meta in &scan.metas {
        let (Some(name), Some(content)) = (meta.key(), meta.content.as_deref()) else {
            continue;
        };
        if !content.is_empty() {
            facts.insert(meta_key(name), content);
        }
    }

    if opts.author_fallback
        && !facts.contains_key("$page:author")
        && let Some(company) = known.get("$company:name")
    {
        facts.insert("$page:author", company);
    }

    facts
}

/// Minutes to read `words`, rounded up, plus one.
pub fn read_minutes(words: usize, words_per_minute: usize) -> usize {
    words.div_ceil(words_per_minute.max(1)) + 1
}

/// Map key for a `<meta>` name or property.
///
/// `description` → `$meta:description`, `og:title` → `$og:title`,
/// `meta:twitter:card` → `$twitter:card`.
pub fn meta_key(name: &str) -> String {
    let mut key = if name.contains(':') {
        name.to_owned()
    } else {
        format!("meta:{name}")
    };
    if key.starts_with("meta:og:") || key.starts_with("meta:twitter:") {
        key.replace_range(.."meta:".len(), "");
    }
    if key == "og:image:secure_url" {
        key = "og:image_secure_url".into();
    }
    format!("${key}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{page::scan_page, vars::system::Locale};
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    fn system() -> SystemInfo {
        SystemInfo {
            timezone: chrono_tz::Tz::UTC,
            locale: Locale::parse("en-GB").unwrap(),
        }
    }

    fn facts_for(html: &str, known: &ConfigMap, opts: &FactsSection) -> ConfigMap {
        let scan = scan_page(html.as_bytes()).unwrap();
        let url = Url::parse("https://example.com/blog/post.html").unwrap();
        collect_facts(&scan, &url, now(), &system(), opts, known)
    }

    #[test]
    fn test_read_minutes() {
        assert_eq!(read_minutes(119, 60), 3);
        assert_eq!(read_minutes(120, 60), 3);
        assert_eq!(read_minutes(121, 60), 4);
        assert_eq!(read_minutes(0, 60), 1);
    }

    #[test]
    fn test_meta_key_rules() {
        assert_eq!(meta_key("description"), "$meta:description");
        assert_eq!(meta_key("og:title"), "$og:title");
        assert_eq!(meta_key("twitter:card"), "$twitter:card");
        assert_eq!(meta_key("meta:og:title"), "$og:title");
        assert_eq!(meta_key("meta:twitter:site"), "$twitter:site");
        assert_eq!(meta_key("og:image:secure_url"), "$og:image_secure_url");
    }

    #[test]
    fn test_page_facts() {
        let html = r#"<html><head>
            <title> Post </title>
            <meta name="description" content="About things">
            <meta name="keywords" content="a, b">
            <meta name="author" content="Jo">
            <meta property="og:image:secure_url" content="https://example.com/i.png">
            <meta name="empty" content="">
            <link rel="canonical" href="/blog/post/">
        </head><body><main><h1>Hello world</h1><p>See <a href="/">home</a></p></main></body></html>"#;
        let facts = facts_for(html, &ConfigMap::new(), &FactsSection::default());

        assert_eq!(facts.get("$page:title"), Some("Post"));
        assert_eq!(facts.get("$page:wordcount"), Some("4"));
        assert_eq!(facts.get("$page:readspeed"), Some("2"));
        assert_eq!(facts.get("$page:linkcount"), Some("1"));
        assert_eq!(facts.get("$page:description"), Some("About things"));
        assert_eq!(facts.get("$page:keywords"), Some("a, b"));
        assert_eq!(facts.get("$page:author"), Some("Jo"));
        assert_eq!(
            facts.get("$page:canonical"),
            Some("https://example.com/blog/post/")
        );
        assert_eq!(facts.get("$meta:description"), Some("About things"));
        assert_eq!(
            facts.get("$og:image_secure_url"),
            Some("https://example.com/i.png")
        );
        assert!(!facts.contains_key("$meta:empty"));
        assert_eq!(facts.get("$system:date"), Some("2026-10-16"));
        assert_eq!(facts.get("$system:time"), Some("09:30:00"));
    }

    #[test]
    fn test_missing_title_and_canonical_are_empty() {
        let facts = facts_for("<p>x</p>", &ConfigMap::new(), &FactsSection::default());
        assert_eq!(facts.get("$page:title"), Some(""));
        assert_eq!(facts.get("$page:canonical"), Some(""));
        assert!(!facts.contains_key("$page:description"));
    }

    #[test]
    fn test_author_falls_back_to_company_name() {
        let known: ConfigMap = [("$company:name", "Acme")].into_iter().collect();
        let facts = facts_for("<p>x</p>", &known, &FactsSection::default());
        assert_eq!(facts.get("$page:author"), Some("Acme"));

        let opts = FactsSection {
            author_fallback: false,
            ..FactsSection::default()
        };
        let facts = facts_for("<p>x</p>", &known, &opts);
        assert!(!facts.contains_key("$page:author"));
    }

    #[test]
    fn test_word_count_toggle() {
        let opts = FactsSection {
            word_count: false,
            ..FactsSection::default()
        };
        let facts = facts_for("<p>one two</p>", &ConfigMap::new(), &opts);
        assert!(!facts.contains_key("$page:wordcount"));
        assert!(!facts.contains_key("$page:readspeed"));
        assert_eq!(facts.get("$page:linkcount"), Some("0"));
    }
}

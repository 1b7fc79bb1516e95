//! Visible additions under the page's first `<h1>`.

use super::common::escape_text;
use crate::vars::{ConfigMap, substitute};

const BYLINE: &str = r#"<div class="byLine">Word Count = $page:wordcount, <strong>$page:readspeed </strong>minute(s) to read this page.</div>"#;

/// Facts the byline is rendered from.
const BYLINE_FACTS: &[&str] = &["$page:wordcount", "$page:readspeed"];

/// `div.byLine` with word count and reading time.
///
/// `None` when the word count facts are not in the map.
pub fn byline(vars: &ConfigMap) -> Option<String> {
    let facts: ConfigMap = BYLINE_FACTS
        .iter()
        .map(|&key| vars.get(key).map(|value| (key, escape_text(value))))
        .collect::<Option<_>>()?;
    Some(substitute(BYLINE, &facts))
}

/// Empty mount point for the chat widget.
pub fn chat_mount() -> &'static str {
    r#"<div class="chatBot"></div>"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byline_text() {
        let vars: ConfigMap = [("$page:wordcount", "119"), ("$page:readspeed", "3")]
            .into_iter()
            .collect();
        assert_eq!(
            byline(&vars).unwrap(),
            r#"<div class="byLine">Word Count = 119, <strong>3 </strong>minute(s) to read this page.</div>"#
        );
    }

    #[test]
    fn test_byline_needs_word_facts() {
        let vars: ConfigMap = [("$page:wordcount", "10")].into_iter().collect();
        assert_eq!(byline(&vars), None);
    }
}

//! Remote site variables (`/config/variables.json`).
//!
//! The document is a spreadsheet-style export:
//!
//! ```json
//! { "data": [ { "Item": "$company:name", "Value": "Acme" } ] }
//! ```

use super::ConfigMap;
use crate::{
    fetch::{Fetch, FetchError, fetch_json},
    log,
};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

/// One `{Item, Value}` row of a config or JSON-LD document.
#[derive(Debug, Clone, Deserialize)]
pub struct Row {
    #[serde(rename = "Item")]
    pub item: String,
    #[serde(rename = "Value", default)]
    pub value: Value,
}

/// `{ "data": [...] }` wrapper of the variables document.
#[derive(Debug, Deserialize)]
struct RowDocument {
    data: Vec<Row>,
}

/// Text of a row value as it is stored in the map.
///
/// Strings are copied verbatim, numbers and booleans use their JSON text.
/// `null` (or a missing `Value`) yields `None` and the row is skipped.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Flatten rows into a map; later rows win for duplicate items.
pub fn rows_to_map(rows: &[Row]) -> ConfigMap {
    rows.iter()
        .filter_map(|row| value_text(&row.value).map(|v| (row.item.clone(), v)))
        .collect()
}

/// Fetch `{origin}{path}` and flatten its rows into a fresh `ConfigMap`.
///
/// Errors are logged and returned; the caller decides whether the page can
/// go on without site variables.
pub fn load_configuration(
    fetcher: &dyn Fetch,
    origin: &Url,
    path: &str,
) -> Result<ConfigMap, FetchError> {
    let url = origin.join(path).map_err(|err| FetchError::Transport {
        url: format!("{origin}{path}"),
        reason: err.to_string(),
    })?;

    match fetch_json::<RowDocument>(fetcher, &url) {
        Ok(doc) => Ok(rows_to_map(&doc.data)),
        Err(err) => {
            log!("config"; "configuration load error: {err}");
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{HttpFetcher, test_server::TestServer};

    #[test]
    fn test_rows_copied_verbatim() {
        let server = TestServer::start(vec![(
            "/config/variables.json",
            200,
            r#"{"data":[
                {"Item":"$company:name","Value":"Acme"},
                {"Item":"$company:motto","Value":"  Build  Things "},
                {"Item":"$Company:Case","Value":"MiXeD"}
            ]}"#
            .into(),
        )]);

        let map = load_configuration(
            &HttpFetcher::new(),
            &server.origin,
            "/config/variables.json",
        )
        .unwrap();

        assert_eq!(map.get("$company:name"), Some("Acme"));
        assert_eq!(map.get("$company:motto"), Some("  Build  Things "));
        assert_eq!(map.get("$Company:Case"), Some("MiXeD"));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_non_ok_status_is_reported() {
        let server = TestServer::start(vec![("/config/variables.json", 503, "down".into())]);

        let err = load_configuration(
            &HttpFetcher::new(),
            &server.origin,
            "/config/variables.json",
        )
        .unwrap_err();

        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let server = TestServer::start(vec![("/config/variables.json", 200, "<html>".into())]);

        let err = load_configuration(
            &HttpFetcher::new(),
            &server.origin,
            "/config/variables.json",
        )
        .unwrap_err();

        assert!(matches!(err, FetchError::Json { .. }));
    }

    #[test]
    fn test_missing_data_array_is_an_error() {
        let server = TestServer::start(vec![("/config/variables.json", 200, "{}".into())]);

        let result = load_configuration(
            &HttpFetcher::new(),
            &server.origin,
            "/config/variables.json",
        );
        assert!(matches!(result, Err(FetchError::Json { .. })));
    }

    #[test]
    fn test_value_text_policy() {
        assert_eq!(value_text(&Value::from("x")), Some("x".into()));
        assert_eq!(value_text(&Value::from(42)), Some("42".into()));
        assert_eq!(value_text(&Value::from(true)), Some("true".into()));
        assert_eq!(value_text(&Value::Null), None);
    }

    #[test]
    fn test_null_rows_are_skipped_and_duplicates_keep_last() {
        let rows: Vec<Row> = serde_json::from_str(
            r#"[
                {"Item":"$a","Value":null},
                {"Item":"$b"},
                {"Item":"$c","Value":"first"},
                {"Item":"$c","Value":"second"}
            ]"#,
        )
        .unwrap();

        let map = rows_to_map(&rows);
        assert!(!map.contains_key("$a"));
        assert!(!map.contains_key("$b"));
        assert_eq!(map.get("$c"), Some("second"));
    }
}

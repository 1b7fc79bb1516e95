//! Structured data (`<script type="application/ld+json">`) for pages that
//! don't carry their own.
//!
//! A page selects a template with `<meta name="json-ld" content="...">`:
//! either a role name (`organization`, resolved to
//! `{origin}/config/json-ld/organization.json`) or an absolute URL. Without
//! the directive the configured default role is used.
//!
//! Templates come in two shapes:
//!
//! ```json
//! { "data": [ { "Item": "type", "Value": "Organization" },
//!             { "Item": "name", "Value": "$company:name" } ] }
//! ```
//!
//! which is flattened into `{"@type": "Organization", "name": "$company:name"}`,
//! or any other JSON document, used as-is. Tokens are substituted before the
//! script is planned into the page's `<head>`.
//!
//! Failures never stop the page: they come back as
//! [`JsonLdOutcome::Failed`] and the page goes on without structured data.

use crate::{
    config::SiteConfig,
    fetch::{Fetch, FetchError, fetch_json},
    page::{PageEdits, PageScan, common::escape_text},
    vars::{PageContext, remote::Row, substitute_json},
};
use serde_json::{Map, Value};
use thiserror::Error;
use url::Url;

/// Template items that become JSON-LD keywords (`type` → `@type`).
pub const RESERVED_KEYS: &[&str] = &[
    "type",
    "context",
    "id",
    "value",
    "reverse",
    "container",
    "graph",
];

/// Directive meta naming the template.
const DIRECTIVE_META: &str = "json-ld";

/// Meta removed once structured data is in place.
const LONG_DESCRIPTION_META: &str = "longdescription";

#[derive(Debug, Error)]
pub enum JsonLdError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("cannot build template URL for role `{role}`: {source}")]
    Url {
        role: String,
        #[source]
        source: url::ParseError,
    },

    #[error("malformed `data` rows in `{url}`: {source}")]
    Rows {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A fetched template, discriminated by shape.
#[derive(Debug, Clone)]
pub enum JsonLdSource {
    /// `{ "data": [ {Item, Value}, ... ] }`
    Rows(Vec<Row>),
    /// Anything else, used verbatim
    Document(Value),
}

impl JsonLdSource {
    /// Discriminate a parsed document.
    ///
    /// An object whose `data` member is an array is a row list; its rows must
    /// all be `{Item, Value}` objects.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::Object(mut object) if object.get("data").is_some_and(Value::is_array) => {
                let data = object.remove("data").unwrap_or_default();
                Ok(Self::Rows(serde_json::from_value(data)?))
            }
            other => Ok(Self::Document(other)),
        }
    }
}

/// Turn a template into the JSON-LD document to embed.
pub fn extract_json_ld(source: JsonLdSource) -> Value {
    let rows = match source {
        JsonLdSource::Document(doc) => return doc,
        JsonLdSource::Rows(rows) => rows,
    };

    let mut doc = Map::new();
    for row in rows {
        let mut key = row.item.trim().to_lowercase();
        if RESERVED_KEYS.contains(&key.as_str()) {
            key.insert(0, '@');
        }
        let value = match row.value {
            Value::String(s) => Value::String(s.trim().to_owned()),
            other => other,
        };
        doc.insert(key, value);
    }
    Value::Object(doc)
}

/// What the injector did to a page.
#[derive(Debug)]
pub enum JsonLdOutcome {
    /// The page already carries structured data
    Skipped,
    /// A script with this `data-role` was planned into `<head>`
    Injected { role: String },
    /// The template could not be produced
    Failed(JsonLdError),
}

/// Plan structured data for one page into `edits`.
pub fn inject_json_ld(
    scan: &PageScan,
    ctx: &PageContext,
    fetcher: &dyn Fetch,
    config: &SiteConfig,
    edits: &mut PageEdits,
) -> JsonLdOutcome {
    if scan.has_json_ld_script {
        return JsonLdOutcome::Skipped;
    }

    let directive = scan
        .json_ld_directive
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(&config.page.default_role);
    edits.remove_meta(DIRECTIVE_META);

    match render_script(directive, ctx, fetcher, &config.fetch.json_ld_dir) {
        Ok((role, script)) => {
            edits.append_to_head(script);
            edits.remove_meta(LONG_DESCRIPTION_META);
            JsonLdOutcome::Injected { role }
        }
        Err(err) => JsonLdOutcome::Failed(err),
    }
}

/// Fetch, normalize and substitute the template; returns `(role, <script>)`.
fn render_script(
    directive: &str,
    ctx: &PageContext,
    fetcher: &dyn Fetch,
    json_ld_dir: &str,
) -> Result<(String, String), JsonLdError> {
    let url = template_url(directive, &ctx.origin, json_ld_dir)?;
    let role = role_of(&url).unwrap_or_else(|| directive.to_owned());

    let raw: Value = fetch_json(fetcher, &url)?;
    let source = JsonLdSource::from_value(raw).map_err(|source| JsonLdError::Rows {
        url: url.to_string(),
        source,
    })?;
    let doc = extract_json_ld(source);

    let payload = substitute_json(&doc.to_string(), &ctx.vars).replace("</", "<\\/");
    let script = format!(
        r#"<script type="application/ld+json" data-role="{}">{payload}</script>"#,
        escape_text(&role)
    );
    Ok((role, script))
}

/// Absolute URLs are used as-is, anything else names a role.
fn template_url(directive: &str, origin: &Url, json_ld_dir: &str) -> Result<Url, JsonLdError> {
    if let Ok(url) = Url::parse(directive) {
        return Ok(url);
    }
    let dir = json_ld_dir.trim_end_matches('/');
    origin
        .join(&format!("{dir}/{directive}.json"))
        .map_err(|source| JsonLdError::Url {
            role: directive.to_owned(),
            source,
        })
}

/// Final path segment up to its first `.`: `.../json-ld/owner.json` → `owner`.
fn role_of(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.next_back()?;
    let stem = segment.split('.').next().unwrap_or_default();
    let stem = urlencoding::decode(stem).ok()?;
    (!stem.is_empty()).then(|| stem.into_owned())
}

//! Token substitution.
//!
//! Replaces every literal occurrence of a map key in a text with its value.
//!
//! Matching rules:
//! - keys are literal strings, never patterns (`$a.b` does not match `$aXb`)
//! - the text is scanned once, left to right; at each position the
//!   **longest** matching key wins, so `$page:authorname` is not eaten by
//!   `$page:author`
//! - replaced output is never rescanned: a value that itself contains a
//!   token is emitted as-is
//! - tokens without a map entry are left untouched
//!
//! The result depends only on the map's contents, not on insertion order.

use super::ConfigMap;
use rustc_hash::FxHashMap;
use serde_json::Value;

/// Substitution table compiled from a `ConfigMap`.
///
/// Keys are bucketed by their first byte and ordered longest first inside a
/// bucket. A first byte is always a char boundary in UTF-8, so a bucket hit
/// can only happen at a boundary of the scanned text.
pub struct Substitution<'m> {
    buckets: FxHashMap<u8, Vec<(&'m str, &'m str)>>,
}

impl<'m> Substitution<'m> {
    pub fn new(map: &'m ConfigMap) -> Self {
        let mut buckets: FxHashMap<u8, Vec<(&str, &str)>> = FxHashMap::default();
        for (key, value) in map.iter() {
            if let Some(&first) = key.as_bytes().first() {
                buckets.entry(first).or_default().push((key, value));
            }
        }
        for keys in buckets.values_mut() {
            keys.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(b.0)));
        }
        Self { buckets }
    }

    /// Substitute raw values.
    pub fn apply(&self, text: &str) -> String {
        self.apply_with(text, |value, out| out.push_str(value))
    }

    /// Substitute values escaped for the inside of a JSON string literal.
    pub fn apply_json(&self, text: &str) -> String {
        self.apply_with(text, push_json_escaped)
    }

    fn apply_with(&self, text: &str, mut emit: impl FnMut(&str, &mut String)) -> String {
        if self.buckets.is_empty() {
            return text.to_owned();
        }

        let bytes = text.as_bytes();
        let mut out = String::with_capacity(text.len());
        let mut copied = 0;
        let mut pos = 0;

        while pos < bytes.len() {
            let hit = self.buckets.get(&bytes[pos]).and_then(|keys| {
                keys.iter()
                    .find(|(key, _)| bytes[pos..].starts_with(key.as_bytes()))
            });

            match hit {
                Some((key, value)) => {
                    out.push_str(&text[copied..pos]);
                    emit(value, &mut out);
                    pos += key.len();
                    copied = pos;
                }
                None => pos += 1,
            }
        }

        out.push_str(&text[copied..]);
        out
    }
}

/// Replace every key of `map` found in `text` with its value.
pub fn substitute(text: &str, map: &ConfigMap) -> String {
    Substitution::new(map).apply(text)
}

/// Like [`substitute`], for serialized JSON: values are escaped so that
/// quotes, backslashes and control characters cannot break the document.
pub fn substitute_json(text: &str, map: &ConfigMap) -> String {
    Substitution::new(map).apply_json(text)
}

fn push_json_escaped(value: &str, out: &mut String) {
    let quoted = Value::from(value).to_string();
    out.push_str(&quoted[1..quoted.len() - 1]);
}

//! quick-xml helpers shared by the scanner and the rewriter.

use quick_xml::{Reader, Writer, escape::unescape, events::BytesStart};
use std::io::Cursor;

pub type HtmlWriter = Writer<Cursor<Vec<u8>>>;

/// Elements whose content is raw text, never markup.
pub const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Lenient reader for HTML: no text trimming, no well-formedness checks,
/// so void elements (`<meta>`, `<br>`) and unclosed tags pass through.
/// A bare `&` (`Tom & Jerry`) is read as text.
#[inline]
pub fn create_html_reader(content: &[u8]) -> Reader<&[u8]> {
    let mut reader = Reader::from_reader(content);
    let config = reader.config_mut();
    config.trim_text(false);
    config.enable_all_checks(false);
    config.allow_dangling_amp = true;
    reader
}

/// Consume the content of a raw text element whose start tag was just read.
///
/// Returns the bytes up to (not including) the matching end tag, which stays
/// in the input and is read as a normal `End` event. Without an end tag the
/// rest of the document is the content.
pub fn take_raw_text<'i>(reader: &mut Reader<&'i [u8]>, name: &str) -> &'i [u8] {
    let rest: &'i [u8] = *reader.get_ref();
    let end = find_end_tag(rest, name.as_bytes()).unwrap_or(rest.len());
    let (raw, tail) = rest.split_at(end);
    *reader.get_mut() = tail;
    raw
}

/// Offset of the first `</name` (any case) closing a tag name.
fn find_end_tag(haystack: &[u8], name: &[u8]) -> Option<usize> {
    let mut from = 0;
    while let Some(i) = haystack[from..].windows(2).position(|w| w == b"</") {
        let start = from + i;
        let after = &haystack[start + 2..];
        if after.len() >= name.len()
            && after[..name.len()].eq_ignore_ascii_case(name)
            && after
                .get(name.len())
                .is_none_or(|b| b.is_ascii_whitespace() || matches!(b, b'>' | b'/'))
        {
            return Some(start);
        }
        from = start + 2;
    }
    None
}

/// Lowercased local tag name.
#[inline]
pub fn tag_name(elem: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(elem.local_name().as_ref()).to_ascii_lowercase()
}

/// Value of attribute `name` (case-insensitive), entity-decoded.
///
/// Accepts HTML attribute syntax: unquoted values and bare attributes
/// (`<script async>` yields `Some("")` for `async`).
pub fn attr(elem: &BytesStart<'_>, name: &str) -> Option<String> {
    elem.html_attributes()
        .flatten()
        .find(|a| a.key.as_ref().eq_ignore_ascii_case(name.as_bytes()))
        .map(|a| {
            let raw = String::from_utf8_lossy(&a.value);
            match unescape(&raw) {
                Ok(value) => value.into_owned(),
                Err(_) => raw.into_owned(),
            }
        })
}

/// Whether the whitespace-separated `class` list contains every class in `required`.
pub fn has_classes(elem: &BytesStart<'_>, required: &[&str]) -> bool {
    let Some(class) = attr(elem, "class") else {
        return false;
    };
    required
        .iter()
        .all(|needle| class.split_ascii_whitespace().any(|c| c == *needle))
}

/// Escape a value for use inside HTML text.
#[inline]
pub fn escape_text(text: &str) -> String {
    quick_xml::escape::escape(text).into_owned()
}

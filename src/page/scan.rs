//! Read-only pass over a document.
//!
//! Collects everything the facts and the JSON-LD injector need to know about
//! a page, without touching the document.

use super::common::{RAW_TEXT_ELEMENTS, attr, create_html_reader, tag_name, take_raw_text};
use anyhow::{Result, bail};
use quick_xml::{
    escape::unescape,
    events::{BytesStart, Event},
};

/// Elements whose `<title>` children are not the document title.
const FOREIGN_ELEMENTS: &[&str] = &["svg", "math"];

/// Elements whose text is not rendered.
const HIDDEN_TEXT: &[&str] = &["script", "style", "template", "noscript"];

/// Elements that break words apart in rendered text.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "br", "dd", "details", "div", "dl",
    "dt", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "header", "hr", "li", "main", "nav", "ol", "p", "pre", "section", "summary", "table",
    "td", "th", "tr", "ul",
];

/// A `<meta>` element's identifying attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaTag {
    pub name: Option<String>,
    pub property: Option<String>,
    pub content: Option<String>,
}

impl MetaTag {
    /// `name`, or `property` when `name` is missing or empty.
    pub fn key(&self) -> Option<&str> {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.property.as_deref())
            .filter(|k| !k.is_empty())
    }

    fn is_named(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }
}

/// Facts read from one HTML document.
#[derive(Debug, Clone, Default)]
pub struct PageScan {
    /// `<title>` text, if the document has one
    pub title: Option<String>,
    /// Rendered text outside `<head>`, block elements separated by spaces
    pub body_text: String,
    /// Number of `<a>` elements
    pub link_count: usize,
    /// `href` of the first `link[rel=canonical]`, as written
    pub canonical: Option<String>,
    /// Every `<meta>`, in document order
    pub metas: Vec<MetaTag>,
    /// `content` of the first `meta[name=json-ld]` (`Some("")` when empty)
    pub json_ld_directive: Option<String>,
    pub has_json_ld_script: bool,
    pub has_main: bool,
    pub has_h1: bool,
    pub has_head: bool,
}

impl PageScan {
    /// Content of the first `meta[name=...]` with non-empty content.
    pub fn meta_content(&self, name: &str) -> Option<&str> {
        self.metas
            .iter()
            .filter(|m| m.is_named(name))
            .find_map(|m| m.content.as_deref().filter(|c| !c.is_empty()))
    }

    /// Whitespace-separated words of the rendered body text.
    pub fn word_count(&self) -> usize {
        self.body_text.split_whitespace().count()
    }
}

/// Scan `html` into a [`PageScan`].
pub fn scan_page(html: &[u8]) -> Result<PageScan> {
    let mut scan = PageScan::default();
    let mut reader = create_html_reader(html);

    let mut in_head = false;
    let mut in_body = false;
    let mut foreign = 0usize;
    let mut title: Option<String> = None;
    let mut in_title = false;
    let mut hidden: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(elem)) => {
                let name = tag_name(&elem);
                if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
                    take_raw_text(&mut reader, &name);
                }
                if hidden.is_some() {
                    continue;
                }
                scan.visit_element(&name, &elem);
                match name.as_str() {
                    "head" => in_head = true,
                    "body" => {
                        in_head = false;
                        in_body = true;
                    }
                    n if FOREIGN_ELEMENTS.contains(&n) => foreign += 1,
                    "title" if title.is_none() && (in_head || (!in_body && foreign == 0)) => {
                        in_title = true;
                        title = Some(String::new());
                    }
                    n if HIDDEN_TEXT.contains(&n) => hidden = Some(name.clone()),
                    _ => {}
                }
                scan.break_word(&name);
            }
            Ok(Event::Empty(elem)) => {
                if hidden.is_none() {
                    let name = tag_name(&elem);
                    scan.visit_element(&name, &elem);
                    scan.break_word(&name);
                }
            }
            Ok(Event::End(elem)) => {
                let name = String::from_utf8_lossy(elem.local_name().as_ref()).to_ascii_lowercase();
                if let Some(open) = &hidden {
                    if *open == name {
                        hidden = None;
                    }
                    continue;
                }
                match name.as_str() {
                    "head" => in_head = false,
                    "title" => in_title = false,
                    n if FOREIGN_ELEMENTS.contains(&n) => foreign = foreign.saturating_sub(1),
                    _ => {}
                }
                scan.break_word(&name);
            }
            Ok(Event::Text(text)) => {
                let text = reader.decoder().decode(&text)?;
                push_text(&mut scan, &mut title, &text, in_title, in_head, hidden.is_some());
            }
            Ok(Event::CData(data)) => {
                let text = reader.decoder().decode(&data)?;
                push_text(&mut scan, &mut title, &text, in_title, in_head, hidden.is_some());
            }
            Ok(Event::GeneralRef(entity)) => {
                let name = entity.decode()?;
                let text = resolve_entity(&name);
                push_text(&mut scan, &mut title, &text, in_title, in_head, hidden.is_some());
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => bail!(
                "HTML parse error at position {}: {:?}",
                reader.error_position(),
                e
            ),
        }
    }

    scan.title = title.map(|t| t.trim().to_owned());
    Ok(scan)
}

fn push_text(
    scan: &mut PageScan,
    title: &mut Option<String>,
    text: &str,
    in_title: bool,
    in_head: bool,
    hidden: bool,
) {
    if hidden {
        return;
    }
    if in_title {
        if let Some(title) = title {
            title.push_str(text);
        }
    } else if !in_head {
        scan.body_text.push_str(text);
    }
}

/// Text of an entity reference (`&amp;`, `&#8212;`, `&nbsp;`).
///
/// Unknown named entities keep their source form.
fn resolve_entity(name: &str) -> String {
    if name == "nbsp" {
        return " ".into();
    }
    let source = format!("&{name};");
    match unescape(&source) {
        Ok(text) => text.into_owned(),
        Err(_) => source,
    }
}

impl PageScan {
    fn visit_element(&mut self, name: &str, elem: &BytesStart<'_>) {
        match name {
            "a" => self.link_count += 1,
            "main" => self.has_main = true,
            "h1" => self.has_h1 = true,
            "head" => self.has_head = true,
            "meta" => {
                let meta = MetaTag {
                    name: attr(elem, "name"),
                    property: attr(elem, "property"),
                    content: attr(elem, "content"),
                };
                if meta.is_named("json-ld") && self.json_ld_directive.is_none() {
                    self.json_ld_directive = Some(meta.content.clone().unwrap_or_default());
                }
                self.metas.push(meta);
            }
            "link" if self.canonical.is_none() => {
                let is_canonical = attr(elem, "rel").is_some_and(|rel| {
                    rel.split_ascii_whitespace()
                        .any(|r| r.eq_ignore_ascii_case("canonical"))
                });
                if is_canonical {
                    self.canonical = attr(elem, "href");
                }
            }
            "script" => {
                let is_json_ld = attr(elem, "type")
                    .is_some_and(|t| t.trim().eq_ignore_ascii_case("application/ld+json"));
                self.has_json_ld_script |= is_json_ld;
            }
            _ => {}
        }
    }

    fn break_word(&mut self, name: &str) {
        if BLOCK_ELEMENTS.contains(&name) {
            self.body_text.push(' ');
        }
    }
}

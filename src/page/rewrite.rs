//! Single write pass applying a [`PageEdits`] plan.
//!
//! Every event not touched by the plan is written back as read, so
//! formatting, comments and unknown markup survive the rewrite.

use super::common::{
    HtmlWriter, RAW_TEXT_ELEMENTS, attr, create_html_reader, has_classes, tag_name,
    take_raw_text,
};
use anyhow::{Result, bail};
use quick_xml::{
    Writer,
    events::{BytesStart, Event},
};
use rustc_hash::FxHashSet;
use std::io::{Cursor, Write};

/// Classes marking an editorial comment block.
pub const COMMENT_BLOCK_CLASSES: &[&str] = &["section-metadata", "comment"];

/// Mutations to apply to one document.
#[derive(Debug, Clone, Default)]
pub struct PageEdits {
    /// `meta[name=...]` elements to drop
    pub remove_meta: FxHashSet<String>,
    /// Drop every `div.section-metadata.comment` with its subtree
    pub remove_comment_blocks: bool,
    /// Raw HTML inserted before `</head>`
    pub head_append: Vec<String>,
    /// Raw HTML inserted before the first `</h1>`
    pub h1_append: Vec<String>,
}

impl PageEdits {
    pub fn is_empty(&self) -> bool {
        self.remove_meta.is_empty()
            && !self.remove_comment_blocks
            && self.head_append.is_empty()
            && self.h1_append.is_empty()
    }

    pub fn remove_meta(&mut self, name: impl Into<String>) {
        self.remove_meta.insert(name.into());
    }

    pub fn append_to_head(&mut self, html: impl Into<String>) {
        self.head_append.push(html.into());
    }

    pub fn append_to_first_h1(&mut self, html: impl Into<String>) {
        self.h1_append.push(html.into());
    }

    fn drops_meta(&self, elem: &BytesStart<'_>) -> bool {
        !self.remove_meta.is_empty()
            && attr(elem, "name").is_some_and(|n| self.remove_meta.contains(&n))
    }

    fn drops_div(&self, elem: &BytesStart<'_>) -> bool {
        self.remove_comment_blocks && has_classes(elem, COMMENT_BLOCK_CLASSES)
    }
}

/// Progress through the first `<h1>`.
#[derive(Clone, Copy)]
enum H1State {
    Before,
    /// Inside the first `<h1>`, at this nesting depth of `h1` tags
    Inside(usize),
    Done,
}

/// Apply `edits` to `html`. An empty plan returns the input unchanged.
pub fn apply_edits(html: &[u8], edits: &PageEdits) -> Result<Vec<u8>> {
    if edits.is_empty() {
        return Ok(html.to_vec());
    }

    let mut writer = Writer::new(Cursor::new(Vec::with_capacity(html.len() + 1024)));
    let mut reader = create_html_reader(html);

    let mut head_written = edits.head_append.is_empty();
    let mut h1 = H1State::Before;
    // A dropped `<meta ...>` written as a start tag may carry a `</meta>`
    let mut dropped_meta_open = false;

    loop {
        let event = reader.read_event();
        let was_dropped_meta = std::mem::take(&mut dropped_meta_open);

        match event {
            Ok(Event::Start(elem)) => match tag_name(&elem).as_str() {
                "meta" if edits.drops_meta(&elem) => dropped_meta_open = true,
                "div" if edits.drops_div(&elem) => {
                    reader.read_to_end(elem.name())?;
                }
                name if RAW_TEXT_ELEMENTS.contains(&name) => {
                    let raw = take_raw_text(&mut reader, name);
                    writer.write_event(Event::Start(elem))?;
                    writer.get_mut().write_all(raw)?;
                }
                name => {
                    if name == "h1" {
                        h1 = match h1 {
                            H1State::Before => H1State::Inside(1),
                            H1State::Inside(depth) => H1State::Inside(depth + 1),
                            H1State::Done => H1State::Done,
                        };
                    }
                    writer.write_event(Event::Start(elem))?;
                }
            },
            Ok(Event::Empty(elem)) => match tag_name(&elem).as_str() {
                "meta" if edits.drops_meta(&elem) => {}
                "div" if edits.drops_div(&elem) => {}
                _ => writer.write_event(Event::Empty(elem))?,
            },
            Ok(Event::End(elem)) => {
                let name =
                    String::from_utf8_lossy(elem.local_name().as_ref()).to_ascii_lowercase();
                match name.as_str() {
                    "meta" if was_dropped_meta => continue,
                    "head" | "body" | "html" if !head_written => {
                        write_raw(&mut writer, &edits.head_append)?;
                        head_written = true;
                    }
                    "h1" => {
                        h1 = match h1 {
                            H1State::Inside(1) => {
                                write_raw(&mut writer, &edits.h1_append)?;
                                H1State::Done
                            }
                            H1State::Inside(depth) => H1State::Inside(depth - 1),
                            other => other,
                        };
                    }
                    _ => {}
                }
                writer.write_event(Event::End(elem))?;
            }
            Ok(Event::Eof) => break,
            Ok(event) => writer.write_event(event)?,
            Err(e) => bail!(
                "HTML parse error at position {}: {:?}",
                reader.error_position(),
                e
            ),
        }
    }

    // Documents without `</head>`, `</body>` or `</html>`
    if !head_written {
        write_raw(&mut writer, &edits.head_append)?;
    }

    Ok(writer.into_inner().into_inner())
}

fn write_raw(writer: &mut HtmlWriter, fragments: &[String]) -> Result<()> {
    for fragment in fragments {
        writer.get_mut().write_all(fragment.as_bytes())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(html: &str, edits: &PageEdits) -> String {
        String::from_utf8(apply_edits(html.as_bytes(), edits).unwrap()).unwrap()
    }

    #[test]
    fn test_empty_plan_is_identity() {
        let html = "<html><head><meta name=x></head><body>a &amp; b</body></html>";
        assert_eq!(apply(html, &PageEdits::default()), html);
    }

    #[test]
    fn test_untouched_markup_round_trips() {
        let html = "<html lang=\"en\"><head><!-- note -->\n<meta charset=\"utf-8\"><title>T</title></head>\n<body><p class=a>x &amp; y&nbsp;z</p><br/></body></html>";
        let mut edits = PageEdits::default();
        edits.remove_meta("absent");
        assert_eq!(apply(html, &edits), html);
    }

    #[test]
    fn test_remove_meta_by_name() {
        let html = r#"<head><meta name="json-ld" content="owner"><meta name="keep" content="1"><meta name="longdescription" content="x"/></head>"#;
        let mut edits = PageEdits::default();
        edits.remove_meta("json-ld");
        edits.remove_meta("longdescription");
        assert_eq!(
            apply(html, &edits),
            r#"<head><meta name="keep" content="1"></head>"#
        );
    }

    #[test]
    fn test_remove_meta_with_explicit_end_tag() {
        let html = r#"<head><meta name="pageauthor" content="x"></meta><title>T</title></head>"#;
        let mut edits = PageEdits::default();
        edits.remove_meta("pageauthor");
        assert_eq!(apply(html, &edits), "<head><title>T</title></head>");
    }

    #[test]
    fn test_remove_comment_blocks_with_subtree() {
        let html = r#"<main><p>keep</p><div class="section-metadata comment"><div><p>note</p></div></div><div class="section-metadata"><p>meta</p></div></main>"#;
        let edits = PageEdits {
            remove_comment_blocks: true,
            ..PageEdits::default()
        };
        assert_eq!(
            apply(html, &edits),
            r#"<main><p>keep</p><div class="section-metadata"><p>meta</p></div></main>"#
        );
    }

    #[test]
    fn test_append_to_head() {
        let mut edits = PageEdits::default();
        edits.append_to_head("<script>1</script>");
        assert_eq!(
            apply("<html><head><title>T</title></head><body></body></html>", &edits),
            "<html><head><title>T</title><script>1</script></head><body></body></html>"
        );
    }

    #[test]
    fn test_append_without_head_goes_before_body_end() {
        let mut edits = PageEdits::default();
        edits.append_to_head("<script>1</script>");
        assert_eq!(
            apply("<body><p>x</p></body>", &edits),
            "<body><p>x</p><script>1</script></body>"
        );
        assert_eq!(apply("<p>x</p>", &edits), "<p>x</p><script>1</script>");
    }

    #[test]
    fn test_raw_text_elements_copied_verbatim() {
        let html = "<html><head><script>if (a<b && c) { go(); }</script><style>a>b{x:1}</style></head><body><main><h1>Title</h1><p>Tom & Jerry, R&D</p></main></body></html>";
        let mut edits = PageEdits::default();
        edits.append_to_head("<meta name=x>");
        edits.append_to_first_h1("<i>by</i>");
        assert_eq!(
            apply(html, &edits),
            "<html><head><script>if (a<b && c) { go(); }</script><style>a>b{x:1}</style><meta name=x></head><body><main><h1>Title<i>by</i></h1><p>Tom & Jerry, R&D</p></main></body></html>"
        );
    }

    #[test]
    fn test_append_to_first_h1_only() {
        let mut edits = PageEdits::default();
        edits.append_to_first_h1(r#"<div class="byLine">by</div>"#);
        assert_eq!(
            apply("<h1>One</h1><h1>Two</h1>", &edits),
            r#"<h1>One<div class="byLine">by</div></h1><h1>Two</h1>"#
        );
    }
}

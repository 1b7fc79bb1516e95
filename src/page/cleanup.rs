//! Editorial markup removed before publishing.

use super::rewrite::PageEdits;

/// Drop every `div.section-metadata.comment` block.
pub fn remove_comment_blocks(edits: &mut PageEdits) {
    edits.remove_comment_blocks = true;
}

/// Drop the editorial `<meta name=...>` directives listed in `names`.
pub fn remove_editorial_meta(edits: &mut PageEdits, names: &[String]) {
    for name in names {
        edits.remove_meta(name.as_str());
    }
}

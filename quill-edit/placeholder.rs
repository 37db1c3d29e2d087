//! Placeholder hint for an empty note.

use quill_text::{
  Tendril,
  document::Document,
};

pub const PLACEHOLDER_CLASS: &str = "empty";

/// A styling hint the renderer attaches to a document range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoration {
  pub from:        usize,
  pub to:          usize,
  pub css_class:   &'static str,
  pub placeholder: Tendril,
}

/// Pure view of the document: one placeholder decoration when the note is
/// a single empty text block, nothing otherwise.
pub fn decorations(doc: &Document, placeholder: &str) -> Vec<Decoration> {
  if doc.len_chars() > 0 {
    return Vec::new();
  }

  vec![Decoration {
    from:        0,
    to:          0,
    css_class:   PLACEHOLDER_CLASS,
    placeholder: placeholder.into(),
  }]
}

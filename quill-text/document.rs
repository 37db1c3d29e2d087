//! The note document: rope-backed text plus the session's single cursor.
//!
//! This is the capability surface the editing extensions consume:
//!
//! - [`Document::selection`] / [`Document::set_selection`]
//! - [`Document::text_before`] - text from the start of the cursor's block
//!   (line) up to a position
//! - [`Document::apply`] - apply one atomic [`Transaction`]; the selection
//!   either comes from the transaction or is mapped through its changes
//!
//! Extensions never mutate the rope directly; every edit is a transaction
//! so its changeset can be replayed as a position mapping afterwards.

use std::borrow::Cow;

use ropey::Rope;
use thiserror::Error;

use crate::{
  selection::Range,
  transaction::{
    Transaction,
    TransactionError,
  },
};

pub type Result<T> = std::result::Result<T, DocumentError>;

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum DocumentError {
  #[error("selection {from}..{to} is out of bounds for document length {len}")]
  SelectionOutOfBounds {
    from: usize,
    to:   usize,
    len:  usize,
  },
  #[error(transparent)]
  Transaction(#[from] TransactionError),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Document {
  text:      Rope,
  selection: Range,
}

impl Document {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn text(&self) -> &Rope {
    &self.text
  }

  pub fn len_chars(&self) -> usize {
    self.text.len_chars()
  }

  pub fn selection(&self) -> Range {
    self.selection
  }

  pub fn set_selection(&mut self, selection: Range) -> Result<()> {
    self.ensure_in_bounds(selection)?;
    self.selection = selection;
    Ok(())
  }

  pub fn char_at(&self, pos: usize) -> Option<char> {
    self.text.get_char(pos)
  }

  /// Start of the text block (line) containing `pos`.
  pub fn block_start(&self, pos: usize) -> usize {
    let pos = pos.min(self.text.len_chars());
    let line = self.text.char_to_line(pos);
    self.text.line_to_char(line)
  }

  /// Text between the start of the block containing `pos` and `pos`.
  pub fn text_before(&self, pos: usize) -> Cow<'_, str> {
    let pos = pos.min(self.text.len_chars());
    Cow::from(self.text.slice(self.block_start(pos)..pos))
  }

  /// Apply one atomic transaction. The transaction's explicit selection
  /// wins; otherwise the current selection is mapped through the changes.
  pub fn apply(&mut self, transaction: &Transaction) -> Result<()> {
    transaction.apply(&mut self.text)?;

    match transaction.selection() {
      Some(selection) => {
        self.ensure_in_bounds(selection)?;
        self.selection = selection;
      },
      None => self.selection = self.selection.map(transaction.changes())?,
    }

    Ok(())
  }

  fn ensure_in_bounds(&self, selection: Range) -> Result<()> {
    let len = self.text.len_chars();
    if selection.to() > len {
      return Err(DocumentError::SelectionOutOfBounds {
        from: selection.from(),
        to: selection.to(),
        len,
      });
    }
    Ok(())
  }
}

impl From<&str> for Document {
  fn from(text: &str) -> Self {
    Self {
      text:      Rope::from(text),
      selection: Range::point(0),
    }
  }
}

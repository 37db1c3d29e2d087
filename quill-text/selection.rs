//! The editing cursor.
//!
//! A note session holds exactly one [`Range`]: `head` is where the cursor
//! visually sits, `anchor` is the other end of the selection. When
//! `anchor == head` the range is a collapsed caret.
//!
//! ```text
//! anchor=2, head=7: "he[llo w]orld"  (forward selection)
//! anchor=7, head=2: "he]llo w[orld"  (backward selection)
//! anchor=5, head=5: "hello|world"    (caret)
//! ```
//!
//! `from()` and `to()` return the bounds regardless of direction. After an
//! edit that carries no explicit selection, [`Range::map`] translates the
//! range into the new document: a caret follows text inserted at its
//! position, a span excludes text inserted at either edge.

use crate::transaction::{
  Assoc,
  ChangeSet,
  Result,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Range {
  pub anchor: usize,
  pub head:   usize,
}

impl Range {
  pub fn new(anchor: usize, head: usize) -> Self {
    Self { anchor, head }
  }

  /// A collapsed caret.
  #[inline]
  pub fn point(head: usize) -> Self {
    Self::new(head, head)
  }

  /// Start of the range.
  #[inline]
  #[must_use]
  pub fn from(&self) -> usize {
    std::cmp::min(self.anchor, self.head)
  }

  /// End of the range.
  #[inline]
  #[must_use]
  pub fn to(&self) -> usize {
    std::cmp::max(self.anchor, self.head)
  }

  /// Length of the range.
  #[inline]
  #[must_use]
  pub fn len(&self) -> usize {
    self.to() - self.from()
  }

  /// When the head and anchor are in the same position, we have no
  /// selection.
  #[inline]
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.anchor == self.head
  }

  /// Map this range through a set of changes. A caret associates forward;
  /// a span keeps text inserted exactly at its edges outside itself.
  pub fn map(self, changes: &ChangeSet) -> Result<Self> {
    if changes.is_empty() {
      return Ok(self);
    }

    if self.is_empty() {
      let pos = changes.map_pos(self.head, Assoc::After)?;
      return Ok(Self::point(pos));
    }

    let from = changes.map_pos(self.from(), Assoc::After)?;
    let to = changes.map_pos(self.to(), Assoc::Before)?;
    let (from, to) = if from <= to { (from, to) } else { (to, to) };

    Ok(if self.head >= self.anchor {
      Self::new(from, to)
    } else {
      Self::new(to, from)
    })
  }
}

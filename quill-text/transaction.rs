//! Edit primitives for the note document.
//!
//! Changes to the text are represented as a sequence of [`Operation`]s:
//!
//! - **Retain(n)** - Keep `n` characters unchanged
//! - **Delete(n)** - Remove `n` characters
//! - **Insert(s)** - Insert string `s`
//!
//! Operations apply sequentially from the start of the document. A
//! [`ChangeSet`] is a list of operations that transforms a document of one
//! specific length into a new document; it refuses to apply against a
//! document of any other length.
//!
//! # Position Mapping
//!
//! After an edit, every position recorded against the old document (cursors,
//! tracked delimiter regions) must be translated into the new document. The
//! [`Assoc`] bias decides what happens to a position that sits exactly where
//! text was inserted:
//!
//! - **Before** - the position stays in front of the inserted text
//! - **After** - the position moves past the inserted text
//!
//! Positions inside a deleted span collapse to the deletion start.
//!
//! ```ignore
//! // Insert "!!" at position 4 of an 8-char document.
//! assert_eq!(cs.map_pos(4, Assoc::Before)?, 4);
//! assert_eq!(cs.map_pos(4, Assoc::After)?, 6);
//! ```
//!
//! # Transactions
//!
//! A [`Transaction`] bundles a [`ChangeSet`] with an optional explicit
//! selection for the post-edit document. Build one from `(from, to,
//! replacement)` triples with [`Transaction::change`]; ranges must be sorted
//! and non-overlapping.

use ropey::{
  Rope,
  RopeSlice,
};
use thiserror::Error;

use crate::{
  Tendril,
  selection::Range,
};

pub type Result<T> = std::result::Result<T, TransactionError>;

/// (from, to) replacement.
pub type Change = (usize, usize, Option<Tendril>);

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransactionError {
  #[error("changeset length mismatch: expected {expected}, got {actual}")]
  LengthMismatch { expected: usize, actual: usize },
  #[error("invalid change range: start {from} is after end {to}")]
  InvalidRange { from: usize, to: usize },
  #[error("change range {from}..{to} is out of bounds for document length {len}")]
  RangeOutOfBounds {
    from: usize,
    to:   usize,
    len:  usize,
  },
  #[error("change range {from}..{to} overlaps previous end {prev_end}")]
  OverlappingRange {
    prev_end: usize,
    from:     usize,
    to:       usize,
  },
  #[error("position {pos} is out of bounds for changeset length {len}")]
  PositionOutOfBounds { pos: usize, len: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
  /// Move past n characters.
  Retain(usize),

  /// Delete n characters.
  Delete(usize),

  /// Insert text at position.
  Insert(Tendril),
}

/// Which side a mapped position associates with when text is inserted
/// exactly at that position.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Assoc {
  Before,
  After,
}

impl Assoc {
  fn insert_offset(self, inserted: usize) -> usize {
    match self {
      Assoc::Before => 0,
      Assoc::After => inserted,
    }
  }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChangeSet {
  pub(crate) changes: Vec<Operation>,
  /// The required document length. Will refuse to apply changes unless it
  /// matches.
  len:                usize,
  len_after:          usize,
}

impl ChangeSet {
  pub fn with_capacity(capacity: usize) -> Self {
    Self {
      changes:   Vec::with_capacity(capacity),
      len:       0,
      len_after: 0,
    }
  }

  #[must_use]
  pub fn new(doc: RopeSlice) -> Self {
    let len = doc.len_chars();
    Self {
      changes: Vec::new(),
      len,
      len_after: len,
    }
  }

  /// Returns the expected document length for this changeset.
  pub fn len(&self) -> usize {
    self.len
  }

  /// Returns the document length after this changeset is applied.
  pub fn len_after(&self) -> usize {
    self.len_after
  }

  // Changeset builder operations: delete/insert/retain.
  //

  pub fn delete(&mut self, n: usize) {
    use Operation::*;

    if n == 0 {
      return;
    }

    self.len += n;

    if let Some(Delete(count)) = self.changes.last_mut() {
      *count += n;
    } else {
      self.changes.push(Delete(n))
    }
  }

  pub fn insert(&mut self, fragment: Tendril) {
    use Operation::*;

    if fragment.is_empty() {
      return;
    }

    self.len_after += fragment.chars().count();

    let new_last = match self.changes.as_mut_slice() {
      [.., Insert(prev)] | [.., Insert(prev), Delete(_)] => {
        prev.push_str(&fragment);
        return;
      },
      [.., last @ Delete(_)] => std::mem::replace(last, Insert(fragment)),
      _ => Insert(fragment),
    };

    self.changes.push(new_last);
  }

  pub fn retain(&mut self, n: usize) {
    use Operation::*;

    if n == 0 {
      return;
    }

    self.len += n;
    self.len_after += n;

    if let Some(Retain(count)) = self.changes.last_mut() {
      *count += n;
    } else {
      self.changes.push(Retain(n))
    }
  }

  fn ensure_len(&self, text_len: usize) -> Result<()> {
    if text_len != self.len {
      return Err(TransactionError::LengthMismatch {
        expected: self.len,
        actual:   text_len,
      });
    }
    Ok(())
  }

  /// Apply this changeset in-place.
  pub fn apply(&self, text: &mut Rope) -> Result<()> {
    self.ensure_len(text.len_chars())?;
    let mut pos = 0;

    for change in &self.changes {
      use Operation::*;
      match change {
        Retain(n) => pos += n,
        Delete(n) => text.remove(pos..pos + *n),
        Insert(s) => {
          text.insert(pos, s);
          pos += s.chars().count();
        },
      }
    }

    Ok(())
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.changes.is_empty() || self.changes == [Operation::Retain(self.len)]
  }

  /// Map a position through the changes.
  ///
  /// `assoc` indicates which side to associate the position with. `Before`
  /// keeps the position close to the character before it, placing it in
  /// front of insertions at that point. `After` moves it forward, placing it
  /// at the end of such insertions.
  pub fn map_pos(&self, pos: usize, assoc: Assoc) -> Result<usize> {
    use Operation::*;

    if pos > self.len {
      return Err(TransactionError::PositionOutOfBounds { pos, len: self.len });
    }
    if self.changes.is_empty() {
      return Ok(pos);
    }

    let mut old_pos = 0;
    let mut new_pos = 0;
    let mut iter = self.changes.iter().peekable();

    while let Some(change) = iter.next() {
      match change {
        Retain(n) => {
          if old_pos + n > pos {
            return Ok(new_pos + (pos - old_pos));
          }
          old_pos += n;
          new_pos += n;
        },
        Delete(n) => {
          // Positions inside a deletion collapse to its start.
          if pos < old_pos + n {
            return Ok(new_pos);
          }
          old_pos += n;
        },
        Insert(s) => {
          let inserted = s.chars().count();

          // a subsequent delete means a replace, consume it
          if let Some(Delete(n)) = iter.peek() {
            let n = *n;
            iter.next();

            if pos < old_pos + n {
              // at the gap the replacement starts from, or tracking inside
              // the replaced span
              if pos == old_pos {
                return Ok(new_pos);
              }
              return Ok(new_pos + assoc.insert_offset(inserted));
            }
            old_pos += n;
            new_pos += inserted;
          } else {
            if pos == old_pos {
              return Ok(new_pos + assoc.insert_offset(inserted));
            }
            new_pos += inserted;
          }
        },
      }
    }

    // pos == self.len
    Ok(new_pos)
  }

  /// The smallest span of the *post-edit* document touched by any
  /// non-retain operation. `None` when the changeset only retains.
  ///
  /// This is the containment probe consumers use to decide which tracked
  /// regions need re-validation without re-scanning the document.
  pub fn changed_range(&self) -> Option<(usize, usize)> {
    use Operation::*;

    let mut new_pos = 0;
    let mut range: Option<(usize, usize)> = None;
    let touch = |range: &mut Option<(usize, usize)>, from: usize, to: usize| {
      match range {
        Some((start, end)) => {
          *start = (*start).min(from);
          *end = (*end).max(to);
        },
        None => *range = Some((from, to)),
      }
    };

    for change in &self.changes {
      match change {
        Retain(n) => new_pos += n,
        Delete(_) => touch(&mut range, new_pos, new_pos),
        Insert(s) => {
          let inserted = s.chars().count();
          touch(&mut range, new_pos, new_pos + inserted);
          new_pos += inserted;
        },
      }
    }

    range
  }
}

impl From<ChangeSet> for Transaction {
  fn from(changes: ChangeSet) -> Self {
    Self {
      changes,
      selection: None,
    }
  }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Transaction {
  changes:   ChangeSet,
  selection: Option<Range>,
}

impl Transaction {
  /// Changes made to the document.
  pub fn changes(&self) -> &ChangeSet {
    &self.changes
  }

  /// When set, explicitly updates the selection.
  pub fn selection(&self) -> Option<Range> {
    self.selection
  }

  /// Apply this transaction in-place.
  pub fn apply(&self, doc: &mut Rope) -> Result<()> {
    self.changes.apply(doc)
  }

  pub fn with_selection(mut self, selection: Range) -> Self {
    self.selection = Some(selection);
    self
  }

  /// Generate a transaction from a set of changes. Ranges must be sorted by
  /// position and non-overlapping.
  pub fn change<I>(doc: &Rope, changes: I) -> Result<Self>
  where
    I: IntoIterator<Item = Change>,
  {
    let len = doc.len_chars();
    let changes = changes.into_iter();
    let (lower, upper) = changes.size_hint();
    let size = upper.unwrap_or(lower);
    let mut changeset = ChangeSet::with_capacity(2 * size + 1); // rough estimate

    let mut last = 0;
    for (from, to, tendril) in changes {
      if from > to {
        return Err(TransactionError::InvalidRange { from, to });
      }
      if to > len {
        return Err(TransactionError::RangeOutOfBounds { from, to, len });
      }
      if from < last {
        return Err(TransactionError::OverlappingRange {
          prev_end: last,
          from,
          to,
        });
      }

      // Retain from last "to" to current "from"
      changeset.retain(from - last);
      let span = to - from;
      match tendril {
        Some(text) => {
          changeset.insert(text);
          changeset.delete(span);
        },
        None => changeset.delete(span),
      }
      last = to;
    }

    changeset.retain(len - last);

    Ok(Self::from(changeset))
  }

  /// Insert text at a single position.
  pub fn insert(doc: &Rope, at: usize, text: Tendril) -> Result<Self> {
    Self::change(doc, vec![(at, at, Some(text))])
  }

  /// Delete a single range.
  pub fn delete(doc: &Rope, from: usize, to: usize) -> Result<Self> {
    Self::change(doc, vec![(from, to, None)])
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn map_pos_through_insert() {
    use Operation::*;

    let cs = ChangeSet {
      changes:   vec![Retain(4), Insert("!!".into()), Retain(4)],
      len:       8,
      len_after: 10,
    };

    assert_eq!(cs.map_pos(0, Assoc::Before).unwrap(), 0); // before insert region
    assert_eq!(cs.map_pos(4, Assoc::Before).unwrap(), 4); // at insert, track before
    assert_eq!(cs.map_pos(4, Assoc::After).unwrap(), 6); // at insert, track after
    assert_eq!(cs.map_pos(5, Assoc::Before).unwrap(), 7); // after insert region
    assert_eq!(cs.map_pos(8, Assoc::Before).unwrap(), 10); // document end
  }

  #[test]
  fn map_pos_through_delete() {
    use Operation::*;

    let cs = ChangeSet {
      changes:   vec![Retain(4), Delete(4), Retain(4)],
      len:       12,
      len_after: 8,
    };

    assert_eq!(cs.map_pos(0, Assoc::Before).unwrap(), 0); // at start
    assert_eq!(cs.map_pos(4, Assoc::Before).unwrap(), 4); // before a delete
    assert_eq!(cs.map_pos(5, Assoc::Before).unwrap(), 4); // inside a delete
    assert_eq!(cs.map_pos(5, Assoc::After).unwrap(), 4); // inside a delete
    assert_eq!(cs.map_pos(9, Assoc::Before).unwrap(), 5); // past the delete
  }

  #[test]
  fn map_pos_through_replacement() {
    let doc = Rope::from("hello world");
    let tx = Transaction::change(&doc, vec![(6, 11, Some("rust".into()))]).unwrap();
    let cs = tx.changes();

    assert_eq!(cs.map_pos(6, Assoc::Before).unwrap(), 6); // at the gap
    assert_eq!(cs.map_pos(6, Assoc::After).unwrap(), 6);
    assert_eq!(cs.map_pos(8, Assoc::Before).unwrap(), 6); // inside, track before
    assert_eq!(cs.map_pos(8, Assoc::After).unwrap(), 10); // inside, track after
    assert_eq!(cs.map_pos(11, Assoc::Before).unwrap(), 10); // right after
  }

  #[test]
  fn map_pos_identity_for_empty_changes() {
    let cs = ChangeSet::new(Rope::from("hello").slice(..));
    assert_eq!(cs.map_pos(0, Assoc::Before).unwrap(), 0);
    assert_eq!(cs.map_pos(3, Assoc::After).unwrap(), 3);
    assert_eq!(cs.map_pos(5, Assoc::Before).unwrap(), 5);
    assert_eq!(
      cs.map_pos(6, Assoc::Before),
      Err(TransactionError::PositionOutOfBounds { pos: 6, len: 5 })
    );
  }

  #[test]
  fn transaction_change() {
    let mut doc = Rope::from("hello world!\ntest 123");
    let transaction = Transaction::change(
      &doc,
      // (1, 1, None) is a useless 0-width delete that gets factored out
      vec![(1, 1, None), (6, 11, Some("void".into())), (12, 17, None)],
    )
    .unwrap();
    transaction.apply(&mut doc).unwrap();
    assert_eq!(doc.to_string(), "hello void! 123");
  }

  #[test]
  fn transaction_rejects_overlap_and_bounds() {
    let doc = Rope::from("abcdef");
    assert_eq!(
      Transaction::change(&doc, vec![(0, 3, None), (2, 4, None)]),
      Err(TransactionError::OverlappingRange {
        prev_end: 3,
        from:     2,
        to:       4,
      })
    );
    assert_eq!(
      Transaction::change(&doc, vec![(4, 9, None)]),
      Err(TransactionError::RangeOutOfBounds {
        from: 4,
        to:   9,
        len:  6,
      })
    );
    assert_eq!(
      Transaction::change(&doc, vec![(3, 1, None)]),
      Err(TransactionError::InvalidRange { from: 3, to: 1 })
    );
  }

  #[test]
  fn apply_rejects_length_mismatch() {
    let doc = Rope::from("abcdef");
    let tx = Transaction::delete(&doc, 0, 2).unwrap();
    let mut other = Rope::from("xy");
    assert_eq!(
      tx.apply(&mut other),
      Err(TransactionError::LengthMismatch {
        expected: 6,
        actual:   2,
      })
    );
  }

  #[test]
  fn changed_range_spans_edits() {
    let doc = Rope::from("hello world");

    // pure insert at 5: touched span is the inserted text, in new coords
    let tx = Transaction::insert(&doc, 5, "!!".into()).unwrap();
    assert_eq!(tx.changes().changed_range(), Some((5, 7)));

    // pure delete at 0..2: touched point is the deletion site
    let tx = Transaction::delete(&doc, 0, 2).unwrap();
    assert_eq!(tx.changes().changed_range(), Some((0, 0)));

    // no-op transaction touches nothing
    let tx = Transaction::change(&doc, vec![]).unwrap();
    assert_eq!(tx.changes().changed_range(), None);

    // replacement + later delete spans both
    let tx = Transaction::change(&doc, vec![(0, 1, Some("HE".into())), (6, 11, None)]).unwrap();
    assert_eq!(tx.changes().changed_range(), Some((0, 7)));
  }

  quickcheck::quickcheck! {
      fn insert_preserves_lengths(text: String, at: usize, fragment: String) -> bool {
          let doc = Rope::from(text.as_str());
          let at = at % (doc.len_chars() + 1);
          let tx = Transaction::insert(&doc, at, Tendril::from(fragment.as_str())).unwrap();
          let mut out = doc.clone();
          tx.apply(&mut out).unwrap();
          out.len_chars() == doc.len_chars() + fragment.chars().count()
              && tx.changes().len_after() == out.len_chars()
      }
  }
}

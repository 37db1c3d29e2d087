//! Automatic bracket and quote pairing with tracked pair regions.
//!
//! When the user types an opening character like `(`, the closer can:
//!
//! 1. **Insert pair** - Insert both `(` and `)`, placing the caret between
//!    them; a non-empty selection is wrapped instead and stays selected
//! 2. **Skip close** - If the very next character is the tracked closing
//!    delimiter, just move past it instead of inserting
//! 3. **No action** - Fall through to normal typing
//!
//! Unlike closers that guess from the surrounding text alone, skipping and
//! atomic deletion only ever apply to pairs this module inserted itself.
//! Every inserted pair is recorded in a [`PairRegistry`] entry and the
//! registry is revalidated against the change mapping of *every*
//! transaction, so entries survive arbitrary concurrent edits or are
//! dropped the moment their delimiters stop being real.
//!
//! # Registry lifecycle
//!
//! An entry `{ open, start, end }` (with `end` one past the closing
//! delimiter) lives until:
//!
//! - an edit leaves `doc[start] != open` or `doc[end-1] != close`, or
//! - the cursor leaves the open interval `(start, end)`, or
//! - the registry outgrows [`MAX_TRACKED_PAIRS`] entries (oldest goes
//!   first).
//!
//! Revalidation is cheap: entries are remapped through the changeset, and
//! only those whose span intersects [`ChangeSet::changed_range`] re-read
//! any document text. It also never fails - an entry that cannot be
//! remapped is simply dropped.
//!
//! # Symmetric delimiters
//!
//! Quotes and backticks close themselves, so the same keystroke must pick
//! between skipping a tracked close and opening a fresh pair: a tracked
//! entry closing right after the caret wins, anything else inserts.

use std::collections::VecDeque;

use quill_core::chars::char_is_blank;
use quill_text::{
  Tendril,
  document::Document,
  selection::Range,
  transaction::{
    Assoc,
    ChangeSet,
    Result,
    Transaction,
  },
};

/// Upper bound on simultaneously tracked pairs. Oldest entries are evicted
/// first.
pub const MAX_TRACKED_PAIRS: usize = 24;

pub const DEFAULT_PAIRS: &[(char, char)] = &[
  ('(', ')'),
  ('[', ']'),
  ('{', '}'),
  ('<', '>'),
  ('"', '"'),
  ('\'', '\''),
  ('`', '`'),
];

/// Represents the config for a particular pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pair {
  pub open:  char,
  pub close: char,
}

impl Pair {
  /// true if open == close
  pub fn same(&self) -> bool {
    self.open == self.close
  }
}

impl From<(char, char)> for Pair {
  fn from((open, close): (char, char)) -> Self {
    Self { open, close }
  }
}

impl From<&(char, char)> for Pair {
  fn from(&(open, close): &(char, char)) -> Self {
    Self::from((open, close))
  }
}

/// The fixed set of delimiters the closer reacts to.
#[derive(Debug, Clone)]
pub struct PairSet(Vec<Pair>);

impl PairSet {
  pub fn new<V, A>(pairs: V) -> Self
  where
    V: IntoIterator<Item = A>,
    A: Into<Pair>,
  {
    Self(pairs.into_iter().map(Into::into).collect())
  }

  pub fn pairs(&self) -> &[Pair] {
    &self.0
  }

  pub fn close_for(&self, open: char) -> Option<char> {
    self
      .0
      .iter()
      .find(|pair| pair.open == open)
      .map(|pair| pair.close)
  }

  pub fn is_opening(&self, ch: char) -> bool {
    self.0.iter().any(|pair| pair.open == ch)
  }

  pub fn is_closing(&self, ch: char) -> bool {
    self.0.iter().any(|pair| pair.close == ch)
  }
}

impl Default for PairSet {
  fn default() -> Self {
    PairSet::new(DEFAULT_PAIRS.iter().copied())
  }
}

/// One tracked pair region. Positions are in current-document coordinates;
/// `end` is one past the closing delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairEntry {
  pub open:  char,
  pub start: usize,
  pub end:   usize,
}

/// Bounded FIFO of tracked pair regions, owned by exactly one session.
#[derive(Debug, Default, Clone)]
pub struct PairRegistry {
  entries: VecDeque<PairEntry>,
}

impl PairRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn entries(&self) -> impl Iterator<Item = &PairEntry> {
    self.entries.iter()
  }

  /// Bring the registry up to date with one applied transaction.
  ///
  /// `doc` is the post-edit document (selection included); `created` is the
  /// pair the same transaction inserted, if any, already in post-edit
  /// coordinates. Inconsistencies drop entries, they never fail.
  pub fn revalidate(
    &mut self,
    changes: &ChangeSet,
    doc: &Document,
    created: Option<PairEntry>,
    pairs: &PairSet,
  ) {
    let changed = changes.changed_range();
    let cursor = doc.selection().from();

    self.entries.retain_mut(|entry| {
      // Remap: keep `start` glued to the opening delimiter and `end` glued
      // to one-past-the-closing one when text lands exactly on a boundary.
      let start = match changes.map_pos(entry.start, Assoc::After) {
        Ok(pos) => pos,
        Err(_) => return false,
      };
      let end = match changes.map_pos(entry.end, Assoc::Before) {
        Ok(pos) => pos,
        Err(_) => return false,
      };
      entry.start = start;
      entry.end = end;

      // Only spans the edit touched re-read document text.
      if let Some((changed_start, changed_end)) = changed {
        if changed_start <= entry.end && changed_end >= entry.start {
          let intact = entry.end >= entry.start + 2
            && doc.char_at(entry.start) == Some(entry.open)
            && doc.char_at(entry.end - 1) == pairs.close_for(entry.open);
          if !intact {
            tracing::trace!(start, end, open = %entry.open, "dropping invalidated pair");
            return false;
          }
        }
      }

      // A pair is only live while the cursor is strictly inside it.
      entry.start < cursor && cursor < entry.end
    });

    if let Some(entry) = created {
      self.entries.push_back(entry);
      while self.entries.len() > MAX_TRACKED_PAIRS {
        self.entries.pop_front();
      }
    }
  }

  fn closing_at(&self, cursor: usize, ch: char, pairs: &PairSet) -> Option<PairEntry> {
    self
      .entries
      .iter()
      .find(|entry| entry.end == cursor + 1 && pairs.close_for(entry.open) == Some(ch))
      .copied()
  }

  fn opened_just_before(&self, cursor: usize) -> Option<PairEntry> {
    self
      .entries
      .iter()
      .find(|entry| entry.start + 1 == cursor)
      .copied()
  }
}

/// A pairing edit: the transaction to apply plus the registry marker for a
/// freshly inserted pair.
#[derive(Debug, Clone)]
pub struct PairEdit {
  pub transaction: Transaction,
  pub created:     Option<PairEntry>,
}

/// Decide what a typed delimiter does. Returns `None` for "fall through to
/// normal typing"; the document and registry are left untouched.
pub fn hook(
  doc: &Document,
  ch: char,
  pairs: &PairSet,
  registry: &PairRegistry,
) -> Result<Option<PairEdit>> {
  let selection = doc.selection();
  let cursor = selection.from();
  tracing::trace!(%ch, cursor, "pair hook");

  if let Some(pair) = pairs.pairs().iter().find(|pair| pair.same() && pair.open == ch) {
    // A symmetric delimiter is its own closer: skip a tracked close right
    // after the caret, otherwise open a new pair.
    if skip_target(doc, registry, pairs, cursor, ch).is_some() {
      return Ok(Some(skip_edit(doc, cursor)?));
    }
    return insert_pair(doc, selection, *pair, pairs);
  }

  if let Some(pair) = pairs.pairs().iter().find(|pair| pair.open == ch) {
    return insert_pair(doc, selection, *pair, pairs);
  }

  if pairs.is_closing(ch) && skip_target(doc, registry, pairs, cursor, ch).is_some() {
    return Ok(Some(skip_edit(doc, cursor)?));
  }

  Ok(None)
}

/// Backspace over a freshly inserted, still-empty pair removes both
/// delimiters in one edit. Anything else: default deletion applies.
pub fn delete_hook(doc: &Document, registry: &PairRegistry) -> Result<Option<Transaction>> {
  let selection = doc.selection();
  if !selection.is_empty() {
    return Ok(None);
  }

  let cursor = selection.head;
  let Some(entry) = registry.opened_just_before(cursor) else {
    return Ok(None);
  };
  if entry.end != entry.start + 2 {
    return Ok(None);
  }

  let transaction = Transaction::delete(doc.text(), entry.start, entry.end)?
    .with_selection(Range::point(entry.start));
  Ok(Some(transaction))
}

fn skip_target(
  doc: &Document,
  registry: &PairRegistry,
  pairs: &PairSet,
  cursor: usize,
  ch: char,
) -> Option<PairEntry> {
  if doc.char_at(cursor) != Some(ch) {
    return None;
  }
  registry.closing_at(cursor, ch, pairs)
}

fn skip_edit(doc: &Document, cursor: usize) -> Result<PairEdit> {
  // No text change; the transaction only carries the selection move.
  let transaction =
    Transaction::change(doc.text(), vec![])?.with_selection(Range::point(cursor + 1));
  Ok(PairEdit {
    transaction,
    created: None,
  })
}

/// Insertion only fires at a block start or after a blank or opening
/// delimiter, so a literal quote inside a word (don't) stays single.
fn should_pair(doc: &Document, pairs: &PairSet, pos: usize) -> bool {
  if pos == doc.block_start(pos) {
    return true;
  }
  match doc.char_at(pos - 1) {
    Some(prev) => char_is_blank(prev) || pairs.is_opening(prev),
    None => true,
  }
}

fn insert_pair(
  doc: &Document,
  selection: Range,
  pair: Pair,
  pairs: &PairSet,
) -> Result<Option<PairEdit>> {
  let (from, to) = (selection.from(), selection.to());

  if !should_pair(doc, pairs, from) {
    return Ok(None);
  }

  let inner_len = to - from;
  let mut text = Tendril::new();
  text.push(pair.open);
  if inner_len > 0 {
    for chunk in doc.text().slice(from..to).chunks() {
      text.push_str(chunk);
    }
  }
  text.push(pair.close);

  let next_selection = if inner_len == 0 {
    Range::point(from + 1)
  } else {
    // wrap keeps exactly the original text selected
    Range::new(from + 1, from + 1 + inner_len)
  };

  let transaction =
    Transaction::change(doc.text(), vec![(from, to, Some(text))])?.with_selection(next_selection);
  let created = PairEntry {
    open:  pair.open,
    start: from,
    end:   from + inner_len + 2,
  };
  tracing::debug!(?created, "inserting pair");

  Ok(Some(PairEdit {
    transaction,
    created: Some(created),
  }))
}

#[cfg(test)]
mod test {
  use super::*;

  fn doc_with_cursor(text: &str, cursor: usize) -> Document {
    let mut doc = Document::from(text);
    doc.set_selection(Range::point(cursor)).unwrap();
    doc
  }

  /// Apply a hook edit the way a session would: document first, then
  /// registry upkeep.
  fn apply_edit(doc: &mut Document, registry: &mut PairRegistry, edit: PairEdit, pairs: &PairSet) {
    doc.apply(&edit.transaction).unwrap();
    registry.revalidate(edit.transaction.changes(), doc, edit.created, pairs);
  }

  fn type_plain(doc: &mut Document, registry: &mut PairRegistry, text: &str, pairs: &PairSet) {
    for ch in text.chars() {
      let cursor = doc.selection().from();
      let mut fragment = Tendril::new();
      fragment.push(ch);
      let tx = Transaction::insert(doc.text(), cursor, fragment)
        .unwrap()
        .with_selection(Range::point(cursor + 1));
      doc.apply(&tx).unwrap();
      registry.revalidate(tx.changes(), doc, None, pairs);
    }
  }

  #[test]
  fn test_insert_pair_at_block_start() {
    let pairs = PairSet::default();
    let mut registry = PairRegistry::new();
    let mut doc = doc_with_cursor("", 0);

    let edit = hook(&doc, '(', &pairs, &registry).unwrap().unwrap();
    apply_edit(&mut doc, &mut registry, edit, &pairs);

    assert_eq!(doc.text().to_string(), "()");
    assert_eq!(doc.selection(), Range::point(1));
    assert_eq!(registry.len(), 1);
    let entry = registry.entries().next().unwrap();
    assert_eq!((entry.open, entry.start, entry.end), ('(', 0, 2));
  }

  #[test]
  fn test_no_pair_mid_word() {
    let pairs = PairSet::default();
    let registry = PairRegistry::new();

    // apostrophe inside a contraction stays single
    let doc = doc_with_cursor("don", 3);
    assert!(hook(&doc, '\'', &pairs, &registry).unwrap().is_none());

    // but after a space it pairs
    let doc = doc_with_cursor("don ", 4);
    assert!(hook(&doc, '\'', &pairs, &registry).unwrap().is_some());

    // and after another opening delimiter it pairs too
    let doc = doc_with_cursor("x (", 3);
    assert!(hook(&doc, '[', &pairs, &registry).unwrap().is_some());
  }

  #[test]
  fn test_wrap_selection() {
    let pairs = PairSet::default();
    let mut registry = PairRegistry::new();
    let mut doc = Document::from("abc");
    doc.set_selection(Range::new(0, 3)).unwrap();

    let edit = hook(&doc, '(', &pairs, &registry).unwrap().unwrap();
    apply_edit(&mut doc, &mut registry, edit, &pairs);

    assert_eq!(doc.text().to_string(), "(abc)");
    assert_eq!(doc.selection(), Range::new(1, 4));
    let entry = registry.entries().next().unwrap();
    assert_eq!((entry.start, entry.end), (0, 5));
  }

  #[test]
  fn test_skip_requires_tracked_entry() {
    let pairs = PairSet::default();
    let registry = PairRegistry::new();

    // a ')' that this closer never inserted is not skipped over
    let doc = doc_with_cursor("()", 1);
    assert!(hook(&doc, ')', &pairs, &registry).unwrap().is_none());
  }

  #[test]
  fn test_skip_tracked_close() {
    let pairs = PairSet::default();
    let mut registry = PairRegistry::new();
    let mut doc = doc_with_cursor("", 0);

    let edit = hook(&doc, '(', &pairs, &registry).unwrap().unwrap();
    apply_edit(&mut doc, &mut registry, edit, &pairs);

    let edit = hook(&doc, ')', &pairs, &registry).unwrap().unwrap();
    assert!(edit.created.is_none());
    apply_edit(&mut doc, &mut registry, edit, &pairs);

    assert_eq!(doc.text().to_string(), "()");
    assert_eq!(doc.selection(), Range::point(2));
    // cursor left the pair, so it is no longer tracked
    assert!(registry.is_empty());
  }

  #[test]
  fn test_symmetric_quote_insert_then_skip() {
    let pairs = PairSet::default();
    let mut registry = PairRegistry::new();
    let mut doc = doc_with_cursor("", 0);

    let edit = hook(&doc, '"', &pairs, &registry).unwrap().unwrap();
    apply_edit(&mut doc, &mut registry, edit, &pairs);
    assert_eq!(doc.text().to_string(), "\"\"");

    type_plain(&mut doc, &mut registry, "abc", &pairs);
    assert_eq!(doc.text().to_string(), "\"abc\"");
    assert_eq!(registry.len(), 1);

    // the same keystroke now skips instead of opening a second pair
    let edit = hook(&doc, '"', &pairs, &registry).unwrap().unwrap();
    assert!(edit.created.is_none());
    apply_edit(&mut doc, &mut registry, edit, &pairs);

    assert_eq!(doc.text().to_string(), "\"abc\"");
    assert_eq!(doc.selection(), Range::point(5));
  }

  #[test]
  fn test_delete_empty_pair() {
    let pairs = PairSet::default();
    let mut registry = PairRegistry::new();
    let mut doc = doc_with_cursor("xy ", 3);

    let edit = hook(&doc, '(', &pairs, &registry).unwrap().unwrap();
    apply_edit(&mut doc, &mut registry, edit, &pairs);
    assert_eq!(doc.text().to_string(), "xy ()");

    let tx = delete_hook(&doc, &registry).unwrap().unwrap();
    doc.apply(&tx).unwrap();
    registry.revalidate(tx.changes(), &doc, None, &pairs);

    assert_eq!(doc.text().to_string(), "xy ");
    assert_eq!(doc.selection(), Range::point(3));
    assert!(registry.is_empty());
  }

  #[test]
  fn test_delete_leaves_filled_pair_alone() {
    let pairs = PairSet::default();
    let mut registry = PairRegistry::new();
    let mut doc = doc_with_cursor("", 0);

    let edit = hook(&doc, '(', &pairs, &registry).unwrap().unwrap();
    apply_edit(&mut doc, &mut registry, edit, &pairs);
    type_plain(&mut doc, &mut registry, "a", &pairs);
    assert_eq!(doc.text().to_string(), "(a)");

    // span is 3 chars now; backspace must fall through to default deletion
    let mut doc_after = doc.clone();
    doc_after.set_selection(Range::point(1)).unwrap();
    assert!(delete_hook(&doc_after, &registry).unwrap().is_none());
  }

  #[test]
  fn test_revalidate_shifts_unrelated_inserts() {
    let pairs = PairSet::default();
    let mut registry = PairRegistry::new();
    let mut doc = doc_with_cursor("xx ", 3);

    let edit = hook(&doc, '(', &pairs, &registry).unwrap().unwrap();
    apply_edit(&mut doc, &mut registry, edit, &pairs);
    assert_eq!(doc.text().to_string(), "xx ()");

    // a host edit inserts text before the pair; the entry shifts whole
    let tx = Transaction::insert(doc.text(), 0, "ab".into()).unwrap();
    doc.apply(&tx).unwrap();
    registry.revalidate(tx.changes(), &doc, None, &pairs);

    let entry = registry.entries().next().unwrap();
    assert_eq!((entry.start, entry.end), (5, 7));
    assert_eq!(doc.char_at(entry.start), Some('('));
    assert_eq!(doc.char_at(entry.end - 1), Some(')'));
  }

  #[test]
  fn test_revalidate_drops_overwritten_delimiter() {
    let pairs = PairSet::default();
    let mut registry = PairRegistry::new();
    let mut doc = doc_with_cursor("", 0);

    let edit = hook(&doc, '(', &pairs, &registry).unwrap().unwrap();
    apply_edit(&mut doc, &mut registry, edit, &pairs);
    assert_eq!(registry.len(), 1);

    // overwrite the closing delimiter, keeping the cursor inside
    let tx = Transaction::change(doc.text(), vec![(1, 2, Some("x".into()))])
      .unwrap()
      .with_selection(Range::point(1));
    doc.apply(&tx).unwrap();
    registry.revalidate(tx.changes(), &doc, None, &pairs);

    assert_eq!(doc.text().to_string(), "(x");
    assert!(registry.is_empty());
  }

  #[test]
  fn test_revalidate_drops_on_cursor_exit() {
    let pairs = PairSet::default();
    let mut registry = PairRegistry::new();
    let mut doc = doc_with_cursor("", 0);

    let edit = hook(&doc, '(', &pairs, &registry).unwrap().unwrap();
    apply_edit(&mut doc, &mut registry, edit, &pairs);
    assert_eq!(registry.len(), 1);

    // moving the cursor out (here: to the end) ends tracking, even with no
    // text change
    let tx = Transaction::change(doc.text(), vec![])
      .unwrap()
      .with_selection(Range::point(2));
    doc.apply(&tx).unwrap();
    registry.revalidate(tx.changes(), &doc, None, &pairs);

    assert!(registry.is_empty());
  }

  #[test]
  fn test_capacity_evicts_oldest() {
    let pairs = PairSet::default();
    let mut registry = PairRegistry::new();
    let mut doc = doc_with_cursor("", 0);

    // nested opens keep the cursor inside every earlier pair
    for _ in 0..(MAX_TRACKED_PAIRS + 1) {
      let edit = hook(&doc, '(', &pairs, &registry).unwrap().unwrap();
      apply_edit(&mut doc, &mut registry, edit, &pairs);
    }

    assert_eq!(registry.len(), MAX_TRACKED_PAIRS);
    // the outermost (oldest) pair is the one that was evicted
    let min_start = registry.entries().map(|entry| entry.start).min().unwrap();
    assert_eq!(min_start, 1);
  }
}

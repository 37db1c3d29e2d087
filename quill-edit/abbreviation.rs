//! Abbreviation expansion on a trigger key.
//!
//! The expander looks at the token between the last blank and the caret
//! when the trigger key (space by default) is pressed. A dictionary hit
//! replaces the token and the trigger press with one atomic edit; a miss
//! types the trigger normally and touches nothing.
//!
//! # Matching
//!
//! Dictionary keys are lowercased unless an entry asks for exact-case
//! matching, so `JS`, `Js` and `js` all reach the same entry by default.
//! When an entry *does* require exact casing and only the case-insensitive
//! probe matches, the expander refuses to guess and takes no action.
//!
//! # Dynamic casing
//!
//! With dynamic casing on, the expansion adapts to how the token was
//! typed: `JS` -> `JAVASCRIPT`, `js` -> `javascript`, `Js` -> `Javascript`.
//! Mixed casings that fit none of those shapes use the expansion verbatim.
//!
//! The dictionary is an immutable snapshot: it is rebuilt wholesale from a
//! [`SettingsSnapshot`] and never mutated entry by entry while a session
//! holds it.

use std::collections::HashMap;

use quill_core::chars::char_is_blank;
use quill_text::{
  Tendril,
  case,
  document::Document,
  selection::Range,
  transaction::{
    Result,
    Transaction,
  },
};

use crate::settings::SettingsSnapshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbbreviationEntry {
  pub short: Tendril,
  pub full:  Tendril,
  case_matching: Option<bool>,
  dynamic:       Option<bool>,
}

/// Read-only lookup table from short form to expansion, plus the
/// snapshot-wide flags it was built with.
#[derive(Debug, Default, Clone)]
pub struct Dictionary {
  entries:        HashMap<Tendril, AbbreviationEntry>,
  dynamic_casing: bool,
  case_matching:  bool,
  add_space:      bool,
}

impl Dictionary {
  /// Build a fresh snapshot from raw settings records.
  ///
  /// Both fields are trimmed; records left without a short or a full form
  /// are dropped silently. Later records overwrite earlier ones with the
  /// same key, so re-adding a short form edits it in place.
  pub fn rebuild(snapshot: &SettingsSnapshot) -> Self {
    let mut entries = HashMap::with_capacity(snapshot.abbreviations.len());

    for record in &snapshot.abbreviations {
      let short = record.short.trim();
      let full = record.full.trim();
      if short.is_empty() || full.is_empty() {
        tracing::debug!(?record, "dropping malformed abbreviation record");
        continue;
      }

      let exact = record.case_matching.unwrap_or(snapshot.case_matching);
      let key: Tendril = if exact {
        short.into()
      } else {
        short.to_lowercase().as_str().into()
      };

      entries.insert(key, AbbreviationEntry {
        short:         short.into(),
        full:          full.into(),
        case_matching: record.case_matching,
        dynamic:       record.dynamic,
      });
    }

    Self {
      entries,
      dynamic_casing: snapshot.dynamic_casing,
      case_matching: snapshot.case_matching,
      add_space: snapshot.add_space,
    }
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn add_space(&self) -> bool {
    self.add_space
  }

  /// Raw key access, mainly for inspection.
  pub fn get(&self, key: &str) -> Option<&AbbreviationEntry> {
    self.entries.get(key)
  }

  /// Resolve a typed token. Exact probe first, then case-insensitive; a
  /// case-insensitive hit on an entry that demands exact casing is
  /// ambiguous and resolves to `None`.
  pub fn lookup(&self, typed: &str) -> Option<&AbbreviationEntry> {
    if let Some(entry) = self.entries.get(typed) {
      return Some(entry);
    }

    let lowered = typed.to_lowercase();
    if lowered != typed {
      if let Some(entry) = self.entries.get(lowered.as_str()) {
        if self.requires_exact(entry) {
          tracing::trace!(typed, short = %entry.short, "casing mismatch, not expanding");
          return None;
        }
        return Some(entry);
      }
    }

    None
  }

  fn requires_exact(&self, entry: &AbbreviationEntry) -> bool {
    entry.case_matching.unwrap_or(self.case_matching)
  }

  fn dynamic(&self, entry: &AbbreviationEntry) -> bool {
    entry.dynamic.unwrap_or(self.dynamic_casing)
  }
}

/// Expand the token before the caret, if any. `None` means the trigger key
/// types normally and nothing was touched.
pub fn expand_hook(
  doc: &Document,
  trigger: char,
  dictionary: &Dictionary,
) -> Result<Option<Transaction>> {
  let selection = doc.selection();
  if !selection.is_empty() || dictionary.is_empty() {
    return Ok(None);
  }

  let cursor = selection.head;
  let before = doc.text_before(cursor);
  let typed = last_token(&before);
  if typed.is_empty() {
    return Ok(None);
  }

  let Some(entry) = dictionary.lookup(typed) else {
    return Ok(None);
  };

  let mut replacement = if dictionary.dynamic(entry) {
    adapt_case(typed, &entry.full)
  } else {
    entry.full.clone()
  };
  if dictionary.add_space {
    replacement.push(trigger);
  }

  let from = cursor - typed.chars().count();
  let caret = from + replacement.chars().count();
  tracing::debug!(typed, %replacement, "expanding abbreviation");

  let transaction = Transaction::change(doc.text(), vec![(from, cursor, Some(replacement))])?
    .with_selection(Range::point(caret));
  Ok(Some(transaction))
}

/// Final blank-separated segment; empty when the text ends in a blank.
fn last_token(text: &str) -> &str {
  text.rsplit(char_is_blank).next().unwrap_or("")
}

/// Shape the expansion after the typed token: all-upper, all-lower or
/// leading capital. Tokens without letters, and casings that fit none of
/// those, leave the expansion untouched.
fn adapt_case(typed: &str, full: &str) -> Tendril {
  let mut letters = typed.chars().filter(|c| c.is_alphabetic()).peekable();
  if letters.peek().is_none() {
    return Tendril::from(full);
  }

  if letters.clone().all(char::is_uppercase) {
    return case::to_upper_case(full.chars());
  }
  if letters.all(char::is_lowercase) {
    return case::to_lower_case(full.chars());
  }
  if typed.chars().next().is_some_and(char::is_uppercase) {
    return case::to_title_case(full.chars());
  }

  Tendril::from(full)
}

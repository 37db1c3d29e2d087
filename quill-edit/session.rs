//! One editing session: document, tracked pairs, dictionary snapshot.
//!
//! The session is the explicit replacement for ambient plugin state: it
//! owns exactly one [`Document`], one [`PairRegistry`] and one
//! [`Dictionary`] snapshot, and every mutation funnels through a single
//! apply path so the registry sees the change mapping of every edit -
//! keystroke-driven, host-driven or the synthetic edit a settings update
//! rides in on.
//!
//! Key events come in through [`Session::handle_key`]. `Consumed` means the
//! session applied exactly one atomic transaction; `Pass` means nothing was
//! touched and the host should perform its default editing. The
//! [`Session::type_char`] / [`Session::backspace`] conveniences do that
//! default editing in-process.

use quill_text::{
  Tendril,
  document::{
    Document,
    DocumentError,
  },
  selection::Range,
  transaction::{
    Transaction,
    TransactionError,
  },
};
use thiserror::Error;

use crate::{
  abbreviation::{
    self,
    Dictionary,
  },
  auto_pairs::{
    self,
    PairEntry,
    PairRegistry,
    PairSet,
  },
  dispatch::UpdateDispatcher,
  settings::SettingsSnapshot,
};

pub type Result<T> = std::result::Result<T, SessionError>;

pub const DEFAULT_TRIGGER: char = ' ';

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
  #[error(transparent)]
  Document(#[from] DocumentError),
  #[error(transparent)]
  Transaction(#[from] TransactionError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
  Char(char),
  Backspace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
  /// The session applied one atomic edit; the keystroke is done.
  Consumed,
  /// Nothing happened; the host performs its default editing.
  Pass,
}

#[derive(Debug)]
pub struct Session {
  document:   Document,
  pairs:      PairSet,
  registry:   PairRegistry,
  dictionary: Dictionary,
  trigger:    char,
}

impl Session {
  pub fn new(document: Document, initial: &SettingsSnapshot) -> Self {
    Self {
      document,
      pairs: PairSet::default(),
      registry: PairRegistry::new(),
      dictionary: Dictionary::rebuild(initial),
      trigger: DEFAULT_TRIGGER,
    }
  }

  /// Create a session and consume the dispatcher's pending update, if one
  /// arrived before the session existed. Applied exactly once.
  pub fn attach(
    document: Document,
    initial: &SettingsSnapshot,
    dispatcher: &mut UpdateDispatcher,
  ) -> Result<Self> {
    let mut session = Self::new(document, initial);
    if let Some(snapshot) = dispatcher.take() {
      session.apply_settings(&snapshot)?;
    }
    Ok(session)
  }

  pub fn with_trigger(mut self, trigger: char) -> Self {
    self.trigger = trigger;
    self
  }

  pub fn document(&self) -> &Document {
    &self.document
  }

  pub fn registry(&self) -> &PairRegistry {
    &self.registry
  }

  pub fn dictionary(&self) -> &Dictionary {
    &self.dictionary
  }

  /// Route one key event. Pending settings are drained first so a
  /// configuration change never lands mid-edit.
  pub fn handle_key(
    &mut self,
    dispatcher: &mut UpdateDispatcher,
    key: KeyEvent,
  ) -> Result<KeyDisposition> {
    if let Some(snapshot) = dispatcher.take() {
      self.apply_settings(&snapshot)?;
    }

    match key {
      KeyEvent::Backspace => {
        if let Some(transaction) = auto_pairs::delete_hook(&self.document, &self.registry)? {
          self.apply_with(&transaction, None)?;
          return Ok(KeyDisposition::Consumed);
        }
        Ok(KeyDisposition::Pass)
      },
      KeyEvent::Char(ch) => {
        if ch == self.trigger {
          if let Some(transaction) =
            abbreviation::expand_hook(&self.document, self.trigger, &self.dictionary)?
          {
            self.apply_with(&transaction, None)?;
            return Ok(KeyDisposition::Consumed);
          }
        }

        if let Some(edit) = auto_pairs::hook(&self.document, ch, &self.pairs, &self.registry)? {
          self.apply_with(&edit.transaction, edit.created)?;
          return Ok(KeyDisposition::Consumed);
        }
        Ok(KeyDisposition::Pass)
      },
    }
  }

  /// Handle a typed character, falling back to plain insertion (replacing
  /// any selection) when no extension consumes it.
  pub fn type_char(&mut self, dispatcher: &mut UpdateDispatcher, ch: char) -> Result<()> {
    if self.handle_key(dispatcher, KeyEvent::Char(ch))? == KeyDisposition::Consumed {
      return Ok(());
    }

    let selection = self.document.selection();
    let (from, to) = (selection.from(), selection.to());
    let mut text = Tendril::new();
    text.push(ch);
    let transaction = Transaction::change(self.document.text(), vec![(from, to, Some(text))])?
      .with_selection(Range::point(from + 1));
    self.apply_with(&transaction, None)
  }

  /// Handle backspace, falling back to deleting the selection or the
  /// character before the caret.
  pub fn backspace(&mut self, dispatcher: &mut UpdateDispatcher) -> Result<()> {
    if self.handle_key(dispatcher, KeyEvent::Backspace)? == KeyDisposition::Consumed {
      return Ok(());
    }

    let selection = self.document.selection();
    let (from, to) = if selection.is_empty() {
      if selection.head == 0 {
        return Ok(());
      }
      (selection.head - 1, selection.head)
    } else {
      (selection.from(), selection.to())
    };

    let transaction = Transaction::delete(self.document.text(), from, to)?
      .with_selection(Range::point(from));
    self.apply_with(&transaction, None)
  }

  /// Host-driven edits enter the same path: document first, then the
  /// registry consumes the mapping.
  pub fn apply_edit(&mut self, transaction: &Transaction) -> Result<()> {
    self.apply_with(transaction, None)
  }

  fn apply_with(&mut self, transaction: &Transaction, created: Option<PairEntry>) -> Result<()> {
    self.document.apply(transaction)?;
    self
      .registry
      .revalidate(transaction.changes(), &self.document, created, &self.pairs);
    Ok(())
  }

  /// Swap in a rebuilt dictionary and push an empty transaction through
  /// the apply path, so configuration changes ride the same synchronous
  /// update cycle as keystrokes.
  fn apply_settings(&mut self, snapshot: &SettingsSnapshot) -> Result<()> {
    self.dictionary = Dictionary::rebuild(snapshot);
    tracing::debug!(entries = self.dictionary.len(), "settings update applied");

    let transaction = Transaction::change(self.document.text(), vec![])?;
    self.apply_with(&transaction, None)
  }
}

//! Delivery of asynchronous settings updates into a live session.
//!
//! Settings changes arrive out of band with respect to keystrokes (another
//! tab, the settings form, the initial load). They are never applied
//! mid-edit: the dispatcher is a single-slot mailbox the session drains
//! synchronously at the start of its next edit cycle, and once on attach.
//! Posting while an update is still pending replaces it - only the most
//! recent snapshot is ever applied, stale intermediates are not replayed.

use crate::settings::SettingsSnapshot;

#[derive(Debug, Default)]
pub struct UpdateDispatcher {
  pending: Option<SettingsSnapshot>,
}

impl UpdateDispatcher {
  pub fn new() -> Self {
    Self::default()
  }

  /// Queue a snapshot for the session. Replaces any pending one.
  pub fn post(&mut self, snapshot: SettingsSnapshot) {
    if self.pending.is_some() {
      tracing::trace!("superseding pending settings update");
    }
    self.pending = Some(snapshot);
  }

  /// Consume the pending snapshot, if any.
  pub fn take(&mut self) -> Option<SettingsSnapshot> {
    self.pending.take()
  }

  pub fn has_pending(&self) -> bool {
    self.pending.is_some()
  }
}

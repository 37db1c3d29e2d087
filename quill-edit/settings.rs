//! Settings records as delivered by the persistence collaborator.
//!
//! The storage layer owns validation, debouncing and cross-tab sync; this
//! module only defines the snapshot shape it pushes into a session. Field
//! names mirror the stored camelCase JSON.

use serde::{
  Deserialize,
  Serialize,
};

/// One abbreviation as configured by the user. The optional flags override
/// the snapshot-wide [`SettingsSnapshot::case_matching`] /
/// [`SettingsSnapshot::dynamic_casing`] for this entry only.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AbbreviationRecord {
  pub short: String,
  pub full:  String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub case_matching: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub dynamic: Option<bool>,
}

impl AbbreviationRecord {
  pub fn new(short: impl Into<String>, full: impl Into<String>) -> Self {
    Self {
      short: short.into(),
      full: full.into(),
      ..Self::default()
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsSnapshot {
  pub abbreviations:  Vec<AbbreviationRecord>,
  pub dynamic_casing: bool,
  pub case_matching:  bool,
  pub add_space:      bool,
}

impl Default for SettingsSnapshot {
  fn default() -> Self {
    Self {
      abbreviations:  default_abbreviations(),
      dynamic_casing: false,
      case_matching:  false,
      add_space:      true,
    }
  }
}

/// The seed dictionary a fresh profile starts from.
pub fn default_abbreviations() -> Vec<AbbreviationRecord> {
  vec![
    AbbreviationRecord::new("js", "JavaScript"),
    AbbreviationRecord::new("css", "Cascading Style Sheets"),
    AbbreviationRecord::new("py", "Python"),
    AbbreviationRecord::new("html", "Hypertext Markup Language"),
    AbbreviationRecord::new("abvr", "Abréviation"),
  ]
}

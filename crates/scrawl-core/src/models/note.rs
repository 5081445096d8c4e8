//! Note model

use std::fmt;

use serde::{Deserialize, Serialize};

use super::UserId;
use crate::error::{Error, Result};

/// Opaque note identifier assigned by the remote store at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A persisted text memo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Server-assigned identifier, immutable
    pub id: NoteId,
    /// User-authored content
    pub text: String,
    /// Creator of the note, scopes list queries
    pub owner_id: UserId,
}

impl Note {
    #[must_use]
    pub fn new(id: impl Into<NoteId>, text: impl Into<String>, owner_id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            owner_id: owner_id.into(),
        }
    }

    /// First line of the note, truncated to `max_len` characters
    #[must_use]
    pub fn preview(&self, max_len: usize) -> String {
        self.text
            .lines()
            .next()
            .unwrap_or("")
            .chars()
            .take(max_len)
            .collect()
    }
}

/// Per-note interaction state held next to each note in the manager.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Interaction {
    #[default]
    Viewing,
    Editing {
        draft: String,
    },
}

impl Interaction {
    #[must_use]
    pub const fn is_editing(&self) -> bool {
        matches!(self, Self::Editing { .. })
    }
}

/// Reject text that is empty once trimmed.
///
/// The text itself is returned untouched; only the emptiness check trims.
pub fn validate_note_text(text: &str) -> Result<&str> {
    if text.trim().is_empty() {
        return Err(Error::empty_text());
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_whitespace() {
        assert!(validate_note_text("").is_err());
        assert!(validate_note_text(" \n\t ").is_err());
    }

    #[test]
    fn validate_keeps_text_verbatim() {
        assert_eq!(validate_note_text("  buy milk ").unwrap(), "  buy milk ");
    }

    #[test]
    fn preview_uses_first_line() {
        let note = Note::new("n1", "First line\nSecond line", "u1");
        assert_eq!(note.preview(50), "First line");
        assert_eq!(note.preview(5), "First");
    }

    #[test]
    fn note_id_serializes_as_plain_string() {
        let note = Note::new("n1", "buy milk", "u1");
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "id": "n1", "text": "buy milk", "owner_id": "u1" })
        );
    }

    #[test]
    fn interaction_defaults_to_viewing() {
        assert_eq!(Interaction::default(), Interaction::Viewing);
        assert!(Interaction::Editing {
            draft: String::new()
        }
        .is_editing());
    }
}

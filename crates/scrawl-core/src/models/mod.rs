//! Data models for Scrawl

mod note;
mod session;

pub use note::{validate_note_text, Interaction, Note, NoteId};
pub use session::{Session, UserId};

//! Remote note storage.
//!
//! [`NoteStore`] is the seam between the note manager and whatever actually
//! persists notes. Every call either succeeds with a payload or fails with an
//! [`Error`](crate::Error) carrying a message; there are no retries here.

mod memory;
mod supabase;

use std::future::Future;

pub use memory::{MemoryNoteStore, StoreOp};
pub use supabase::SupabaseNoteStore;

use crate::models::{Note, NoteId, UserId};
use crate::Result;

/// Create/read/update/delete operations offered by the remote store.
pub trait NoteStore: Send + Sync {
    /// All notes owned by `owner`, in the store's insertion order.
    fn list_notes(&self, owner: &UserId) -> impl Future<Output = Result<Vec<Note>>> + Send;

    /// Persist a new note; the returned note carries the assigned id.
    fn create_note(&self, owner: &UserId, text: &str)
        -> impl Future<Output = Result<Note>> + Send;

    /// Replace the text of an existing note.
    fn update_note(&self, id: &NoteId, text: &str) -> impl Future<Output = Result<Note>> + Send;

    fn delete_note(&self, id: &NoteId) -> impl Future<Output = Result<()>> + Send;
}

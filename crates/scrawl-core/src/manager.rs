//! Note manager: the local note list and its reconciliation with the store.
//!
//! Every mutation of the local list happens only after the store has
//! confirmed the corresponding remote call. A failed call leaves the list
//! exactly as it was. Operations borrow the manager mutably for their whole
//! duration, so at most one call is outstanding per manager; dropping an
//! in-flight operation's future discards its result without touching state.

use crate::error::{Error, Result};
use crate::gate::{AuthGate, Route};
use crate::models::{validate_note_text, Interaction, Note, NoteId, Session, UserId};
use crate::store::NoteStore;

/// A note plus its interaction state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteEntry {
    pub note: Note,
    pub interaction: Interaction,
}

impl NoteEntry {
    fn viewing(note: Note) -> Self {
        Self {
            note,
            interaction: Interaction::Viewing,
        }
    }
}

/// Draft text for a note that does not exist yet, plus whether the
/// composer is showing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Composer {
    draft: String,
    open: bool,
}

impl Composer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Composer pre-filled with a draft kept from an earlier attempt.
    #[must_use]
    pub fn with_draft(draft: impl Into<String>) -> Self {
        Self {
            draft: draft.into(),
            open: true,
        }
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    #[must_use]
    pub fn draft(&self) -> &str {
        &self.draft
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    fn clear(&mut self) {
        self.draft.clear();
        self.open = false;
    }
}

/// A delete waiting for the user to confirm or cancel.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a pending delete does nothing until resolved"]
pub struct PendingDelete {
    id: NoteId,
    preview: String,
}

impl PendingDelete {
    #[must_use]
    pub const fn id(&self) -> &NoteId {
        &self.id
    }

    /// Short excerpt of the note to show in the confirmation prompt.
    #[must_use]
    pub fn preview(&self) -> &str {
        &self.preview
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteDecision {
    Cancel,
    Confirm,
}

const DELETE_PREVIEW_CHARS: usize = 40;

pub struct NoteManager<S> {
    store: S,
    entries: Vec<NoteEntry>,
    loaded_for: Option<UserId>,
    last_error: Option<String>,
    fetch_error: Option<String>,
}

impl<S: NoteStore> NoteManager<S> {
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self {
            store,
            entries: Vec::new(),
            loaded_for: None,
            last_error: None,
            fetch_error: None,
        }
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn entries(&self) -> &[NoteEntry] {
        &self.entries
    }

    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.entries.iter().map(|entry| &entry.note)
    }

    #[must_use]
    pub fn get(&self, id: &NoteId) -> Option<&NoteEntry> {
        self.entries.iter().find(|entry| &entry.note.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Message of the most recent failed operation, until dismissed.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Message of the last failed list; kept until a list succeeds.
    #[must_use]
    pub fn fetch_error(&self) -> Option<&str> {
        self.fetch_error.as_deref()
    }

    /// Acknowledge the last error. The sticky fetch error is unaffected.
    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    /// Evaluate the gate and, once signed in, load the user's notes.
    ///
    /// Nothing reaches the store unless the gate yields a session.
    pub async fn activate(&mut self, gate: &AuthGate) -> Result<Route> {
        let route = gate.evaluate();
        if let Route::Notes(session) = &route {
            self.list(session).await?;
        }
        Ok(route)
    }

    /// Replace the local list with the store's notes for this user.
    pub async fn list(&mut self, session: &Session) -> Result<&[NoteEntry]> {
        self.bind_session(session);
        let owner = &session.user_id;

        match self.store.list_notes(owner).await {
            Ok(notes) => {
                let total = notes.len();
                self.entries = notes
                    .into_iter()
                    .filter(|note| &note.owner_id == owner)
                    .map(NoteEntry::viewing)
                    .collect();
                if self.entries.len() != total {
                    tracing::warn!(
                        dropped = total - self.entries.len(),
                        "Dropped notes owned by another user from list response"
                    );
                }
                self.fetch_error = None;
                tracing::info!(count = self.entries.len(), "Loaded notes");
                Ok(&self.entries)
            }
            Err(error) => {
                tracing::warn!("Failed to load notes: {}", error);
                self.fetch_error = Some(error.to_string());
                Err(self.fail(error))
            }
        }
    }

    /// Create a note and append it to the end of the local list.
    pub async fn create(&mut self, session: &Session, text: &str) -> Result<Note> {
        let text = validate_note_text(text).map_err(|error| self.fail(error))?;
        self.bind_session(session);

        let created = self
            .store
            .create_note(&session.user_id, text)
            .await
            .and_then(|note| owned_by(session, note));
        match created {
            Ok(note) => {
                tracing::info!(id = %note.id, "Created note");
                self.entries.push(NoteEntry::viewing(note.clone()));
                self.last_error = None;
                Ok(note)
            }
            Err(error) => {
                tracing::warn!("Failed to create note: {}", error);
                Err(self.fail(error))
            }
        }
    }

    /// Create a note from the composer's draft.
    ///
    /// The draft is cleared and the composer closed only on success; a failed
    /// attempt keeps both so the user can retry.
    pub async fn submit_draft(&mut self, session: &Session, composer: &mut Composer) -> Result<Note> {
        let note = self.create(session, composer.draft()).await?;
        composer.clear();
        Ok(note)
    }

    /// Replace the text of note `id`.
    ///
    /// On success only the `text` of the matching local note changes and the
    /// note returns to viewing.
    pub async fn edit(&mut self, session: &Session, id: &NoteId, new_text: &str) -> Result<Note> {
        let new_text = validate_note_text(new_text).map_err(|error| self.fail(error))?;
        self.bind_session(session);

        let updated = self
            .store
            .update_note(id, new_text)
            .await
            .and_then(|note| owned_by(session, note));
        match updated {
            Ok(updated) => {
                tracing::info!(id = %id, "Updated note");
                if let Some(entry) = self.entry_mut(id) {
                    entry.note.text.clone_from(&updated.text);
                    entry.interaction = Interaction::Viewing;
                }
                self.last_error = None;
                Ok(updated)
            }
            Err(error) => {
                tracing::warn!(id = %id, "Failed to update note: {}", error);
                Err(self.fail(error))
            }
        }
    }

    /// Switch a note to editing, seeding the draft with its current text.
    pub fn begin_edit(&mut self, id: &NoteId) -> Result<()> {
        let entry = self.require_entry_mut(id)?;
        if !entry.interaction.is_editing() {
            entry.interaction = Interaction::Editing {
                draft: entry.note.text.clone(),
            };
        }
        Ok(())
    }

    pub fn set_edit_draft(&mut self, id: &NoteId, text: impl Into<String>) -> Result<()> {
        let entry = self.require_entry_mut(id)?;
        match &mut entry.interaction {
            Interaction::Editing { draft } => {
                *draft = text.into();
                Ok(())
            }
            Interaction::Viewing => Err(Error::Validation(format!("Note {id} is not being edited"))),
        }
    }

    pub fn cancel_edit(&mut self, id: &NoteId) -> Result<()> {
        self.require_entry_mut(id)?.interaction = Interaction::Viewing;
        Ok(())
    }

    /// Save the edit draft of note `id`.
    ///
    /// Both a rejected draft and a failed remote call leave the note in
    /// editing with its draft intact.
    pub async fn save_edit(&mut self, session: &Session, id: &NoteId) -> Result<Note> {
        let draft = match &self.require_entry_mut(id)?.interaction {
            Interaction::Editing { draft } => draft.clone(),
            Interaction::Viewing => {
                return Err(Error::Validation(format!("Note {id} is not being edited")))
            }
        };
        self.edit(session, id, &draft).await
    }

    /// First step of a delete: look the note up and ask for confirmation.
    pub fn request_delete(&self, id: &NoteId) -> Result<PendingDelete> {
        let entry = self.get(id).ok_or_else(|| Error::NotFound(id.to_string()))?;
        Ok(PendingDelete {
            id: id.clone(),
            preview: entry.note.preview(DELETE_PREVIEW_CHARS),
        })
    }

    /// Second step of a delete.
    ///
    /// `Cancel` makes no remote call and returns `Ok(false)`. `Confirm`
    /// deletes remotely and, on success, removes the note locally.
    pub async fn resolve_delete(
        &mut self,
        session: &Session,
        pending: PendingDelete,
        decision: DeleteDecision,
    ) -> Result<bool> {
        if decision == DeleteDecision::Cancel {
            tracing::debug!(id = %pending.id, "Delete cancelled");
            return Ok(false);
        }
        self.bind_session(session);

        match self.store.delete_note(&pending.id).await {
            Ok(()) => {
                tracing::info!(id = %pending.id, "Deleted note");
                self.entries.retain(|entry| entry.note.id != pending.id);
                self.last_error = None;
                Ok(true)
            }
            Err(error) => {
                tracing::warn!(id = %pending.id, "Failed to delete note: {}", error);
                Err(self.fail(error))
            }
        }
    }

    /// Resolve a full id or a unique id prefix against the local list.
    pub fn resolve_id_prefix(&self, query: &str) -> Result<NoteId> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::Validation("Note ID cannot be empty".to_string()));
        }
        if let Some(entry) = self.entries.iter().find(|entry| entry.note.id.as_str() == query) {
            return Ok(entry.note.id.clone());
        }

        let matches: Vec<&NoteId> = self
            .notes()
            .map(|note| &note.id)
            .filter(|id| id.as_str().starts_with(query))
            .collect();
        match matches.as_slice() {
            [] => Err(Error::NotFound(query.to_string())),
            [id] => Ok((*id).clone()),
            _ => {
                let options = matches
                    .iter()
                    .take(3)
                    .map(|id| id.as_str().chars().take(13).collect::<String>())
                    .collect::<Vec<_>>()
                    .join(", ");
                Err(Error::Validation(format!(
                    "ID prefix '{query}' is ambiguous; matches: {options}"
                )))
            }
        }
    }

    /// Forget notes that belong to a different user than `session`.
    fn bind_session(&mut self, session: &Session) {
        if self.loaded_for.as_ref() == Some(&session.user_id) {
            return;
        }
        if self.loaded_for.is_some() {
            tracing::warn!("Session user changed; clearing local notes");
            self.entries.clear();
            self.fetch_error = None;
        }
        self.loaded_for = Some(session.user_id.clone());
    }

    fn entry_mut(&mut self, id: &NoteId) -> Option<&mut NoteEntry> {
        self.entries.iter_mut().find(|entry| &entry.note.id == id)
    }

    fn require_entry_mut(&mut self, id: &NoteId) -> Result<&mut NoteEntry> {
        self.entry_mut(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    fn fail(&mut self, error: Error) -> Error {
        self.last_error = Some(error.to_string());
        error
    }
}

/// Reject a store response carrying a note that is not the session user's.
fn owned_by(session: &Session, note: Note) -> Result<Note> {
    if note.owner_id == session.user_id {
        Ok(note)
    } else {
        Err(Error::Remote(format!(
            "Store returned note {} owned by another user",
            note.id
        )))
    }
}

//! In-process note store.
//!
//! Behaves like the remote store (server-assigned ids, owner scoping,
//! insertion order) and can be told to fail specific operations. Used by
//! tests and by front ends that want to exercise the manager without a
//! backend.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use uuid::Uuid;

use super::NoteStore;
use crate::error::{Error, Result};
use crate::models::{Note, NoteId, UserId};

/// Store operation, used for failure injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    List,
    Create,
    Update,
    Delete,
}

#[derive(Debug, Default)]
struct Inner {
    notes: Vec<Note>,
    failing: HashSet<StoreOp>,
    calls: HashMap<StoreOp, usize>,
    next_seq: u64,
}

#[derive(Debug, Default)]
pub struct MemoryNoteStore {
    inner: Mutex<Inner>,
    id_prefix: Option<String>,
}

impl MemoryNoteStore {
    /// Store assigning UUID v7 ids.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store assigning sequential ids `{prefix}1`, `{prefix}2`, ...
    #[must_use]
    pub fn with_sequential_ids(prefix: impl Into<String>) -> Self {
        Self {
            inner: Mutex::default(),
            id_prefix: Some(prefix.into()),
        }
    }

    /// Insert notes directly, bypassing the store API.
    pub fn seed(&self, notes: impl IntoIterator<Item = Note>) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.notes.extend(notes);
        }
    }

    /// Make every subsequent call of `op` fail until [`Self::recover`].
    pub fn fail(&self, op: StoreOp) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.failing.insert(op);
        }
    }

    pub fn recover(&self, op: StoreOp) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.failing.remove(&op);
        }
    }

    /// Number of calls that reached the store for `op`, failed ones included.
    #[must_use]
    pub fn calls(&self, op: StoreOp) -> usize {
        self.inner
            .lock()
            .map_or(0, |inner| inner.calls.get(&op).copied().unwrap_or(0))
    }

    /// Everything in the store, all owners, in insertion order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Note> {
        self.inner
            .lock()
            .map(|inner| inner.notes.clone())
            .unwrap_or_default()
    }

    fn enter(&self, op: StoreOp) -> Result<MutexGuard<'_, Inner>> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|error| Error::Remote(format!("store lock poisoned: {error}")))?;
        *inner.calls.entry(op).or_default() += 1;
        if inner.failing.contains(&op) {
            return Err(Error::Remote(format!("{op:?} failed: store unavailable")));
        }
        Ok(inner)
    }

    fn next_id(&self, inner: &mut Inner) -> NoteId {
        match &self.id_prefix {
            Some(prefix) => {
                inner.next_seq += 1;
                NoteId::new(format!("{prefix}{}", inner.next_seq))
            }
            None => NoteId::new(Uuid::now_v7().to_string()),
        }
    }
}

impl NoteStore for MemoryNoteStore {
    async fn list_notes(&self, owner: &UserId) -> Result<Vec<Note>> {
        let inner = self.enter(StoreOp::List)?;
        Ok(inner
            .notes
            .iter()
            .filter(|note| &note.owner_id == owner)
            .cloned()
            .collect())
    }

    async fn create_note(&self, owner: &UserId, text: &str) -> Result<Note> {
        let mut inner = self.enter(StoreOp::Create)?;
        let id = self.next_id(&mut inner);
        let note = Note {
            id,
            text: text.to_string(),
            owner_id: owner.clone(),
        };
        inner.notes.push(note.clone());
        Ok(note)
    }

    async fn update_note(&self, id: &NoteId, text: &str) -> Result<Note> {
        let mut inner = self.enter(StoreOp::Update)?;
        let note = inner
            .notes
            .iter_mut()
            .find(|note| &note.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        note.text = text.to_string();
        Ok(note.clone())
    }

    async fn delete_note(&self, id: &NoteId) -> Result<()> {
        let mut inner = self.enter(StoreOp::Delete)?;
        let before = inner.notes.len();
        inner.notes.retain(|note| &note.id != id);
        if inner.notes.len() == before {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn list_is_scoped_to_owner() {
        let store = MemoryNoteStore::with_sequential_ids("n");
        store.create_note(&"u1".into(), "mine").await.unwrap();
        store.create_note(&"u2".into(), "theirs").await.unwrap();

        let notes = store.list_notes(&"u1".into()).await.unwrap();
        assert_eq!(notes, vec![Note::new("n1", "mine", "u1")]);
    }

    #[tokio::test]
    async fn uuid_ids_are_unique() {
        let store = MemoryNoteStore::new();
        let a = store.create_note(&"u1".into(), "a").await.unwrap();
        let b = store.create_note(&"u1".into(), "b").await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn injected_failure_counts_the_call() {
        let store = MemoryNoteStore::new();
        store.fail(StoreOp::Create);
        assert!(store.create_note(&"u1".into(), "x").await.is_err());
        assert_eq!(store.calls(StoreOp::Create), 1);
        assert!(store.snapshot().is_empty());

        store.recover(StoreOp::Create);
        assert!(store.create_note(&"u1".into(), "x").await.is_ok());
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let store = MemoryNoteStore::new();
        let missing = NoteId::new("nope");
        assert!(matches!(
            store.update_note(&missing, "x").await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            store.delete_note(&missing).await,
            Err(Error::NotFound(_))
        ));
    }
}

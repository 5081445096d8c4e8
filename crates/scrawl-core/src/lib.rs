//! scrawl-core - Core library for Scrawl
//!
//! This crate contains the note models, the auth gate, the remote note-store
//! clients, and the note manager that keeps a local note list reconciled with
//! the remote collection. Front ends (the CLI today) sit on top of it.

pub mod auth;
pub mod config;
pub mod error;
pub mod gate;
pub mod manager;
pub mod models;
pub mod store;

pub use error::{Error, ErrorKind, Result};
pub use gate::{AuthGate, AuthState, Route, SessionWatch};
pub use manager::{Composer, DeleteDecision, NoteEntry, NoteManager, PendingDelete};
pub use models::{Interaction, Note, NoteId, Session, UserId};
pub use store::NoteStore;

//! `PostgREST` note store backed by a Supabase `notes` table.
//!
//! Expected table shape: `id` (uuid or bigint, generated), `text` (text),
//! `owner_id` (uuid), `created_at` (timestamptz, defaulted). Row-level
//! security is expected to restrict rows to `auth.uid() = owner_id`.

use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};

use super::NoteStore;
use crate::auth::parse_api_error;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::models::{Note, NoteId, UserId};

const SELECT_COLUMNS: &str = "id,text,owner_id";

#[derive(Clone)]
pub struct SupabaseNoteStore {
    notes_url: String,
    anon_key: String,
    access_token: String,
    client: Client,
}

impl std::fmt::Debug for SupabaseNoteStore {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SupabaseNoteStore")
            .field("notes_url", &self.notes_url)
            .field("access_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl SupabaseNoteStore {
    /// Build a store that acts as the user owning `access_token`.
    pub fn new(config: &ClientConfig, access_token: impl Into<String>) -> Result<Self> {
        let access_token = access_token.into().trim().to_string();
        if access_token.is_empty() {
            return Err(Error::NotAuthenticated);
        }

        Ok(Self {
            notes_url: config.notes_url(),
            anon_key: config.supabase_anon_key.clone(),
            access_token,
            client: Client::builder().build()?,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.access_token)
            .header(reqwest::header::ACCEPT, "application/json")
    }

    fn list_request(&self, owner: &UserId) -> RequestBuilder {
        self.authorized(self.client.get(&self.notes_url).query(&[
            ("select", SELECT_COLUMNS.to_string()),
            ("owner_id", format!("eq.{owner}")),
            ("order", "created_at.asc".to_string()),
        ]))
    }

    fn create_request(&self, owner: &UserId, text: &str) -> RequestBuilder {
        self.authorized(
            self.client
                .post(&self.notes_url)
                .query(&[("select", SELECT_COLUMNS)])
                .header("Prefer", "return=representation")
                .json(&NewNoteRow {
                    text,
                    owner_id: owner.as_str(),
                }),
        )
    }

    fn update_request(&self, id: &NoteId, text: &str) -> RequestBuilder {
        self.authorized(
            self.client
                .patch(&self.notes_url)
                .query(&[
                    ("select", SELECT_COLUMNS.to_string()),
                    ("id", format!("eq.{id}")),
                ])
                .header("Prefer", "return=representation")
                .json(&TextPatch { text }),
        )
    }

    fn delete_request(&self, id: &NoteId) -> RequestBuilder {
        self.authorized(
            self.client
                .delete(&self.notes_url)
                .query(&[
                    ("select", SELECT_COLUMNS.to_string()),
                    ("id", format!("eq.{id}")),
                ])
                .header("Prefer", "return=representation"),
        )
    }

    async fn send_rows(request: RequestBuilder) -> Result<Vec<Note>> {
        let response = request.send().await?;
        let response = check_status(response).await?;
        let rows = response.json::<Vec<NoteRow>>().await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

impl NoteStore for SupabaseNoteStore {
    async fn list_notes(&self, owner: &UserId) -> Result<Vec<Note>> {
        let notes = Self::send_rows(self.list_request(owner)).await?;
        tracing::debug!(count = notes.len(), "Fetched notes");
        Ok(notes)
    }

    async fn create_note(&self, owner: &UserId, text: &str) -> Result<Note> {
        Self::send_rows(self.create_request(owner, text))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Remote("Create response did not include the new note".into()))
    }

    async fn update_note(&self, id: &NoteId, text: &str) -> Result<Note> {
        Self::send_rows(self.update_request(id, text))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    async fn delete_note(&self, id: &NoteId) -> Result<()> {
        let deleted = Self::send_rows(self.delete_request(id)).await?;
        if deleted.is_empty() {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(())
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::Remote(parse_api_error(status, &body)))
}

#[derive(Debug, Serialize)]
struct NewNoteRow<'a> {
    text: &'a str,
    owner_id: &'a str,
}

#[derive(Debug, Serialize)]
struct TextPatch<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct NoteRow {
    id: RowId,
    text: String,
    owner_id: String,
}

/// Primary keys may be uuids or identity integers depending on the schema.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RowId {
    Text(String),
    Number(i64),
}

impl From<NoteRow> for Note {
    fn from(row: NoteRow) -> Self {
        let id = match row.id {
            RowId::Text(id) => id,
            RowId::Number(id) => id.to_string(),
        };
        Self {
            id: NoteId::new(id),
            text: row.text,
            owner_id: UserId::new(row.owner_id),
        }
    }
}

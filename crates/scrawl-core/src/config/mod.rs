//! Client configuration.
//!
//! `ClientConfig` describes where the auth and note-storage collaborators
//! live. Front ends build it from their own settings sources (profile files,
//! environment) and hand it to the auth client and the note store.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_NOTES_TABLE: &str = "notes";

const ENV_SUPABASE_URL: &str = "SUPABASE_URL";
const ENV_SUPABASE_ANON_KEY: &str = "SUPABASE_ANON_KEY";
const ENV_NOTES_TABLE: &str = "SCRAWL_NOTES_TABLE";

/// Public endpoints/keys needed to reach the backend.
///
/// The anon key is a publishable key; secret credentials never belong here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    #[serde(default = "default_notes_table")]
    pub notes_table: String,
}

fn default_notes_table() -> String {
    DEFAULT_NOTES_TABLE.to_string()
}

impl ClientConfig {
    /// Validate and normalize raw values.
    pub fn new(
        supabase_url: impl AsRef<str>,
        supabase_anon_key: impl AsRef<str>,
        notes_table: Option<String>,
    ) -> Result<Self> {
        let supabase_url = normalize_base_url(supabase_url.as_ref())?;
        let supabase_anon_key = supabase_anon_key.as_ref().trim().to_string();
        if supabase_anon_key.is_empty() {
            return Err(Error::Config(
                "Supabase anon key must not be empty".to_string(),
            ));
        }
        let notes_table =
            normalize_text_option(notes_table).unwrap_or_else(default_notes_table);
        if !notes_table
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        {
            return Err(Error::Config(format!(
                "Notes table name '{notes_table}' may only contain letters, digits, and '_'"
            )));
        }

        Ok(Self {
            supabase_url,
            supabase_anon_key,
            notes_table,
        })
    }

    /// Build a config from optional values.
    ///
    /// Returns `Ok(None)` when neither URL nor key is set, and an error when
    /// only one of them is.
    pub fn resolve(
        supabase_url: Option<String>,
        supabase_anon_key: Option<String>,
        notes_table: Option<String>,
    ) -> Result<Option<Self>> {
        match (
            normalize_text_option(supabase_url),
            normalize_text_option(supabase_anon_key),
        ) {
            (None, None) => Ok(None),
            (Some(url), Some(key)) => Self::new(url, key, notes_table).map(Some),
            (Some(_), None) => Err(Error::Config(format!(
                "{ENV_SUPABASE_ANON_KEY} is required when {ENV_SUPABASE_URL} is set"
            ))),
            (None, Some(_)) => Err(Error::Config(format!(
                "{ENV_SUPABASE_URL} is required when {ENV_SUPABASE_ANON_KEY} is set"
            ))),
        }
    }

    /// Read `SUPABASE_URL`, `SUPABASE_ANON_KEY`, and `SCRAWL_NOTES_TABLE`.
    pub fn from_env() -> Result<Option<Self>> {
        Self::resolve(
            std::env::var(ENV_SUPABASE_URL).ok(),
            std::env::var(ENV_SUPABASE_ANON_KEY).ok(),
            std::env::var(ENV_NOTES_TABLE).ok(),
        )
    }

    /// `GoTrue` base URL, e.g. `https://project.supabase.co/auth/v1`.
    #[must_use]
    pub fn auth_url(&self) -> String {
        format!("{}/auth/v1", self.supabase_url)
    }

    /// `PostgREST` base URL, e.g. `https://project.supabase.co/rest/v1`.
    #[must_use]
    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.supabase_url)
    }

    /// Collection endpoint for the notes table.
    #[must_use]
    pub fn notes_url(&self) -> String {
        format!("{}/{}", self.rest_url(), self.notes_table)
    }
}

/// Normalize optional text by trimming whitespace and removing empties.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Check if a string starts with `http://` or `https://`.
pub fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Trim, require an http(s) scheme, and strip trailing `/` plus any
/// `/auth/v1` or `/rest/v1` suffix so the project root remains.
pub fn normalize_base_url(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::Config("Supabase URL must not be empty".to_string()));
    }
    if !is_http_url(trimmed) {
        return Err(Error::Config(
            "Supabase URL must include http:// or https://".to_string(),
        ));
    }
    let root = trimmed
        .strip_suffix("/auth/v1")
        .or_else(|| trimmed.strip_suffix("/rest/v1"))
        .unwrap_or(trimmed);
    Ok(root.to_string())
}

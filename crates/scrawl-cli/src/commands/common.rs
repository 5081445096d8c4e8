use std::env;
use std::io::{self, BufRead, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use scrawl_core::auth::AuthSession;
use scrawl_core::config::ClientConfig;
use scrawl_core::gate::resolve_session;
use scrawl_core::store::SupabaseNoteStore;
use scrawl_core::{Note, NoteEntry, NoteManager, NoteStore, Route, Session, SessionWatch};
use serde::Serialize;

use crate::auth::{auth_client, CliAuthClient};
use crate::config_profiles::{CliProfile, CliProfilesConfig};
use crate::error::CliError;

/// A resolved profile: its name and backend config.
pub struct ProfileContext {
    pub name: String,
    pub config: ClientConfig,
}

impl ProfileContext {
    pub fn resolve(explicit_profile: Option<&str>) -> Result<Self, CliError> {
        let profiles = CliProfilesConfig::load().map_err(CliError::Config)?;
        let name = profiles.resolve_profile_name(explicit_profile);
        let profile = profiles.profile(&name).cloned().unwrap_or_default();
        Self::from_profile(name, &profile)
    }

    pub fn from_profile(name: String, profile: &CliProfile) -> Result<Self, CliError> {
        match profile.client_config()? {
            Some(config) => Ok(Self { name, config }),
            None => Err(CliError::NotConfigured(name)),
        }
    }

    pub fn auth_client(&self) -> Result<CliAuthClient, CliError> {
        Ok(auth_client(&self.name, &self.config)?)
    }
}

/// Signed-in note workspace for one command invocation.
pub struct NoteWorkspace<S> {
    pub profile_name: String,
    pub session: Session,
    pub manager: NoteManager<S>,
}

impl<S: NoteStore> NoteWorkspace<S> {
    pub const fn new(profile_name: String, session: Session, store: S) -> Self {
        Self {
            profile_name,
            session,
            manager: NoteManager::new(store),
        }
    }

    /// Fetch the user's notes into the manager.
    ///
    /// Only commands that address existing notes need this; `add` works
    /// without a loaded list.
    pub async fn load(&mut self) -> Result<(), CliError> {
        if let Err(error) = self.manager.list(&self.session).await {
            let message = self
                .manager
                .fetch_error()
                .map_or_else(|| error.to_string(), ToString::to_string);
            return Err(CliError::NotesUnavailable(message));
        }
        Ok(())
    }
}

/// Pass the auth gate and connect to the signed-in user's notes.
pub async fn open_workspace(
    explicit_profile: Option<&str>,
) -> Result<NoteWorkspace<SupabaseNoteStore>, CliError> {
    let profile = ProfileContext::resolve(explicit_profile)?;
    let client = profile.auth_client()?;

    let watch = SessionWatch::new();
    let gate = watch.gate();
    let restored = resolve_session(&client, &watch).await?;

    let (session, auth) = signed_in_session(gate.evaluate(), restored).inspect_err(|_| {
        tracing::debug!(profile = %profile.name, "No active session");
    })?;

    let store = SupabaseNoteStore::new(&profile.config, auth.access_token)?;
    Ok(NoteWorkspace::new(profile.name, session, store))
}

/// Only `Route::Notes` with a token-bearing session lets a note command run.
pub fn signed_in_session(
    route: Route,
    restored: Option<AuthSession>,
) -> Result<(Session, AuthSession), CliError> {
    match (route, restored) {
        (Route::Notes(session), Some(auth)) => Ok((session, auth)),
        (Route::Pending | Route::Login, _) | (Route::Notes(_), None) => Err(CliError::NotSignedIn),
    }
}

#[derive(Debug, Serialize)]
pub struct NoteListItem {
    pub id: String,
    pub preview: String,
    pub text: String,
    pub owner_id: String,
}

pub fn note_to_list_item(note: &Note) -> NoteListItem {
    NoteListItem {
        id: note.id.to_string(),
        preview: note_preview(note, 80),
        text: note.text.clone(),
        owner_id: note.owner_id.to_string(),
    }
}

pub fn format_note_lines(entries: &[NoteEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| {
            let short_id = short_id(entry.note.id.as_str());
            let preview = note_preview(&entry.note, 60);
            format!("{short_id:<13}  {preview}")
        })
        .collect()
}

pub fn short_id(id: &str) -> String {
    id.chars().take(13).collect()
}

pub fn note_preview(note: &Note, max_chars: usize) -> String {
    let first_line = note.text.lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

/// Ask a yes/no question; anything but `y`/`yes` means no.
pub fn confirm(prompt: &str, input: &mut impl BufRead, output: &mut impl Write) -> io::Result<bool> {
    write!(output, "{prompt} [y/N] ")?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// The text exactly as given, unless it is blank.
pub fn non_blank(content: String) -> Option<String> {
    if content.trim().is_empty() {
        None
    } else {
        Some(content)
    }
}

pub fn normalize_note_identifier(id: &str) -> Result<String, CliError> {
    normalize_content(id).ok_or(CliError::EmptyNoteId)
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(non_blank(buffer))
}

pub fn capture_editor_input_with_initial(
    initial_content: &str,
) -> Result<Option<String>, CliError> {
    let editor = preferred_editor();
    let temp_file = create_temp_note_file_path();
    std::fs::write(&temp_file, initial_content)?;

    let launch_result = launch_editor(&editor, &temp_file);
    let note_content = std::fs::read_to_string(&temp_file)?;
    let _ = std::fs::remove_file(&temp_file);

    launch_result?;
    let without_final_newline = note_content
        .strip_suffix('\n')
        .map(|text| text.strip_suffix('\r').unwrap_or(text))
        .unwrap_or(&note_content);
    Ok(non_blank(without_final_newline.to_string()))
}

pub fn launch_editor(editor: &str, file_path: &Path) -> Result<(), CliError> {
    let mut parts = editor.split_whitespace();
    let Some(program) = parts.next() else {
        return Err(CliError::EditorFailed("empty EDITOR command".into()));
    };

    let status = Command::new(program).args(parts).arg(file_path).status()?;
    if status.success() {
        Ok(())
    } else {
        Err(CliError::EditorFailed(format!(
            "`{editor}` exited with status {status}"
        )))
    }
}

pub fn preferred_editor() -> String {
    env::var("VISUAL")
        .or_else(|_| env::var("EDITOR"))
        .unwrap_or_else(|_| default_editor().to_string())
}

pub const fn default_editor() -> &'static str {
    if cfg!(windows) {
        "notepad"
    } else {
        "vi"
    }
}

pub fn create_temp_note_file_path() -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    env::temp_dir().join(format!("scrawl-note-{}-{now}.md", std::process::id()))
}

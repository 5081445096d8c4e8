use scrawl_core::{NoteId, NoteStore};

use crate::commands::common::{
    capture_editor_input_with_initial, non_blank, normalize_note_identifier, open_workspace,
    NoteWorkspace,
};
use crate::error::CliError;

pub async fn run_edit(id: &str, text_parts: &[String], profile: Option<&str>) -> Result<(), CliError> {
    let query = normalize_note_identifier(id)?;
    let mut workspace = open_workspace(profile).await?;
    workspace.load().await?;

    let id = workspace.manager.resolve_id_prefix(&query)?;
    let current = workspace
        .manager
        .get(&id)
        .map(|entry| entry.note.text.clone())
        .unwrap_or_default();

    let edited = match non_blank(text_parts.join(" ")) {
        Some(text) => text,
        None => capture_editor_input_with_initial(&current)?.ok_or(CliError::EmptyEditedContent)?,
    };

    let id = apply_edit(&mut workspace, &id, edited).await?;
    println!("{id}");
    Ok(())
}

/// Save `edited` as the new text of note `id`; unchanged text skips the store.
pub async fn apply_edit<S: NoteStore>(
    workspace: &mut NoteWorkspace<S>,
    id: &NoteId,
    edited: String,
) -> Result<NoteId, CliError> {
    let manager = &mut workspace.manager;
    let unchanged = manager.get(id).is_some_and(|entry| entry.note.text == edited);
    if unchanged {
        return Ok(id.clone());
    }

    manager.begin_edit(id)?;
    manager.set_edit_draft(id, edited)?;
    let updated = manager.save_edit(&workspace.session, id).await?;
    Ok(updated.id)
}

use std::io;

use scrawl_core::{DeleteDecision, NoteId, NoteStore, PendingDelete};

use crate::commands::common::{confirm, normalize_note_identifier, open_workspace, NoteWorkspace};
use crate::error::CliError;

pub async fn run_delete(id: &str, skip_prompt: bool, profile: Option<&str>) -> Result<(), CliError> {
    let query = normalize_note_identifier(id)?;
    let mut workspace = open_workspace(profile).await?;
    workspace.load().await?;

    let deleted = delete_with(&mut workspace, &query, |pending| {
        if skip_prompt {
            return Ok(DeleteDecision::Confirm);
        }
        let prompt = format!("Delete note {} \"{}\"?", pending.id(), pending.preview());
        let confirmed = confirm(&prompt, &mut io::stdin().lock(), &mut io::stderr())?;
        Ok(if confirmed {
            DeleteDecision::Confirm
        } else {
            DeleteDecision::Cancel
        })
    })
    .await?;

    match deleted {
        Some(id) => println!("{id}"),
        None => eprintln!("Cancelled"),
    }
    Ok(())
}

/// Resolve `query`, ask `decide`, and delete on confirmation.
///
/// Returns the deleted id, or `None` when cancelled.
pub async fn delete_with<S: NoteStore>(
    workspace: &mut NoteWorkspace<S>,
    query: &str,
    decide: impl FnOnce(&PendingDelete) -> io::Result<DeleteDecision>,
) -> Result<Option<NoteId>, CliError> {
    let manager = &mut workspace.manager;
    let id = manager.resolve_id_prefix(query)?;
    let pending = manager.request_delete(&id)?;
    let decision = decide(&pending)?;

    let deleted = manager
        .resolve_delete(&workspace.session, pending, decision)
        .await?;
    Ok(deleted.then_some(id))
}

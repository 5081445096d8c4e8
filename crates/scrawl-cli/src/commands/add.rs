use scrawl_core::{Composer, ErrorKind, Note, NoteStore};

use crate::commands::common::{
    capture_editor_input_with_initial, non_blank, open_workspace, read_piped_stdin, NoteWorkspace,
};
use crate::drafts::DraftStore;
use crate::error::CliError;

pub async fn run_add(text_parts: &[String], profile: Option<&str>) -> Result<(), CliError> {
    let mut workspace = open_workspace(profile).await?;
    let drafts = DraftStore::for_profile(&workspace.profile_name).map_err(CliError::Config)?;
    let composer = compose(text_parts, &drafts)?;

    let note = submit(&mut workspace, composer, &drafts).await?;
    println!("{}", note.id);
    Ok(())
}

/// Text from arguments, then piped stdin, then the editor (pre-filled with
/// any saved draft). Text is kept as typed.
pub fn compose(text_parts: &[String], drafts: &DraftStore) -> Result<Composer, CliError> {
    if let Some(text) = non_blank(text_parts.join(" ")) {
        return Ok(Composer::with_draft(text));
    }

    if let Some(text) = read_piped_stdin()? {
        return Ok(Composer::with_draft(text));
    }

    capture_editor_input_with_initial(&draft_seed(drafts)?)?
        .map(Composer::with_draft)
        .ok_or(CliError::EmptyContent)
}

/// Initial editor contents for `add`: the draft kept from a failed attempt.
pub fn draft_seed(drafts: &DraftStore) -> Result<String, CliError> {
    Ok(drafts.load()?.unwrap_or_default())
}

/// Create the composed note. A remote failure keeps the text as a draft.
pub async fn submit<S: NoteStore>(
    workspace: &mut NoteWorkspace<S>,
    mut composer: Composer,
    drafts: &DraftStore,
) -> Result<Note, CliError> {
    let result = workspace
        .manager
        .submit_draft(&workspace.session, &mut composer)
        .await;

    match result {
        Ok(note) => {
            if let Err(error) = drafts.clear() {
                tracing::warn!(path = %drafts.path().display(), "Failed to clear draft: {}", error);
            }
            Ok(note)
        }
        Err(error) if error.kind() == ErrorKind::Remote => {
            match drafts.save(composer.draft()) {
                Ok(()) => eprintln!(
                    "Draft kept at {} (run `scrawl add` to retry)",
                    drafts.path().display()
                ),
                Err(save_error) => tracing::warn!(
                    path = %drafts.path().display(),
                    "Failed to keep draft: {}",
                    save_error
                ),
            }
            Err(error.into())
        }
        Err(error) => Err(error.into()),
    }
}

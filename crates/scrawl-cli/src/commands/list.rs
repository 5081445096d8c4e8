use crate::commands::common::{format_note_lines, note_to_list_item, open_workspace, NoteListItem};
use crate::error::CliError;

pub async fn run_list(as_json: bool, profile: Option<&str>) -> Result<(), CliError> {
    let mut workspace = open_workspace(profile).await?;
    workspace.load().await?;
    let entries = workspace.manager.entries();

    if as_json {
        let json_items = entries
            .iter()
            .map(|entry| note_to_list_item(&entry.note))
            .collect::<Vec<NoteListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if entries.is_empty() {
        println!("No notes yet. Add one with `scrawl add <text>`.");
    } else {
        for line in format_note_lines(entries) {
            println!("{line}");
        }
    }

    Ok(())
}

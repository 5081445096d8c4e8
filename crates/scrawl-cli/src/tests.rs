use std::io::Cursor;

use pretty_assertions::assert_eq;
use scrawl_core::auth::{AuthSession, AuthUser};
use scrawl_core::store::{MemoryNoteStore, StoreOp};
use scrawl_core::{
    Composer, DeleteDecision, ErrorKind, Interaction, Note, NoteEntry, NoteId, Route, Session, SessionWatch,
};

use crate::cli::CompletionShell;
use crate::commands::add::{compose, draft_seed, submit};
use crate::commands::common::{
    confirm, default_editor, format_note_lines, non_blank, normalize_content,
    normalize_note_identifier, note_preview, note_to_list_item, short_id, signed_in_session,
    NoteWorkspace,
};
use crate::commands::completions::run_completions;
use crate::commands::delete::delete_with;
use crate::commands::edit::apply_edit;
use crate::drafts::DraftStore;
use crate::error::CliError;

fn workspace_with(notes: &[(&str, &str)]) -> NoteWorkspace<MemoryNoteStore> {
    let store = MemoryNoteStore::with_sequential_ids("n");
    store.seed(
        notes
            .iter()
            .map(|(id, text)| Note::new(*id, *text, "user-1")),
    );
    NoteWorkspace::new("default".to_string(), Session::new("user-1"), store)
}

fn auth_session() -> AuthSession {
    AuthSession {
        access_token: "access".to_string(),
        refresh_token: "refresh".to_string(),
        expires_at: 1_700_000_000,
        user: AuthUser {
            id: "user-1".to_string(),
            email: None,
        },
    }
}

fn entry(id: &str, text: &str) -> NoteEntry {
    NoteEntry {
        note: Note::new(id, text, "user-1"),
        interaction: Interaction::Viewing,
    }
}

#[test]
fn normalize_content_trims_and_rejects_empty() {
    assert_eq!(normalize_content("  hello  "), Some("hello".to_string()));
    assert_eq!(normalize_content(" \n\t "), None);
}

#[test]
fn normalize_content_keeps_multiline_text() {
    assert_eq!(
        normalize_content("line 1\nline 2\n"),
        Some("line 1\nline 2".to_string())
    );
}

#[test]
fn default_editor_is_defined() {
    assert!(!default_editor().is_empty());
}

#[test]
fn normalize_note_identifier_rejects_empty() {
    assert!(matches!(
        normalize_note_identifier("   "),
        Err(CliError::EmptyNoteId)
    ));
    assert_eq!(normalize_note_identifier(" abc ").unwrap(), "abc");
}

#[test]
fn note_preview_truncates_with_ellipsis() {
    let note = Note::new("n1", "first   line with    spacing\nsecond line", "user-1");
    assert_eq!(note_preview(&note, 100), "first line with spacing");
    assert_eq!(note_preview(&note, 10), "first l...");
}

#[test]
fn short_id_keeps_thirteen_chars() {
    assert_eq!(short_id("0192f0a1-b2c3-7d4e-8f90-123456789abc"), "0192f0a1-b2c3");
    assert_eq!(short_id("n1"), "n1");
}

#[test]
fn format_note_lines_pads_short_ids() {
    let lines = format_note_lines(&[entry("n1", "buy milk"), entry("n2", "call mom\nlater")]);
    assert_eq!(
        lines,
        vec![
            format!("{:<13}  buy milk", "n1"),
            format!("{:<13}  call mom", "n2"),
        ]
    );
}

#[test]
fn list_item_carries_full_text_and_owner() {
    let item = note_to_list_item(&Note::new("n1", "buy milk\nand eggs", "user-1"));
    assert_eq!(item.id, "n1");
    assert_eq!(item.preview, "buy milk");
    assert_eq!(item.text, "buy milk\nand eggs");
    assert_eq!(item.owner_id, "user-1");
}

#[test]
fn confirm_accepts_yes_variants_only() {
    for (answer, expected) in [("y\n", true), ("YES\n", true), ("n\n", false), ("\n", false)] {
        let mut output = Vec::new();
        let confirmed = confirm("Delete?", &mut Cursor::new(answer), &mut output).unwrap();
        assert_eq!(confirmed, expected, "answer {answer:?}");
        assert_eq!(String::from_utf8(output).unwrap(), "Delete? [y/N] ");
    }
}

#[test]
fn confirm_treats_closed_input_as_no() {
    let mut output = Vec::new();
    assert!(!confirm("Delete?", &mut Cursor::new(""), &mut output).unwrap());
}

#[test]
fn compose_prefers_argument_text() {
    let dir = tempfile::tempdir().unwrap();
    let drafts = DraftStore::at(dir.path().join("default.txt"));
    drafts.save("older draft").unwrap();

    let composer = compose(&["  buy".to_string(), "milk ".to_string()], &drafts).unwrap();
    assert_eq!(composer.draft(), "  buy milk ");
}

#[test]
fn non_blank_keeps_text_as_typed() {
    assert_eq!(non_blank("  indented\n".to_string()), Some("  indented\n".to_string()));
    assert_eq!(non_blank(" \n ".to_string()), None);
}

#[test]
fn only_notes_route_with_tokens_passes_the_gate() {
    let watch = SessionWatch::new();
    let gate = watch.gate();
    assert_eq!(gate.evaluate(), Route::Pending);
    assert!(matches!(
        signed_in_session(gate.evaluate(), Some(auth_session())),
        Err(CliError::NotSignedIn)
    ));

    watch.publish(None);
    assert_eq!(gate.evaluate(), Route::Login);
    assert!(matches!(
        signed_in_session(gate.evaluate(), None),
        Err(CliError::NotSignedIn)
    ));

    watch.publish(Some(Session::from(&auth_session())));
    assert!(matches!(
        signed_in_session(gate.evaluate(), None),
        Err(CliError::NotSignedIn)
    ));
    let (session, auth) = signed_in_session(gate.evaluate(), Some(auth_session())).unwrap();
    assert_eq!(session.user_id.as_str(), "user-1");
    assert_eq!(auth.access_token, "access");
}

#[tokio::test]
async fn failed_add_keeps_draft_for_the_next_attempt() {
    let dir = tempfile::tempdir().unwrap();
    let drafts = DraftStore::at(dir.path().join("default.txt"));
    let mut workspace = workspace_with(&[]);
    workspace.manager.store().fail(StoreOp::Create);

    let result = submit(&mut workspace, Composer::with_draft("  buy milk\n"), &drafts).await;

    assert!(matches!(result, Err(CliError::Core(_))));
    assert!(workspace.manager.is_empty());
    assert_eq!(drafts.load().unwrap().as_deref(), Some("  buy milk\n"));
    assert_eq!(draft_seed(&drafts).unwrap(), "  buy milk\n");

    workspace.manager.store().recover(StoreOp::Create);
    let note = submit(&mut workspace, Composer::with_draft(draft_seed(&drafts).unwrap()), &drafts)
        .await
        .unwrap();

    assert_eq!(note.text, "  buy milk\n");
    assert_eq!(drafts.load().unwrap(), None);
}

#[tokio::test]
async fn unwritable_draft_keeps_the_remote_error() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "").unwrap();
    let drafts = DraftStore::at(blocker.join("default.txt"));
    let mut workspace = workspace_with(&[]);
    workspace.manager.store().fail(StoreOp::Create);

    let result = submit(&mut workspace, Composer::with_draft("buy milk"), &drafts).await;

    assert!(matches!(
        result,
        Err(CliError::Core(error)) if error.kind() == ErrorKind::Remote
    ));
}

#[tokio::test]
async fn blank_add_writes_no_draft() {
    let dir = tempfile::tempdir().unwrap();
    let drafts = DraftStore::at(dir.path().join("default.txt"));
    let mut workspace = workspace_with(&[]);

    assert!(submit(&mut workspace, Composer::with_draft("   "), &drafts)
        .await
        .is_err());
    assert_eq!(workspace.manager.store().calls(StoreOp::Create), 0);
    assert_eq!(drafts.load().unwrap(), None);
}

#[tokio::test]
async fn add_does_not_need_a_loaded_list() {
    let dir = tempfile::tempdir().unwrap();
    let drafts = DraftStore::at(dir.path().join("default.txt"));
    let mut workspace = workspace_with(&[("n9", "older")]);
    workspace.manager.store().fail(StoreOp::List);

    assert!(matches!(
        workspace.load().await,
        Err(CliError::NotesUnavailable(message)) if message.contains("store unavailable")
    ));
    assert!(workspace.manager.fetch_error().is_some());

    let note = submit(&mut workspace, Composer::with_draft("new"), &drafts)
        .await
        .unwrap();
    assert_eq!(note.text, "new");
}

#[tokio::test]
async fn unchanged_edit_skips_the_store() {
    let mut workspace = workspace_with(&[("abc123", "buy milk")]);
    workspace.load().await.unwrap();
    let id = NoteId::new("abc123");

    let saved = apply_edit(&mut workspace, &id, "buy milk".to_string())
        .await
        .unwrap();

    assert_eq!(saved, id);
    assert_eq!(workspace.manager.store().calls(StoreOp::Update), 0);
}

#[tokio::test]
async fn edit_replaces_text_of_resolved_note() {
    let mut workspace = workspace_with(&[("abc123", "buy milk"), ("def456", "call mom")]);
    workspace.load().await.unwrap();
    let id = workspace.manager.resolve_id_prefix("abc").unwrap();

    apply_edit(&mut workspace, &id, "buy oat milk".to_string())
        .await
        .unwrap();

    let texts: Vec<&str> = workspace
        .manager
        .notes()
        .map(|note| note.text.as_str())
        .collect();
    assert_eq!(texts, vec!["buy oat milk", "call mom"]);
}

#[tokio::test]
async fn failed_edit_leaves_note_in_editing() {
    let mut workspace = workspace_with(&[("abc123", "buy milk")]);
    workspace.load().await.unwrap();
    workspace.manager.store().fail(StoreOp::Update);
    let id = NoteId::new("abc123");

    assert!(apply_edit(&mut workspace, &id, "buy bread".to_string())
        .await
        .is_err());

    let entry = workspace.manager.get(&id).unwrap();
    assert_eq!(entry.note.text, "buy milk");
    assert!(entry.interaction.is_editing());
}

#[tokio::test]
async fn cancelled_delete_makes_no_remote_call() {
    let mut workspace = workspace_with(&[("abc123", "buy milk")]);
    workspace.load().await.unwrap();

    let deleted = delete_with(&mut workspace, "abc", |pending| {
        assert_eq!(pending.preview(), "buy milk");
        Ok(DeleteDecision::Cancel)
    })
    .await
    .unwrap();

    assert_eq!(deleted, None);
    assert_eq!(workspace.manager.len(), 1);
    assert_eq!(workspace.manager.store().calls(StoreOp::Delete), 0);
}

#[tokio::test]
async fn confirmed_delete_removes_note() {
    let mut workspace = workspace_with(&[("abc123", "buy milk"), ("def456", "call mom")]);
    workspace.load().await.unwrap();

    let deleted = delete_with(&mut workspace, "abc", |_| Ok(DeleteDecision::Confirm))
        .await
        .unwrap();

    assert_eq!(deleted, Some(NoteId::new("abc123")));
    let ids: Vec<&str> = workspace.manager.notes().map(|note| note.id.as_str()).collect();
    assert_eq!(ids, vec!["def456"]);
}

#[test]
fn run_completions_writes_bash_script_file() {
    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("scrawl.bash");

    run_completions(CompletionShell::Bash, Some(&output_path)).unwrap();

    let script = std::fs::read_to_string(&output_path).unwrap();
    assert!(script.contains("_scrawl()"));
    assert!(script.contains("complete -F _scrawl"));
}

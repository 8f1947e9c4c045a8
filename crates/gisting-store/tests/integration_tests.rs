//! Integration tests for gisting-store against an on-disk database.

use gisting_core::types::{GistStatus, Visibility};
use gisting_store::{
    Collection, ContentRecord, DraftedGistRecord, FieldUpdates, Filter, LocalStore, StoreError,
    fields,
};
use tempfile::tempdir;

fn draft_file(id: &str, gist_id: &str, content: &str) -> ContentRecord {
    ContentRecord {
        id: id.to_string(),
        gist_id: gist_id.to_string(),
        title: "todo.md".to_string(),
        description: "Notes".to_string(),
        raw_url: String::new(),
        updated_at: "2024-05-01T12:00:00Z".to_string(),
        content: Some(content.to_string()),
        draft: true,
    }
}

#[test]
fn test_records_survive_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("gisting.db");

    {
        let store = LocalStore::open(&path).unwrap();
        store
            .insert(&DraftedGistRecord {
                id: "uuid-a".to_string(),
                description: "Notes".to_string(),
                status: GistStatus::Drafted,
                visibility: Visibility::Public,
                updated_at: "2024-05-01T12:00:00Z".to_string(),
            })
            .unwrap();
        store.insert(&draft_file("file-1", "uuid-a", "- buy milk")).unwrap();
        store.close().unwrap();
    }

    let store = LocalStore::open(&path).unwrap();
    let gists: Vec<DraftedGistRecord> = store.find_all(&Filter::new()).unwrap();
    assert_eq!(gists.len(), 1);
    assert_eq!(gists[0].description, "Notes");

    let files: Vec<ContentRecord> = store
        .find_all(
            &Filter::new()
                .eq(fields::GIST_ID, "uuid-a")
                .eq(fields::DRAFT, true),
        )
        .unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].content.as_deref(), Some("- buy milk"));
}

#[test]
fn test_reopen_does_not_rerun_migrations() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gisting.db");

    LocalStore::open(&path).unwrap().close().unwrap();
    LocalStore::open(&path).unwrap().close().unwrap();

    let store = LocalStore::open(&path).unwrap();
    assert_eq!(store.count(Collection::GistContent).unwrap(), 0);
}

#[test]
fn test_publish_style_rewrite() {
    let dir = tempdir().unwrap();
    let store = LocalStore::open(dir.path().join("gisting.db")).unwrap();
    store.insert(&draft_file("file-1", "uuid-a", "- buy milk")).unwrap();

    store
        .update::<ContentRecord>(
            &Filter::new().eq(fields::ID, "file-1"),
            &FieldUpdates::new()
                .set(fields::GIST_ID, "g123")
                .set(fields::RAW_URL, "https://gist.example/raw/abc")
                .set(fields::UPDATED_AT, "2024-05-01T12:05:00Z")
                .set(fields::DRAFT, false),
        )
        .unwrap();

    let hit: ContentRecord = store
        .find_first(
            &Filter::new()
                .eq(fields::RAW_URL, "https://gist.example/raw/abc")
                .eq(fields::DRAFT, false),
        )
        .unwrap()
        .unwrap();
    assert_eq!(hit.id, "file-1");
    assert_eq!(hit.gist_id, "g123");
    assert_eq!(hit.content.as_deref(), Some("- buy milk"));
}

#[test]
fn test_closed_store_reports_error() {
    let dir = tempdir().unwrap();
    let store = LocalStore::open(dir.path().join("gisting.db")).unwrap();
    store.close().unwrap();

    let err = store
        .delete::<ContentRecord>(&Filter::new().eq(fields::ID, "x"))
        .unwrap_err();
    assert!(matches!(err, StoreError::Closed));
    assert_eq!(err.friendly_message(), "Local store is closed.");
}

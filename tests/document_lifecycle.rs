//! Document Lifecycle Tests
//!
//! Covers the basic write/read contract:
//! - First save bootstraps the store and the root revision
//! - Saves advance `master` strictly forward; history walks tip-to-root
//! - `open` loads the master tip and returns None for unknown ids
//! - Every save registers the document in the document index

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use tempfile::TempDir;
use vellum::{Author, Config, Content, Document, DocumentIndex, RevisionKind};

// =============================================================================
// Test Utilities
// =============================================================================

fn author() -> Author {
    Author::new("A", "a@x")
}

fn ts(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, hour, minute, 0).unwrap()
}

fn config(temp_dir: &TempDir) -> Config {
    Config::new(temp_dir.path())
}

// =============================================================================
// Basic save/load
// =============================================================================

#[test]
fn test_save_and_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let config = config(&temp_dir);

    let mut document = Document::new(&config);
    document.set_content(Content::from_value(json!({"title": "hi"})));
    document.save(&author(), "m", ts(9, 0)).unwrap();
    let id = document.id().to_string();

    let reopened = Document::open(&config, &id).unwrap().expect("document exists");
    let tip = reopened
        .revisions()
        .unwrap()
        .by_state("master")
        .unwrap()
        .expect("master exists");

    assert_eq!(tip.content().unwrap().get("title"), Some(&json!("hi")));
    assert_eq!(tip.author().unwrap(), &author());
    assert_eq!(tip.message().unwrap(), "m");
    assert_eq!(tip.timestamp().unwrap(), ts(9, 0));
    assert!(tip.previous().unwrap().unwrap().is_root());

    // The open call loaded the tip's content into the buffer.
    assert_eq!(reopened.content().get("title"), Some(&json!("hi")));
}

#[test]
fn test_open_unknown_id_is_none() {
    let temp_dir = TempDir::new().unwrap();
    let config = config(&temp_dir);
    assert!(Document::open(&config, "no-such-document").unwrap().is_none());
}

#[test]
fn test_nothing_touches_disk_before_first_save() {
    let temp_dir = TempDir::new().unwrap();
    let config = config(&temp_dir);

    let document = Document::new(&config);
    assert!(!temp_dir.path().join(document.id()).exists());
}

// =============================================================================
// Linear history on master
// =============================================================================

#[test]
fn test_two_saves_walk_in_order() {
    let temp_dir = TempDir::new().unwrap();
    let config = config(&temp_dir);

    let mut document = Document::new(&config);
    document.set_content(Content::from_value(json!({"title": "hi"})));
    let s1 = document.save(&author(), "first", ts(9, 0)).unwrap();
    document.set_content(Content::from_value(json!({"title": "hi2"})));
    let s2 = document.save(&author(), "second", ts(9, 5)).unwrap();

    assert_eq!(s2.previous().unwrap().unwrap().id(), s1.id());

    let walked: Vec<_> = document
        .history("master")
        .unwrap()
        .map(|step| step.unwrap())
        .collect();
    assert_eq!(walked.len(), 3);
    assert_eq!(walked[0].id(), s2.id());
    assert_eq!(walked[1].id(), s1.id());
    assert!(walked[2].is_root());
    assert_eq!(walked[2].kind().unwrap(), RevisionKind::Orphan);

    // The state hint propagates down the walk.
    assert_eq!(walked[1].state(), Some("master"));
}

#[test]
fn test_append_only_master_contains_every_save() {
    let temp_dir = TempDir::new().unwrap();
    let config = config(&temp_dir);

    let mut document = Document::new(&config);
    let mut saved = Vec::new();
    for i in 0..5 {
        document.set_content(Content::from_value(json!({"n": i})));
        saved.push(document.save(&author(), "save", ts(10, i)).unwrap());
    }

    let walked: Vec<_> = document
        .history("master")
        .unwrap()
        .map(|step| step.unwrap().id().clone())
        .collect();

    // Tip-to-root order holds every earlier save, newest first.
    let expected: Vec<_> = saved.iter().rev().map(|r| r.id().clone()).collect();
    assert_eq!(&walked[..5], &expected[..]);
}

#[test]
fn test_history_of_unknown_state_is_empty() {
    let temp_dir = TempDir::new().unwrap();
    let config = config(&temp_dir);

    let mut document = Document::new(&config);
    document.save(&author(), "m", ts(9, 0)).unwrap();

    assert_eq!(document.history("published").unwrap().count(), 0);
}

#[test]
fn test_history_by_revision_id() {
    let temp_dir = TempDir::new().unwrap();
    let config = config(&temp_dir);

    let mut document = Document::new(&config);
    document.set_content(Content::from_value(json!({"n": 1})));
    let s1 = document.save(&author(), "first", ts(9, 0)).unwrap();
    document.set_content(Content::from_value(json!({"n": 2})));
    document.save(&author(), "second", ts(9, 5)).unwrap();

    // Starting from s1's id skips the later save.
    let walked: Vec<_> = document
        .history(s1.id().as_str())
        .unwrap()
        .map(|step| step.unwrap())
        .collect();
    assert_eq!(walked.len(), 2);
    assert_eq!(walked[0].id(), s1.id());
    assert!(walked[1].is_root());
}

// =============================================================================
// Saves on named states
// =============================================================================

#[test]
fn test_save_in_named_state_roots_at_root() {
    let temp_dir = TempDir::new().unwrap();
    let config = config(&temp_dir);

    let mut document = Document::new(&config);
    document.set_content(Content::from_value(json!({"draft": true})));
    document.save(&author(), "draft", ts(9, 0)).unwrap();

    document.set_content(Content::from_value(json!({"review": true})));
    let review = document
        .save_in("review", &author(), "to review", ts(9, 10))
        .unwrap();

    // A new state's first revision sits directly on the root.
    assert!(review.previous().unwrap().unwrap().is_root());
    assert_eq!(review.state(), Some("review"));
    assert_eq!(review.kind().unwrap(), RevisionKind::Save);
}

// =============================================================================
// Document index registration
// =============================================================================

#[test]
fn test_save_registers_document() {
    let temp_dir = TempDir::new().unwrap();
    let config = config(&temp_dir);

    let mut document = Document::with_type(&config, "article");
    document.save(&author(), "m", ts(9, 0)).unwrap();

    let registry = DocumentIndex::open(temp_dir.path());
    let entries = registry.documents().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, document.id());
    assert_eq!(entries[0].doc_type, "article");

    // A second save does not duplicate the record.
    document.save(&author(), "m2", ts(9, 1)).unwrap();
    assert_eq!(registry.documents().unwrap().len(), 1);
}

#[test]
fn test_open_restores_registered_type() {
    let temp_dir = TempDir::new().unwrap();
    let config = config(&temp_dir);

    let mut document = Document::with_type(&config, "article");
    document.save(&author(), "m", ts(9, 0)).unwrap();
    let id = document.id().to_string();

    let reopened = Document::open(&config, &id).unwrap().unwrap();
    assert_eq!(reopened.doc_type(), "article");
}

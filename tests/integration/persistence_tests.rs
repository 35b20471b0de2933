/*!
 * Integration tests for the glossary file: restarts, hand edits and corruption.
 */

use std::fs;

use namekeep::errors::GlossaryError;
use namekeep::glossary::{Actor, Candidate, GlossaryStore, ProposalOrigin, ResolveOptions, Role};

use crate::common::{ScriptedProposer, create_temp_dir, novel_proposer};

/// Test that entries written by one process are loaded unchanged by the next
#[tokio::test]
async fn test_openFile_afterRestart_shouldRestoreEntries() {
    let temp_dir = create_temp_dir().unwrap();
    let path = temp_dir.path().join("character_glossary.json");

    {
        let store = GlossaryStore::open_file(&path).unwrap();
        store
            .resolve(
                1,
                [
                    Candidate::with_role("葉陽", Role::Protagonist),
                    Candidate::with_role("王媽", Role::Minor),
                ],
                &novel_proposer(),
                &ResolveOptions::new(),
            )
            .await
            .unwrap();
        store.override_term("蘇婉容", "Tô Uyển Dung", Actor::Manual).await.unwrap();
    }

    let reopened = GlossaryStore::open_file(&path).unwrap();
    assert_eq!(reopened.len(), 3);
    assert!(!reopened.is_dirty());

    let hero = reopened.lookup("葉陽").unwrap();
    assert_eq!(hero.target_term, "Diệp Dương");
    assert_eq!(hero.role, Role::Protagonist);
    assert_eq!(hero.first_seen_unit, Some(1));

    let pinned = reopened.lookup("蘇婉容").unwrap();
    assert!(pinned.pinned);
    assert_eq!(pinned.first_seen_unit, None);

    // The reopened store answers without proposing
    let silent = ScriptedProposer::default();
    let outcome = reopened
        .resolve(900, ["葉陽", "王媽"], &silent, &ResolveOptions::new())
        .await
        .unwrap();
    assert_eq!(outcome.target("王媽"), Some("Vương Ma"));
    assert_eq!(silent.call_count(), 0);
}

/// Test that a hand-edited translation is imported into the proposal log
#[tokio::test]
async fn test_openFile_handEditedTarget_shouldRecordImportAndConflict() {
    let temp_dir = create_temp_dir().unwrap();
    let path = temp_dir.path().join("character_glossary.json");

    {
        let store = GlossaryStore::open_file(&path).unwrap();
        store
            .resolve(1, ["葉陽"], &novel_proposer(), &ResolveOptions::new())
            .await
            .unwrap();
    }

    let edited = fs::read_to_string(&path).unwrap().replacen(
        "\"target_term\": \"Diệp Dương\"",
        "\"target_term\": \"Diệp Dương Ca\"",
        1,
    );
    fs::write(&path, edited).unwrap();

    let store = GlossaryStore::open_file(&path).unwrap();
    assert_eq!(store.lookup("葉陽").unwrap().target_term, "Diệp Dương Ca");
    assert!(store.is_dirty());

    let reports: Vec<_> = store.detect_conflicts().iter().collect();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].distinct_targets(), vec!["Diệp Dương", "Diệp Dương Ca"]);
    assert_eq!(reports[0].proposals.last().unwrap().origin, ProposalOrigin::Imported);

    // The import record reaches disk on the next checkpoint and is not duplicated afterwards
    store.checkpoint().await.unwrap();
    let reopened = GlossaryStore::open_file(&path).unwrap();
    assert!(!reopened.is_dirty());
    assert_eq!(reopened.snapshot().proposals().len(), 2);
}

/// Test that an entry with an empty translation is dropped and proposed again
#[tokio::test]
async fn test_openFile_emptyTarget_shouldDropEntry() {
    let temp_dir = create_temp_dir().unwrap();
    let path = temp_dir.path().join("character_glossary.json");
    fs::write(
        &path,
        r#"{
  "version": 1,
  "entries": [
    { "source_term": "王媽", "target_term": "", "role": "minor", "first_seen_unit": 7 },
    { "source_term": "葉陽", "target_term": "Diệp Dương", "role": "protagonist", "first_seen_unit": 1 }
  ]
}"#,
    )
    .unwrap();

    let store = GlossaryStore::open_file(&path).unwrap();
    assert_eq!(store.len(), 1);
    assert!(store.lookup("王媽").is_none());

    let proposer = novel_proposer();
    let outcome = store.resolve(8, ["王媽"], &proposer, &ResolveOptions::new()).await.unwrap();
    assert_eq!(outcome.target("王媽"), Some("Vương Ma"));
    assert_eq!(proposer.calls(), vec!["王媽".to_string()]);
}

/// Test that two entries with the same normalized key refuse to load
#[test]
fn test_openFile_duplicateKeys_shouldBeCorrupt() {
    let temp_dir = create_temp_dir().unwrap();
    let path = temp_dir.path().join("character_glossary.json");
    fs::write(
        &path,
        r#"{
  "entries": [
    { "source_term": "葉陽", "target_term": "Diệp Dương" },
    { "source_term": " 葉陽　", "target_term": "Diep Duong" }
  ]
}"#,
    )
    .unwrap();

    let result = GlossaryStore::open_file(&path);
    assert!(matches!(result, Err(GlossaryError::Corrupt { .. })));
}

/// Test that an unknown role in a hand-edited file loads as unspecified
#[test]
fn test_openFile_unknownRole_shouldLoadAsUnspecified() {
    let temp_dir = create_temp_dir().unwrap();
    let path = temp_dir.path().join("character_glossary.json");
    fs::write(
        &path,
        r#"{"entries": [{ "source_term": "葉陽", "target_term": "Diệp Dương", "role": "unknown" }]}"#,
    )
    .unwrap();

    let store = GlossaryStore::open_file(&path).unwrap();
    assert_eq!(store.lookup("葉陽").unwrap().role, Role::Unspecified);
}

/// Test that repeated flushes leave only the glossary file in its directory
#[tokio::test]
async fn test_flush_repeatedWrites_shouldLeaveNoTempFiles() {
    let temp_dir = create_temp_dir().unwrap();
    let path = temp_dir.path().join("character_glossary.json");
    let store = GlossaryStore::open_file(&path).unwrap();
    let proposer = novel_proposer();

    for (unit, term) in [(1, "葉陽"), (2, "陶興旺"), (3, "王媽")] {
        store.resolve(unit, [term], &proposer, &ResolveOptions::new()).await.unwrap();
    }
    store.set_role("王媽", Role::Supporting).await.unwrap();

    let names: Vec<String> = fs::read_dir(temp_dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["character_glossary.json".to_string()]);

    let text = fs::read_to_string(&path).unwrap();
    let first = text.find("葉陽").unwrap();
    let last = text.find("王媽").unwrap();
    assert!(first < last, "entries should be ordered by first sighting");
}

/// Test that a glossary file of another shape fails to load and is left untouched
#[test]
fn test_openFile_foreignShape_shouldBeCorruptAndKeepFile() {
    let temp_dir = create_temp_dir().unwrap();
    let path = temp_dir.path().join("character_glossary.json");
    let foreign = r#"{"characters": [{"chinese": "葉陽", "vietnamese": "Diệp Dương", "first_appearance": 1}]}"#;

    for text in [foreign, "{}"] {
        fs::write(&path, text).unwrap();

        let result = GlossaryStore::open_file(&path);
        assert!(matches!(result, Err(GlossaryError::Corrupt { .. })));
        assert_eq!(fs::read_to_string(&path).unwrap(), text);
    }
}

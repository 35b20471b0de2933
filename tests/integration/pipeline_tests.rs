/*!
 * Integration tests for concurrent chapter processing and corpus seeding.
 */

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio_util::sync::CancellationToken;

use namekeep::errors::{GlossaryError, ProposalFailure};
use namekeep::glossary::{GlossaryStore, MemoryStorage, ResolveOptions};
use namekeep::{Chapter, ChapterPipeline, CorpusScanner, ExtractionConfig, SurnameExtractor};

use crate::common::{ScriptedProposer, create_temp_dir, init_test_logger, novel_proposer, write_chapter};

fn novel_chapters() -> Vec<Chapter> {
    vec![
        Chapter::new(1, "第一章", "門口站著葉陽。"),
        Chapter::new(2, "第二章", "葉陽，看見了陶興旺。"),
        Chapter::new(3, "第三章", "陶興旺，叫來王媽。"),
        Chapter::new(4, "第四章", "葉陽，陶興旺，說話。"),
        Chapter::new(5, "第五章", "王媽，見到蘇婉容。"),
        Chapter::new(6, "第六章", "蘇婉容，葉陽。"),
    ]
}

/// Test that chapters processed concurrently agree on every name
#[tokio::test]
async fn test_processAll_concurrentChapters_shouldAgreeOnEveryName() {
    init_test_logger();
    let store = Arc::new(GlossaryStore::in_memory());
    let proposer = Arc::new(novel_proposer());
    let pipeline = ChapterPipeline::new(
        Arc::clone(&store),
        Arc::new(SurnameExtractor::with_defaults()),
        Arc::clone(&proposer),
        3,
    );

    let mut chapters = novel_chapters();
    chapters.reverse();
    let glossaries = pipeline.process_all(&chapters, |_, _| {}).await.unwrap();

    let numbers: Vec<u64> = glossaries.iter().map(|g| g.chapter_number).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);

    let mut seen: BTreeMap<String, String> = BTreeMap::new();
    for glossary in &glossaries {
        assert!(glossary.failures().is_empty());
        for (source, target) in glossary.mapping() {
            let previous = seen.entry(source).or_insert_with(|| target.clone());
            assert_eq!(*previous, target);
        }
    }

    assert_eq!(seen.len(), 4);
    assert_eq!(proposer.call_count(), 4);
    assert_eq!(store.name_mapping(), seen);
}

/// Test that a failing name only affects the chapters mentioning it
#[tokio::test]
async fn test_processAll_failingName_shouldReportPerChapter() {
    let store = Arc::new(GlossaryStore::in_memory());
    let proposer = Arc::new(novel_proposer().failing_on("王媽"));
    let pipeline = ChapterPipeline::new(store, Arc::new(SurnameExtractor::with_defaults()), proposer, 2);

    let glossaries = pipeline.process_all(&novel_chapters(), |_, _| {}).await.unwrap();

    for glossary in &glossaries {
        let failed: Vec<String> = glossary.failures().into_iter().map(|(term, _)| term).collect();
        match glossary.chapter_number {
            3 | 5 => assert_eq!(failed, vec!["王媽".to_string()]),
            _ => assert!(failed.is_empty()),
        }
    }
    assert_eq!(glossaries[4].mapping().get("蘇婉容").map(String::as_str), Some("Tô Uyển Dung"));
    assert!(matches!(
        glossaries[2].failures()[0].1,
        ProposalFailure::Provider(_)
    ));
}

/// Test that a storage failure is returned after every chapter was attempted
#[tokio::test]
async fn test_processAll_storageFailure_shouldReturnPersistenceError() {
    let storage = Arc::new(MemoryStorage::new());
    let store = Arc::new(GlossaryStore::open(storage.clone()).unwrap());
    storage.set_fail_flushes(true);

    let pipeline = ChapterPipeline::new(
        store,
        Arc::new(SurnameExtractor::with_defaults()),
        Arc::new(novel_proposer()),
        2,
    );

    let progress = AtomicUsize::new(0);
    let result = pipeline
        .process_all(&novel_chapters(), |completed, total| {
            assert_eq!(total, 6);
            progress.store(completed, Ordering::SeqCst);
        })
        .await;

    assert!(matches!(result, Err(GlossaryError::Persistence { .. })));
    assert_eq!(progress.load(Ordering::SeqCst), 6);
}

/// Test that a cancelled run proposes nothing
#[tokio::test]
async fn test_process_cancelled_shouldReportCancelledNames() {
    let store = Arc::new(GlossaryStore::in_memory());
    let proposer = Arc::new(novel_proposer());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let pipeline = ChapterPipeline::new(
        Arc::clone(&store),
        Arc::new(SurnameExtractor::with_defaults()),
        Arc::clone(&proposer),
        1,
    )
    .with_options(ResolveOptions::new().with_cancellation(cancel));

    let glossary = pipeline.process(&novel_chapters()[1]).await.unwrap();

    assert!(glossary.mapping().is_empty());
    assert!(
        glossary
            .failures()
            .iter()
            .all(|(_, failure)| *failure == ProposalFailure::Cancelled)
    );
    assert_eq!(proposer.call_count(), 0);
    assert!(store.is_empty());
}

/// Test loading crawled chapter files from disk and processing them
#[tokio::test]
async fn test_processAll_chaptersFromDisk_shouldWriteGlossaryFile() {
    let temp_dir = create_temp_dir().unwrap();
    let chapters_dir = temp_dir.path().join("chinese_chapters");
    std::fs::create_dir_all(&chapters_dir).unwrap();
    for chapter in novel_chapters() {
        write_chapter(&chapters_dir, chapter.chapter_number, &chapter.content_chinese).unwrap();
    }

    let chapters = Chapter::load_dir(&chapters_dir, Some(2)).unwrap();
    assert_eq!(chapters.len(), 2);
    assert_eq!(chapters[1].chapter_number, 2);

    let glossary_path = temp_dir.path().join("character_glossary.json");
    let store = Arc::new(GlossaryStore::open_file(&glossary_path).unwrap());
    let pipeline = ChapterPipeline::new(
        store,
        Arc::new(SurnameExtractor::with_defaults()),
        Arc::new(novel_proposer()),
        2,
    );
    pipeline.process_all(&chapters, |_, _| {}).await.unwrap();

    let reopened = GlossaryStore::open_file(&glossary_path).unwrap();
    assert_eq!(reopened.lookup("葉陽").unwrap().target_term, "Diệp Dương");
    assert_eq!(reopened.lookup("陶興旺").unwrap().first_seen_unit, Some(2));
}

/// Test that seeding from a corpus scan lets later processing skip the proposer
#[tokio::test]
async fn test_seed_thenProcess_shouldNotProposeAgain() {
    let chapters = novel_chapters();
    let store = Arc::new(GlossaryStore::in_memory());

    let scanner = CorpusScanner::new(SurnameExtractor::new(ExtractionConfig {
        min_frequency: 2,
        ..Default::default()
    }));
    let found = scanner.scan(&chapters);
    let mut by_chapter: BTreeMap<u64, Vec<_>> = BTreeMap::new();
    for candidate in &found {
        by_chapter.entry(candidate.first_chapter).or_default().push(candidate);
    }

    let seeder = novel_proposer();
    for (chapter, names) in by_chapter {
        store
            .resolve(chapter as i64, names, &seeder, &ResolveOptions::new())
            .await
            .unwrap();
    }
    assert_eq!(store.lookup("葉陽").unwrap().first_seen_unit, Some(1));
    assert_eq!(store.lookup("陶興旺").unwrap().first_seen_unit, Some(2));
    assert_eq!(store.lookup("蘇婉容").unwrap().first_seen_unit, Some(5));
    assert_eq!(seeder.call_count(), 4);

    let silent = Arc::new(ScriptedProposer::default());
    let pipeline = ChapterPipeline::new(
        Arc::clone(&store),
        Arc::new(SurnameExtractor::with_defaults()),
        Arc::clone(&silent),
        4,
    );
    let glossaries = pipeline.process_all(&chapters, |_, _| {}).await.unwrap();

    assert!(glossaries.iter().all(|g| g.failures().is_empty()));
    assert_eq!(silent.call_count(), 0);
}

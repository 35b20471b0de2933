/*!
 * Tests for name extraction and corpus scanning
 */

use namekeep::glossary::{Candidate, NameExtractor, Role};
use namekeep::{Chapter, CorpusScanner, ExtractionConfig, SurnameExtractor};

/// Test extraction over a realistic paragraph
#[test]
fn test_extract_withNovelParagraph_shouldFindEveryName() {
    let extractor = SurnameExtractor::with_defaults();
    let text = "清晨，門口站著葉陽。他轉身看見了陶興旺，又叫來王媽。局長鍾國強，早上好。";

    let names = extractor.extract(text);

    for expected in ["葉陽", "陶興旺", "王媽", "鍾國強"] {
        assert!(names.contains(expected), "missing {}", expected);
    }
}

/// Test that text without Han characters yields no names
#[test]
fn test_extract_withLatinText_shouldBeEmpty() {
    let extractor = SurnameExtractor::with_defaults();
    assert!(extractor.extract("Chapter 1: The beginning").is_empty());
}

/// Test that counts accumulate over one text
#[test]
fn test_extractCounts_withRepeatedName_shouldCountEachOccurrence() {
    let extractor = SurnameExtractor::with_defaults();
    let counts = extractor.extract_counts("葉陽。葉陽！葉陽？");
    assert_eq!(counts.get("葉陽"), Some(&3));
}

/// Test that the scanner tracks the earliest chapter mentioning a name
#[test]
fn test_scan_withUnorderedChapters_shouldUseEarliestChapter() {
    let chapters = vec![
        Chapter::new(9, "", "蘇婉容。蘇婉容。"),
        Chapter::new(4, "", "見到蘇婉容。"),
    ];

    let found = CorpusScanner::new(SurnameExtractor::with_defaults()).scan(&chapters);

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].term, "蘇婉容");
    assert_eq!(found[0].frequency, 3);
    assert_eq!(found[0].first_chapter, 4);
}

/// Test that a custom minimum frequency changes what the scan keeps
#[test]
fn test_scan_withMinFrequencyOne_shouldKeepRareNames() {
    let config = ExtractionConfig {
        min_frequency: 1,
        ..Default::default()
    };
    let chapters = vec![Chapter::new(1, "", "王媽。")];

    let found = CorpusScanner::new(SurnameExtractor::new(config)).scan(&chapters);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].role, Role::Minor);
}

/// Test that scan results convert to candidates carrying the role
#[test]
fn test_nameCandidate_intoCandidate_shouldKeepRole() {
    let chapters = vec![Chapter::new(1, "", &"葉陽。".repeat(25))];
    let found = CorpusScanner::new(SurnameExtractor::with_defaults()).scan(&chapters);

    let candidate = Candidate::from(&found[0]);
    assert_eq!(candidate.term, "葉陽");
    assert_eq!(candidate.role, Some(Role::Major));
}

/*!
 * Corpus-wide name scanning for seeding the glossary.
 */

use log::info;
use std::collections::HashMap;

use crate::chapter::Chapter;
use crate::glossary::{Candidate, Role};

use super::surname::SurnameExtractor;

/// A name found often enough across the corpus to be a character
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameCandidate {
    pub term: String,
    pub frequency: usize,
    /// First chapter whose text contains the name
    pub first_chapter: u64,
    pub role: Role,
}

impl From<&NameCandidate> for Candidate {
    fn from(candidate: &NameCandidate) -> Self {
        Candidate::with_role(candidate.term.clone(), candidate.role)
    }
}

/// Counts name frequencies over many chapters
pub struct CorpusScanner {
    extractor: SurnameExtractor,
}

impl CorpusScanner {
    pub fn new(extractor: SurnameExtractor) -> Self {
        Self { extractor }
    }

    /// Names meeting the minimum frequency, most frequent first
    pub fn scan(&self, chapters: &[Chapter]) -> Vec<NameCandidate> {
        let mut frequencies: HashMap<String, usize> = HashMap::new();
        let mut first_chapter: HashMap<String, u64> = HashMap::new();

        let mut ordered: Vec<&Chapter> = chapters.iter().collect();
        ordered.sort_by_key(|c| c.chapter_number);

        for chapter in ordered {
            for (name, count) in self.extractor.extract_counts(&chapter.text()) {
                first_chapter.entry(name.clone()).or_insert(chapter.chapter_number);
                *frequencies.entry(name).or_insert(0) += count;
            }
        }

        let min_frequency = self.extractor.config().min_frequency;
        let mut candidates: Vec<NameCandidate> = frequencies
            .into_iter()
            .filter(|(_, frequency)| *frequency >= min_frequency)
            .map(|(term, frequency)| NameCandidate {
                first_chapter: first_chapter.get(&term).copied().unwrap_or_default(),
                role: Role::from_frequency(frequency),
                term,
                frequency,
            })
            .collect();

        candidates.sort_by(|a, b| b.frequency.cmp(&a.frequency).then_with(|| a.term.cmp(&b.term)));

        info!(
            "Found {} potential characters in {} chapters",
            candidates.len(),
            chapters.len()
        );
        candidates
    }
}

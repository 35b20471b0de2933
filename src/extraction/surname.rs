/*!
 * Heuristic Chinese personal-name extraction.
 *
 * Two patterns are used:
 * - a run of Han characters ending in a known surname followed by one or two
 *   given-name characters (2 and 3 character names)
 * - two or three Han characters following a title word (局长, 先生, 小姐, ...)
 */

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::glossary::NameExtractor;

/// Runs of CJK unified ideographs in the basic block
static HAN_RUN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x{4E00}-\x{9FA5}]+").expect("Invalid Han run regex"));

/// Title words followed by a name
static TITLE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:局长|局長|警官|先生|女士|小姐|夫人|老板|老闆|师傅|師傅|大师|大師|将军|將軍|总裁|總裁|董事长|董事長|经理|經理)([\x{4E00}-\x{9FA5}]{2,3})",
    )
    .expect("Invalid title regex")
});

/// Common surnames, simplified and traditional forms
const COMMON_SURNAMES: &[char] = &[
    '王', '李', '张', '張', '刘', '劉', '陈', '陳', '杨', '楊', '黄', '黃', '赵', '趙', '周', '吴',
    '吳', '徐', '孙', '孫', '马', '馬', '朱', '胡', '郭', '何', '林', '高', '罗', '羅', '郑', '鄭',
    '梁', '谢', '謝', '宋', '唐', '许', '許', '韩', '韓', '冯', '馮', '邓', '鄧', '曹', '彭', '曾',
    '萧', '蕭', '田', '董', '潘', '袁', '蔡', '蒋', '蔣', '余', '叶', '葉', '陶', '姜', '范', '方',
    '石', '姚', '廖', '邹', '鄒', '陆', '陸', '苏', '蘇',
];

/// Configuration for name extraction.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Minimum occurrences across a corpus to consider a name significant
    pub min_frequency: usize,

    /// Whether to extract names following title words
    pub extract_titled: bool,

    /// Additional surnames beyond the built-in list
    pub extra_surnames: Vec<char>,

    /// Strings never reported as names
    pub exclude_words: HashSet<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_frequency: 3,
            extract_titled: true,
            extra_surnames: Vec::new(),
            exclude_words: HashSet::new(),
        }
    }
}

impl ExtractionConfig {
    /// Add a word to the exclusion list.
    pub fn exclude(mut self, word: &str) -> Self {
        self.exclude_words.insert(word.to_string());
        self
    }

    /// Add a surname to recognize.
    pub fn with_surname(mut self, surname: char) -> Self {
        self.extra_surnames.push(surname);
        self
    }
}

/// Surname- and title-based name extractor
#[derive(Debug, Clone)]
pub struct SurnameExtractor {
    config: ExtractionConfig,
    surnames: HashSet<char>,
}

impl SurnameExtractor {
    /// Create a new extractor with the given configuration.
    pub fn new(config: ExtractionConfig) -> Self {
        let surnames = COMMON_SURNAMES
            .iter()
            .chain(config.extra_surnames.iter())
            .copied()
            .collect();
        Self { config, surnames }
    }

    /// Create an extractor with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ExtractionConfig::default())
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Every potential name in `text`, with how often it occurs
    pub fn extract_counts(&self, text: &str) -> BTreeMap<String, usize> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut record = |name: String| {
            if !self.config.exclude_words.contains(&name) {
                *counts.entry(name).or_insert(0) += 1;
            }
        };

        for run in HAN_RUN_PATTERN.find_iter(text) {
            let chars: Vec<char> = run.as_str().chars().collect();
            for len in [2usize, 3] {
                if chars.len() >= len && self.surnames.contains(&chars[chars.len() - len]) {
                    record(chars[chars.len() - len..].iter().collect());
                }
            }
        }

        if self.config.extract_titled {
            for cap in TITLE_PATTERN.captures_iter(text) {
                if let Some(name) = cap.get(1) {
                    record(name.as_str().to_string());
                }
            }
        }

        counts
    }
}

impl NameExtractor for SurnameExtractor {
    fn extract(&self, unit_text: &str) -> BTreeSet<String> {
        self.extract_counts(unit_text).into_keys().collect()
    }
}

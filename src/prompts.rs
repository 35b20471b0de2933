/*!
 * Prompt templates for name proposals and the glossary block.
 *
 * The name template asks for a phonetic Sino-Vietnamese rendering and shows a
 * few worked examples; the glossary block is what chapter translation prompts
 * embed to keep names consistent.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

/// Reasoning models wrap their chain of thought in these tags
static THINK_BLOCK_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("Invalid think block regex"));

/// Quotes and punctuation trimmed from around a proposed name
const TRIM_CHARS: &[char] = &[
    '"', '\'', '`', '“', '”', '‘', '’', '「', '」', '『', '』', '.', '。', ',', '，', ':', '：', ';', '!',
    '?', '*',
];

/// Prompt template for proposing one translated name.
#[derive(Debug, Clone)]
pub struct NamePromptTemplate {
    template: String,
}

impl NamePromptTemplate {
    /// The default system prompt for name proposals.
    pub const NAME_TRANSLATOR_SYSTEM: &'static str = r#"You are an expert {source_language} to {target_language} literary translator.
You translate character names from web novels phonetically, using the conventional Sino-{target_language} reading of each character.
Answer with the translated name only: no explanation, no quotes, no original script."#;

    /// The default user prompt for name proposals.
    pub const NAME_TRANSLATOR: &'static str = r#"Translate this {source_language} name to {target_language} phonetically.
{source_language} name: {term}

Provide ONLY the {target_language} romanization, nothing else. For example:
- 葉陽 → Diệp Dương
- 王媽 → Vương Ma
- 蘇婉容 → Tô Uyển Dung

{target_language} name:"#;

    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// Create the default name translator template.
    pub fn name_translator() -> Self {
        Self::new(Self::NAME_TRANSLATOR)
    }

    /// Render the template for one term.
    pub fn render(&self, source_language: &str, target_language: &str, term: &str) -> String {
        self.template
            .replace("{source_language}", source_language)
            .replace("{target_language}", target_language)
            .replace("{term}", term)
    }

    /// Render the system prompt that accompanies the template.
    pub fn render_system(source_language: &str, target_language: &str) -> String {
        Self::NAME_TRANSLATOR_SYSTEM
            .replace("{source_language}", source_language)
            .replace("{target_language}", target_language)
    }
}

impl Default for NamePromptTemplate {
    fn default() -> Self {
        Self::name_translator()
    }
}

/// Render the glossary block a chapter translation prompt embeds.
///
/// Returns an empty string when there are no names, so callers can append it
/// unconditionally.
pub fn render_name_glossary(mapping: &BTreeMap<String, String>, source_language: &str, target_language: &str) -> String {
    if mapping.is_empty() {
        return String::new();
    }

    let mut block = format!("Character Name Glossary ({} → {}):\n", source_language, target_language);
    for (source, target) in mapping {
        block.push_str(&format!("- {} → {}\n", source, target));
    }
    block
}

/// Extract the proposed name from a raw model reply.
///
/// Drops `<think>` blocks, keeps the first non-empty line, strips an echoed
/// "source → " prefix or "Name:" label, then trims quotes and punctuation.
pub fn clean_proposal(reply: &str) -> String {
    let without_thinking = THINK_BLOCK_PATTERN.replace_all(reply, "");

    let line = without_thinking
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default();

    let line = line.trim_start_matches(['-', '*', '•']).trim();
    let line = match line.rsplit_once('→') {
        Some((_, rest)) => rest,
        None => line,
    };
    let line = match line.split_once(':') {
        Some((label, rest)) if label.ends_with("name") || label.ends_with("Name") => rest,
        _ => line,
    };

    line.trim().trim_matches(TRIM_CHARS).trim().to_string()
}

/*!
 * # namekeep - character-name glossary for machine-translated novels
 *
 * Keeps proper nouns consistent across a Chinese web novel translated to
 * Vietnamese chapter by chapter, possibly out of order and across restarts.
 *
 * ## Features
 *
 * - First-resolution-wins glossary with manual pinning by an operator
 * - Durable JSON glossary, flushed atomically after every change
 * - Proposal log with conflict review
 * - Heuristic Chinese name extraction and corpus seeding
 * - LLM name proposals through a local Ollama server
 * - Concurrent chapter processing against one shared store
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `glossary`: the `GlossaryStore`, its entries, storage and conflict review
 * - `extraction`: surname/title name extractor and corpus frequency scan
 * - `providers`: LLM clients and the `LlmNameProposer`:
 *   - `providers::ollama`: Ollama API client
 *   - `providers::mock`: scripted provider for tests
 * - `prompts`: name proposal template and glossary prompt block
 * - `pipeline`: concurrent extract → resolve over many chapters
 * - `chapter`: crawled chapter files
 * - `app_config`: Configuration management
 * - `file_utils`: File system operations
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod chapter;
pub mod errors;
pub mod extraction;
pub mod file_utils;
pub mod glossary;
pub mod language_utils;
pub mod pipeline;
pub mod prompts;
pub mod providers;

// Re-export main types for easier usage
pub use app_config::Config;
pub use chapter::Chapter;
pub use errors::{GlossaryError, ProposalFailure, ProviderError};
pub use extraction::{CorpusScanner, ExtractionConfig, NameCandidate, SurnameExtractor};
pub use glossary::{
    Actor, Candidate, GlossaryEntry, GlossaryStore, NameExtractor, NameProposer, ResolveOptions, ResolveOutcome,
    Role, TermResolution,
};
pub use language_utils::{get_language_name, language_codes_match, normalize_to_part2t};
pub use pipeline::{ChapterGlossary, ChapterPipeline};
pub use providers::LlmNameProposer;

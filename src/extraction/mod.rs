/*!
 * Candidate name extraction from chapter text.
 *
 * - `surname`: per-chapter heuristic extractor
 * - `corpus`: frequency scan across many chapters for seeding
 */

pub mod corpus;
pub mod surname;

pub use corpus::{CorpusScanner, NameCandidate};
pub use surname::{ExtractionConfig, SurnameExtractor};

/*!
 * Character-name glossary.
 *
 * - `store`: the `GlossaryStore` and its resolution policy
 * - `entry`: entries, roles and the proposal log
 * - `storage`: persisted JSON document and storage backends
 * - `resolution`: candidates, per-term results and batch options
 * - `conflicts`: review of disagreeing proposals
 * - `capability`: proposer and extractor seams
 * - `normalize`: the key normalization rule
 */

pub mod capability;
pub mod conflicts;
pub mod entry;
pub mod normalize;
pub mod resolution;
pub mod storage;
pub mod store;

// Re-export main types
pub use capability::{AsyncFnProposer, FnProposer, NameExtractor, NameProposer};
pub use conflicts::{ConflictReport, ConflictScan};
pub use entry::{Actor, GlossaryEntry, ProposalOrigin, ProposalRecord, Role};
pub use normalize::normalize_term;
pub use resolution::{Candidate, ResolutionOrigin, ResolveOptions, ResolveOutcome, TermResolution};
pub use storage::{GlossaryDocument, GlossaryStorage, JsonFileStorage, MemoryStorage};
pub use store::{GlossaryState, GlossaryStore};

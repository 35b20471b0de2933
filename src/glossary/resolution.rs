/*!
 * Inputs and outputs of a resolution batch.
 */

use std::collections::BTreeMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::errors::ProposalFailure;

use super::entry::Role;

/// A term surfaced by the name extractor, with an optional role hint
/// applied only if the term is new to the glossary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub term: String,
    pub role: Option<Role>,
}

impl Candidate {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            role: None,
        }
    }

    pub fn with_role(term: impl Into<String>, role: Role) -> Self {
        Self {
            term: term.into(),
            role: Some(role),
        }
    }
}

impl From<&str> for Candidate {
    fn from(term: &str) -> Self {
        Self::new(term)
    }
}

impl From<String> for Candidate {
    fn from(term: String) -> Self {
        Self::new(term)
    }
}

impl From<&String> for Candidate {
    fn from(term: &String) -> Self {
        Self::new(term.clone())
    }
}

/// Where a resolved translation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionOrigin {
    /// The glossary already had the term
    Existing,
    /// The term was proposed and added during this batch
    Created,
}

/// Resolution of a single candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermResolution {
    Resolved {
        target: String,
        origin: ResolutionOrigin,
    },
    Failed(ProposalFailure),
}

impl TermResolution {
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Resolved { target, .. } => Some(target),
            Self::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ProposalFailure> {
        match self {
            Self::Resolved { .. } => None,
            Self::Failed(failure) => Some(failure),
        }
    }
}

/// Per-candidate result of `GlossaryStore::resolve`.
///
/// Every candidate passed in has exactly one result, keyed by the candidate
/// as the caller spelled it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOutcome {
    pub unit_index: u64,
    results: BTreeMap<String, TermResolution>,
}

impl ResolveOutcome {
    pub(crate) fn new(unit_index: u64) -> Self {
        Self {
            unit_index,
            results: BTreeMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, term: String, resolution: TermResolution) {
        self.results.insert(term, resolution);
    }

    pub(crate) fn contains(&self, term: &str) -> bool {
        self.results.contains_key(term)
    }

    pub fn get(&self, term: &str) -> Option<&TermResolution> {
        self.results.get(term)
    }

    /// Translation chosen for `term`, if it resolved
    pub fn target(&self, term: &str) -> Option<&str> {
        self.results.get(term).and_then(TermResolution::target)
    }

    /// `source -> target` for every candidate that resolved
    pub fn mapping(&self) -> BTreeMap<String, String> {
        self.results
            .iter()
            .filter_map(|(term, resolution)| resolution.target().map(|t| (term.clone(), t.to_string())))
            .collect()
    }

    /// Candidates that could not be resolved in this batch
    pub fn failures(&self) -> impl Iterator<Item = (&str, &ProposalFailure)> {
        self.results
            .iter()
            .filter_map(|(term, resolution)| resolution.failure().map(|f| (term.as_str(), f)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TermResolution)> {
        self.results.iter().map(|(term, resolution)| (term.as_str(), resolution))
    }

    /// Whether every candidate resolved
    pub fn is_complete(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn created_count(&self) -> usize {
        self.results
            .values()
            .filter(|r| matches!(r, TermResolution::Resolved { origin: ResolutionOrigin::Created, .. }))
            .count()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Bounds on how long one batch may wait for the translation capability
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Per-proposal time limit
    pub timeout: Option<Duration>,
    /// Cancels outstanding and remaining proposals of the batch
    pub cancel: CancellationToken,
}

impl ResolveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/*!
 * Conflict review over the proposal log.
 *
 * A conflict is a source term for which more than one distinct translation
 * was ever proposed, pinned or imported. Scans are bound to the snapshot
 * they were taken from and can be iterated any number of times.
 */

use std::collections::BTreeMap;
use std::sync::Arc;

use super::entry::ProposalRecord;
use super::store::GlossaryState;

/// One term with disagreeing proposals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictReport {
    pub source_term: String,
    /// Translation the glossary currently uses, if the entry still exists
    pub current_target: Option<String>,
    pub pinned: bool,
    /// Every logged proposal for the term, oldest first
    pub proposals: Vec<ProposalRecord>,
}

impl ConflictReport {
    /// Distinct proposed translations in first-proposed order
    pub fn distinct_targets(&self) -> Vec<&str> {
        let mut targets: Vec<&str> = Vec::new();
        for proposal in &self.proposals {
            if !targets.contains(&proposal.target_term.as_str()) {
                targets.push(&proposal.target_term);
            }
        }
        targets
    }
}

/// Restartable conflict scan over one glossary snapshot
#[derive(Debug, Clone)]
pub struct ConflictScan {
    snapshot: Arc<GlossaryState>,
    by_term: BTreeMap<String, Vec<usize>>,
}

impl ConflictScan {
    pub(crate) fn new(snapshot: Arc<GlossaryState>) -> Self {
        let mut by_term: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (index, proposal) in snapshot.proposals().iter().enumerate() {
            by_term.entry(proposal.source_term.clone()).or_default().push(index);
        }
        Self { snapshot, by_term }
    }

    /// Lazily yield conflicting terms in key order
    pub fn iter(&self) -> impl Iterator<Item = ConflictReport> + '_ {
        let proposals = self.snapshot.proposals();
        self.by_term.iter().filter_map(move |(term, indices)| {
            let first = &proposals[indices[0]].target_term;
            let disagrees = indices.iter().any(|&i| &proposals[i].target_term != first);
            if !disagrees {
                return None;
            }

            let entry = self.snapshot.get(term);
            Some(ConflictReport {
                source_term: term.clone(),
                current_target: entry.map(|e| e.target_term.clone()),
                pinned: entry.is_some_and(|e| e.pinned),
                proposals: indices.iter().map(|&i| proposals[i].clone()).collect(),
            })
        })
    }
}

impl<'a> IntoIterator for &'a ConflictScan {
    type Item = ConflictReport;
    type IntoIter = Box<dyn Iterator<Item = ConflictReport> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

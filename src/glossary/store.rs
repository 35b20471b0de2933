/*!
 * The glossary store.
 *
 * `GlossaryStore` owns every glossary entry and is the only way to change
 * one. The first translation resolved for a term is sticky: later chapters,
 * retries and out-of-order workers all get the same answer until an operator
 * pins a different one.
 *
 * Concurrency:
 * - every mutation runs under one async writer gate, held across the
 *   proposer calls of a batch
 * - committed state is published as an immutable `Arc<GlossaryState>`, so
 *   lookups and all-hit `resolve` calls never wait on the writer
 * - state is published before it is flushed; a failed flush leaves the store
 *   dirty and the next mutation or `checkpoint` flushes again
 */

use log::{debug, info, warn};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

use crate::errors::{GlossaryError, ProposalFailure};

use super::capability::NameProposer;
use super::conflicts::ConflictScan;
use super::entry::{Actor, GlossaryEntry, ProposalOrigin, ProposalRecord, Role};
use super::normalize::{normalize_target, normalize_term};
use super::resolution::{Candidate, ResolutionOrigin, ResolveOptions, ResolveOutcome, TermResolution};
use super::storage::{FORMAT_VERSION, GlossaryDocument, GlossaryStorage, JsonFileStorage, MemoryStorage};

/// Immutable view of the glossary at one point in time
#[derive(Debug, Clone, Default)]
pub struct GlossaryState {
    /// Normalized source term -> entry
    entries: BTreeMap<String, GlossaryEntry>,
    /// Normalized alias -> owning source term
    aliases: HashMap<String, String>,
    proposals: Vec<ProposalRecord>,
}

impl GlossaryState {
    /// Look up an entry by source term or alias
    pub fn get(&self, term: &str) -> Option<&GlossaryEntry> {
        let key = normalize_term(term);
        self.canonical_key(&key).and_then(|k| self.entries.get(k))
    }

    pub fn contains(&self, term: &str) -> bool {
        self.get(term).is_some()
    }

    /// Entries in key order
    pub fn entries(&self) -> impl Iterator<Item = &GlossaryEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The proposal log, oldest first
    pub fn proposals(&self) -> &[ProposalRecord] {
        &self.proposals
    }

    /// `source -> target` for every entry
    pub fn name_mapping(&self) -> BTreeMap<String, String> {
        self.entries
            .values()
            .map(|e| (e.source_term.clone(), e.target_term.clone()))
            .collect()
    }

    /// Share of logged proposals agreeing with the current translation.
    /// Pinned entries and entries without history are fully trusted.
    pub fn confidence(&self, term: &str) -> Option<f64> {
        let entry = self.get(term)?;
        if entry.pinned {
            return Some(1.0);
        }

        let (agreeing, total) = self
            .proposals
            .iter()
            .filter(|p| p.source_term == entry.source_term)
            .fold((0usize, 0usize), |(agreeing, total), p| {
                (agreeing + usize::from(p.target_term == entry.target_term), total + 1)
            });

        if total == 0 {
            return Some(1.0);
        }
        Some(agreeing as f64 / total as f64)
    }

    fn canonical_key<'a>(&'a self, key: &'a str) -> Option<&'a str> {
        if self.entries.contains_key(key) {
            return Some(key);
        }
        self.aliases.get(key).map(String::as_str)
    }

    fn insert_entry(&mut self, entry: GlossaryEntry) {
        for alias in &entry.aliases {
            self.aliases.insert(alias.clone(), entry.source_term.clone());
        }
        self.entries.insert(entry.source_term.clone(), entry);
    }

    /// Build a state from a persisted document.
    ///
    /// Returns the state and whether loading added import records, in which
    /// case the document on disk is behind and should be flushed.
    pub fn from_document(document: GlossaryDocument, location: &str) -> Result<(Self, bool), GlossaryError> {
        let corrupt = |message: String| GlossaryError::Corrupt {
            location: location.to_string(),
            message,
        };

        let mut state = Self {
            proposals: document
                .proposals
                .into_iter()
                .map(|mut p| {
                    p.source_term = normalize_term(&p.source_term);
                    p
                })
                .collect(),
            ..Self::default()
        };

        for mut entry in document.entries {
            entry.source_term = normalize_term(&entry.source_term);
            entry.target_term = normalize_target(&entry.target_term);

            if entry.source_term.is_empty() {
                return Err(corrupt("entry with an empty source_term".to_string()));
            }
            if entry.target_term.is_empty() {
                warn!(
                    "Dropping untranslated glossary entry '{}'; it will be proposed again when next seen",
                    entry.source_term
                );
                continue;
            }
            if state.canonical_key(&entry.source_term).is_some() {
                return Err(corrupt(format!("duplicate source_term '{}'", entry.source_term)));
            }

            let mut aliases = Vec::with_capacity(entry.aliases.len());
            for alias in &entry.aliases {
                let alias = normalize_term(alias);
                if alias.is_empty() || alias == entry.source_term || aliases.contains(&alias) {
                    continue;
                }
                if state.canonical_key(&alias).is_some() {
                    return Err(corrupt(format!(
                        "alias '{}' of '{}' collides with another entry",
                        alias, entry.source_term
                    )));
                }
                aliases.push(alias);
            }
            entry.aliases = aliases;

            state.insert_entry(entry);
        }

        // Hand edits show up as translations the log has never seen
        let mut imported = Vec::new();
        for entry in state.entries.values() {
            let logged = state
                .proposals
                .iter()
                .any(|p| p.source_term == entry.source_term && p.target_term == entry.target_term);
            if !logged {
                imported.push(ProposalRecord::new(
                    &entry.source_term,
                    &entry.target_term,
                    entry.first_seen_unit,
                    ProposalOrigin::Imported,
                ));
            }
        }
        let needs_flush = !imported.is_empty();
        if needs_flush {
            info!("Recorded {} glossary entries not present in the proposal log", imported.len());
        }
        state.proposals.extend(imported);

        Ok((state, needs_flush))
    }

    /// Render the persisted form: entries ordered by first sighting, then key
    pub fn to_document(&self) -> GlossaryDocument {
        let mut entries: Vec<GlossaryEntry> = self.entries.values().cloned().collect();
        entries.sort_by(|a, b| {
            (a.first_seen_unit.is_none(), a.first_seen_unit, &a.source_term)
                .cmp(&(b.first_seen_unit.is_none(), b.first_seen_unit, &b.source_term))
        });

        GlossaryDocument {
            version: FORMAT_VERSION,
            entries,
            proposals: self.proposals.clone(),
        }
    }
}

/// Process-wide owner of the glossary
pub struct GlossaryStore {
    storage: Arc<dyn GlossaryStorage>,
    published: RwLock<Arc<GlossaryState>>,
    writer: Mutex<()>,
    dirty: AtomicBool,
}

impl GlossaryStore {
    /// Load the glossary from `storage`
    pub fn open(storage: Arc<dyn GlossaryStorage>) -> Result<Self, GlossaryError> {
        let location = storage.location();
        let (state, needs_flush) = match storage.load()? {
            Some(document) => GlossaryState::from_document(document, &location)?,
            None => (GlossaryState::default(), false),
        };

        info!("Loaded glossary from {} ({} entries)", location, state.len());

        Ok(Self {
            storage,
            published: RwLock::new(Arc::new(state)),
            writer: Mutex::new(()),
            dirty: AtomicBool::new(needs_flush),
        })
    }

    /// Load the glossary from a JSON file, starting empty if it does not exist
    pub fn open_file<P: AsRef<Path>>(path: P) -> Result<Self, GlossaryError> {
        Self::open(Arc::new(JsonFileStorage::new(path)))
    }

    /// An empty store that is never written to disk
    pub fn in_memory() -> Self {
        Self {
            storage: Arc::new(MemoryStorage::new()),
            published: RwLock::new(Arc::new(GlossaryState::default())),
            writer: Mutex::new(()),
            dirty: AtomicBool::new(false),
        }
    }

    /// The current committed state
    pub fn snapshot(&self) -> Arc<GlossaryState> {
        self.published.read().clone()
    }

    /// Look up one entry by source term or alias
    pub fn lookup(&self, term: &str) -> Option<GlossaryEntry> {
        self.snapshot().get(term).cloned()
    }

    /// `source -> target` for every entry
    pub fn name_mapping(&self) -> BTreeMap<String, String> {
        self.snapshot().name_mapping()
    }

    pub fn confidence(&self, term: &str) -> Option<f64> {
        self.snapshot().confidence(term)
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Whether in-memory state is ahead of durable storage
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    pub fn location(&self) -> String {
        self.storage.location()
    }

    /// Resolve the candidate terms of one chapter.
    ///
    /// Known terms (by key or alias) return their existing translation
    /// without calling `proposer`. Unknown terms are proposed, added with
    /// `first_seen_unit = unit_index` and flushed before this returns. A
    /// failed proposal is reported for its term only; a failed flush fails
    /// the whole call.
    pub async fn resolve<I, C, P>(
        &self,
        unit_index: i64,
        candidates: I,
        proposer: &P,
        options: &ResolveOptions,
    ) -> Result<ResolveOutcome, GlossaryError>
    where
        I: IntoIterator<Item = C>,
        C: Into<Candidate>,
        P: NameProposer + ?Sized,
    {
        let unit = u64::try_from(unit_index).map_err(|_| {
            GlossaryError::Validation(format!("unit index must be non-negative, got {}", unit_index))
        })?;
        let candidates: Vec<Candidate> = candidates.into_iter().map(Into::into).collect();

        if let Some(outcome) = self.resolve_from_snapshot(unit, &candidates) {
            return Ok(outcome);
        }

        let _writer = self.writer.lock().await;
        let mut working = (*self.snapshot()).clone();
        let mut outcome = ResolveOutcome::new(unit);
        let mut changed = false;

        for candidate in candidates {
            if outcome.contains(&candidate.term) {
                continue;
            }

            let key = normalize_term(&candidate.term);
            if key.is_empty() {
                outcome.insert(candidate.term, TermResolution::Failed(ProposalFailure::InvalidTerm));
                continue;
            }

            if let Some(canonical) = working.canonical_key(&key).map(str::to_string) {
                if let Some(entry) = working.entries.get_mut(&canonical) {
                    changed |= entry.observe(unit);
                    outcome.insert(
                        candidate.term,
                        TermResolution::Resolved {
                            target: entry.target_term.clone(),
                            origin: ResolutionOrigin::Existing,
                        },
                    );
                }
                continue;
            }

            if options.cancel.is_cancelled() {
                outcome.insert(candidate.term, TermResolution::Failed(ProposalFailure::Cancelled));
                continue;
            }

            match propose_one(&key, proposer, options).await {
                Ok(target) => {
                    debug!("Chapter {}: {} → {}", unit, key, target);
                    working.proposals.push(ProposalRecord::new(
                        &key,
                        &target,
                        Some(unit),
                        ProposalOrigin::Automated,
                    ));
                    working.insert_entry(GlossaryEntry::observed(
                        &key,
                        &target,
                        candidate.role.unwrap_or_default(),
                        unit,
                    ));
                    changed = true;
                    outcome.insert(
                        candidate.term,
                        TermResolution::Resolved {
                            target,
                            origin: ResolutionOrigin::Created,
                        },
                    );
                }
                Err(failure) => {
                    warn!("Chapter {}: could not resolve '{}': {}", unit, key, failure);
                    outcome.insert(candidate.term, TermResolution::Failed(failure));
                }
            }
        }

        if changed {
            self.publish(working);
        }
        if self.is_dirty() {
            self.flush_published().await?;
        }

        if outcome.created_count() > 0 {
            info!("Chapter {}: added {} glossary entries", unit, outcome.created_count());
        }
        Ok(outcome)
    }

    /// Answer a batch from the published snapshot when it needs no writes
    fn resolve_from_snapshot(&self, unit: u64, candidates: &[Candidate]) -> Option<ResolveOutcome> {
        // Snapshot before the dirty check: `publish` raises the flag before
        // swapping, so a snapshot holding unflushed entries always sees it set
        let snapshot = self.snapshot();
        if self.is_dirty() {
            return None;
        }

        let mut outcome = ResolveOutcome::new(unit);
        for candidate in candidates {
            let key = normalize_term(&candidate.term);
            if key.is_empty() {
                outcome.insert(candidate.term.clone(), TermResolution::Failed(ProposalFailure::InvalidTerm));
                continue;
            }
            let entry = snapshot.get(&key)?;
            if entry.first_seen_unit.is_none() {
                return None;
            }
            outcome.insert(
                candidate.term.clone(),
                TermResolution::Resolved {
                    target: entry.target_term.clone(),
                    origin: ResolutionOrigin::Existing,
                },
            );
        }
        Some(outcome)
    }

    /// Pin `target_term` as the translation of `source_term`.
    ///
    /// Creates the entry if needed. Pinned entries are never changed by
    /// `resolve`; only another override replaces them.
    pub async fn override_term(
        &self,
        source_term: &str,
        target_term: &str,
        actor: Actor,
    ) -> Result<GlossaryEntry, GlossaryError> {
        let key = normalize_term(source_term);
        let target = normalize_target(target_term);
        if key.is_empty() {
            return Err(GlossaryError::Validation("source term must not be empty".to_string()));
        }
        if target.is_empty() {
            return Err(GlossaryError::Validation(format!(
                "target term for '{}' must not be empty",
                key
            )));
        }

        self.mutate(|state| {
            let canonical = state.canonical_key(&key).map(str::to_string).unwrap_or_else(|| key.clone());
            let entry = state
                .entries
                .entry(canonical.clone())
                .or_insert_with(|| GlossaryEntry::pinned(&canonical, &target));
            if entry.target_term != target {
                info!("Pinned '{}': {} → {}", canonical, entry.target_term, target);
            }
            entry.target_term = target.clone();
            entry.pinned = true;
            let entry = entry.clone();

            state.proposals.push(
                ProposalRecord::new(&canonical, &target, None, ProposalOrigin::Manual).with_actor(actor.name()),
            );
            Ok(entry)
        })
        .await
    }

    /// Change the informational role of an entry
    pub async fn set_role(&self, term: &str, role: Role) -> Result<GlossaryEntry, GlossaryError> {
        let key = normalize_term(term);
        self.mutate(|state| {
            let canonical = state
                .canonical_key(&key)
                .map(str::to_string)
                .ok_or_else(|| GlossaryError::UnknownTerm(key.clone()))?;
            let entry = state
                .entries
                .get_mut(&canonical)
                .ok_or_else(|| GlossaryError::UnknownTerm(canonical.clone()))?;
            entry.role = role;
            Ok(entry.clone())
        })
        .await
    }

    /// Make `alias` resolve to the entry for `term`
    pub async fn add_alias(&self, term: &str, alias: &str) -> Result<GlossaryEntry, GlossaryError> {
        let key = normalize_term(term);
        let alias = normalize_term(alias);
        if alias.is_empty() {
            return Err(GlossaryError::Validation("alias must not be empty".to_string()));
        }

        self.mutate(|state| {
            let canonical = state
                .canonical_key(&key)
                .map(str::to_string)
                .ok_or_else(|| GlossaryError::UnknownTerm(key.clone()))?;
            match state.canonical_key(&alias) {
                Some(owner) if owner == canonical => {}
                Some(owner) => {
                    return Err(GlossaryError::Validation(format!(
                        "'{}' already resolves to '{}'",
                        alias, owner
                    )));
                }
                None => {
                    state.aliases.insert(alias.clone(), canonical.clone());
                    if let Some(entry) = state.entries.get_mut(&canonical) {
                        entry.aliases.push(alias.clone());
                    }
                }
            }
            state
                .entries
                .get(&canonical)
                .cloned()
                .ok_or_else(|| GlossaryError::UnknownTerm(canonical.clone()))
        })
        .await
    }

    /// Delete an entry. Its proposal history is kept for conflict review.
    pub async fn remove(&self, term: &str) -> Result<GlossaryEntry, GlossaryError> {
        let key = normalize_term(term);
        self.mutate(|state| {
            let canonical = state
                .canonical_key(&key)
                .map(str::to_string)
                .ok_or_else(|| GlossaryError::UnknownTerm(key.clone()))?;
            let entry = state
                .entries
                .remove(&canonical)
                .ok_or_else(|| GlossaryError::UnknownTerm(canonical.clone()))?;
            state.aliases.retain(|_, owner| owner != &canonical);
            info!("Removed glossary entry '{}'", canonical);
            Ok(entry)
        })
        .await
    }

    /// Scan the proposal log of the current snapshot for disagreeing proposals
    pub fn detect_conflicts(&self) -> ConflictScan {
        ConflictScan::new(self.snapshot())
    }

    /// Flush pending state to durable storage
    pub async fn checkpoint(&self) -> Result<(), GlossaryError> {
        let _writer = self.writer.lock().await;
        if self.is_dirty() {
            self.flush_published().await?;
        }
        Ok(())
    }

    async fn mutate<T, F>(&self, apply: F) -> Result<T, GlossaryError>
    where
        F: FnOnce(&mut GlossaryState) -> Result<T, GlossaryError>,
    {
        let _writer = self.writer.lock().await;
        let mut working = (*self.snapshot()).clone();
        let value = apply(&mut working)?;
        self.publish(working);
        self.flush_published().await?;
        Ok(value)
    }

    fn publish(&self, state: GlossaryState) {
        self.dirty.store(true, Ordering::SeqCst);
        *self.published.write() = Arc::new(state);
    }

    /// Write the published state. Callers hold the writer gate.
    async fn flush_published(&self) -> Result<(), GlossaryError> {
        let document = self.snapshot().to_document();
        let storage = Arc::clone(&self.storage);

        tokio::task::spawn_blocking(move || storage.flush(&document))
            .await
            .map_err(|e| GlossaryError::Persistence {
                location: self.storage.location(),
                message: e.to_string(),
            })??;

        self.dirty.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// Ask the proposer for one term, bounded by the batch's timeout and cancellation
async fn propose_one<P>(key: &str, proposer: &P, options: &ResolveOptions) -> Result<String, ProposalFailure>
where
    P: NameProposer + ?Sized,
{
    let proposal = async {
        match options.timeout {
            Some(limit) => match tokio::time::timeout(limit, proposer.propose(key)).await {
                Ok(result) => result.map_err(ProposalFailure::from),
                Err(_) => Err(ProposalFailure::TimedOut(limit)),
            },
            None => proposer.propose(key).await.map_err(ProposalFailure::from),
        }
    };

    let proposed = tokio::select! {
        biased;
        _ = options.cancel.cancelled() => return Err(ProposalFailure::Cancelled),
        result = proposal => result?,
    };

    let proposed = normalize_target(&proposed);
    if proposed.is_empty() {
        return Err(ProposalFailure::EmptyProposal);
    }
    Ok(proposed)
}

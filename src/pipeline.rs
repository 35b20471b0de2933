/*!
 * Concurrent chapter processing.
 *
 * Each chapter is run through extract → resolve against the shared store.
 * Chapters may finish in any order; the store keeps their glossary
 * decisions consistent regardless.
 */

use futures::stream::{self, StreamExt};
use log::{error, info};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tokio::sync::Semaphore;

use crate::chapter::Chapter;
use crate::errors::{GlossaryError, ProposalFailure};
use crate::glossary::{GlossaryStore, NameExtractor, NameProposer, ResolveOptions, ResolveOutcome};
use crate::prompts::render_name_glossary;

/// Glossary decisions for one chapter
#[derive(Debug, Clone)]
pub struct ChapterGlossary {
    pub chapter_number: u64,
    pub outcome: ResolveOutcome,
}

impl ChapterGlossary {
    /// Names the chapter's translation must use
    pub fn mapping(&self) -> BTreeMap<String, String> {
        self.outcome.mapping()
    }

    /// Names that could not be resolved for this chapter
    pub fn failures(&self) -> Vec<(String, ProposalFailure)> {
        self.outcome
            .failures()
            .map(|(term, failure)| (term.to_string(), failure.clone()))
            .collect()
    }

    /// Glossary block for the chapter's translation prompt
    pub fn prompt_block(&self, source_language: &str, target_language: &str) -> String {
        render_name_glossary(&self.mapping(), source_language, target_language)
    }
}

/// Runs extract → resolve for many chapters with bounded concurrency
pub struct ChapterPipeline<E: ?Sized, P: ?Sized> {
    store: Arc<GlossaryStore>,
    extractor: Arc<E>,
    proposer: Arc<P>,
    /// Bounds callers of `process` that share one pipeline across tasks;
    /// `process_all` also caps its stream so it never queues more futures
    semaphore: Arc<Semaphore>,
    max_concurrent_chapters: usize,
    options: ResolveOptions,
}

impl<E, P> ChapterPipeline<E, P>
where
    E: NameExtractor + ?Sized,
    P: NameProposer + ?Sized,
{
    pub fn new(store: Arc<GlossaryStore>, extractor: Arc<E>, proposer: Arc<P>, max_concurrent_chapters: usize) -> Self {
        let max_concurrent_chapters = max_concurrent_chapters.max(1);
        Self {
            store,
            extractor,
            proposer,
            semaphore: Arc::new(Semaphore::new(max_concurrent_chapters)),
            max_concurrent_chapters,
            options: ResolveOptions::default(),
        }
    }

    /// Timeout and cancellation applied to every chapter's proposals
    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    pub fn store(&self) -> &Arc<GlossaryStore> {
        &self.store
    }

    /// Extract the chapter's names and resolve them.
    ///
    /// At most `max_concurrent_chapters` calls run at once, however many
    /// tasks call this on the same pipeline.
    pub async fn process(&self, chapter: &Chapter) -> Result<ChapterGlossary, GlossaryError> {
        let _permit = self.semaphore.acquire().await.ok();

        let unit = i64::try_from(chapter.chapter_number).map_err(|_| {
            GlossaryError::Validation(format!("chapter number {} is out of range", chapter.chapter_number))
        })?;
        let names = self.extractor.extract(&chapter.text());

        let outcome = self
            .store
            .resolve(unit, names, self.proposer.as_ref(), &self.options)
            .await?;

        Ok(ChapterGlossary {
            chapter_number: chapter.chapter_number,
            outcome,
        })
    }

    /// Process every chapter, returning results ordered by chapter number.
    ///
    /// `progress` is called with (completed, total) as chapters finish. All
    /// chapters are attempted; the first failure in chapter order is
    /// returned after the rest complete.
    pub async fn process_all<F>(&self, chapters: &[Chapter], progress: F) -> Result<Vec<ChapterGlossary>, GlossaryError>
    where
        F: Fn(usize, usize),
    {
        let total = chapters.len();
        let completed = AtomicUsize::new(0);
        let started = Instant::now();

        let mut results = stream::iter(chapters)
            .map(|chapter| {
                let completed = &completed;
                let progress = &progress;
                async move {
                    let result = self.process(chapter).await;
                    if let Err(e) = &result {
                        error!("Chapter {} failed: {}", chapter.chapter_number, e);
                    }
                    progress(completed.fetch_add(1, Ordering::SeqCst) + 1, total);
                    (chapter.chapter_number, result)
                }
            })
            .buffer_unordered(self.max_concurrent_chapters)
            .collect::<Vec<_>>()
            .await;

        results.sort_by_key(|(number, _)| *number);

        let mut glossaries = Vec::with_capacity(results.len());
        for (_, result) in results {
            glossaries.push(result?);
        }

        let failed_terms: usize = glossaries.iter().map(|g| g.outcome.failures().count()).sum();
        info!(
            "Processed {} chapters in {:?} ({} unresolved names)",
            total,
            started.elapsed(),
            failed_terms
        );
        Ok(glossaries)
    }
}

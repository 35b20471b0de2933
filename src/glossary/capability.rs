/*!
 * Capability seams between the glossary and its collaborators.
 *
 * The store never translates or segments text itself. Callers hand it a
 * `NameProposer` (backed by an LLM, a fixture, or a closure) and feed it the
 * output of a `NameExtractor`.
 */

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::future::Future;

use crate::errors::ProviderError;

/// Proposes a target-language translation for one source term
#[async_trait]
pub trait NameProposer: Send + Sync {
    async fn propose(&self, source_term: &str) -> Result<String, ProviderError>;
}

/// Surfaces candidate proper nouns from a chapter's source text
pub trait NameExtractor: Send + Sync {
    fn extract(&self, unit_text: &str) -> BTreeSet<String>;
}

/// Adapts a synchronous closure into a `NameProposer`
pub struct FnProposer<F> {
    propose: F,
}

impl<F> FnProposer<F>
where
    F: Fn(&str) -> Result<String, ProviderError> + Send + Sync,
{
    pub fn new(propose: F) -> Self {
        Self { propose }
    }
}

#[async_trait]
impl<F> NameProposer for FnProposer<F>
where
    F: Fn(&str) -> Result<String, ProviderError> + Send + Sync,
{
    async fn propose(&self, source_term: &str) -> Result<String, ProviderError> {
        (self.propose)(source_term)
    }
}

/// Adapts an async closure into a `NameProposer`
pub struct AsyncFnProposer<F> {
    propose: F,
}

impl<F, Fut> AsyncFnProposer<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, ProviderError>> + Send + 'static,
{
    pub fn new(propose: F) -> Self {
        Self { propose }
    }
}

#[async_trait]
impl<F, Fut> NameProposer for AsyncFnProposer<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, ProviderError>> + Send + 'static,
{
    async fn propose(&self, source_term: &str) -> Result<String, ProviderError> {
        (self.propose)(source_term.to_string()).await
    }
}

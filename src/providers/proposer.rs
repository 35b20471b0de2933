/*!
 * LLM-backed name proposals.
 */

use async_trait::async_trait;
use log::debug;

use crate::errors::ProviderError;
use crate::glossary::NameProposer;
use crate::prompts::{NamePromptTemplate, clean_proposal};
use crate::providers::Provider;

/// Proposes translated names by prompting an LLM provider
#[derive(Debug)]
pub struct LlmNameProposer<P: Provider> {
    provider: P,
    template: NamePromptTemplate,
    source_language: String,
    target_language: String,
}

impl<P: Provider> LlmNameProposer<P> {
    /// Create a proposer; languages are display names ("Chinese", "Vietnamese")
    pub fn new(provider: P, source_language: &str, target_language: &str) -> Self {
        Self {
            provider,
            template: NamePromptTemplate::default(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
        }
    }

    /// Use a different prompt template
    pub fn with_template(mut self, template: NamePromptTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

#[async_trait]
impl<P: Provider> NameProposer for LlmNameProposer<P> {
    async fn propose(&self, source_term: &str) -> Result<String, ProviderError> {
        let system = NamePromptTemplate::render_system(&self.source_language, &self.target_language);
        let prompt = self
            .template
            .render(&self.source_language, &self.target_language, source_term);

        let request = self.provider.build_request(&system, &prompt);
        let response = self.provider.complete(request).await?;
        let raw = P::extract_text(&response);

        let proposed = clean_proposal(&raw);
        debug!("Proposed '{}' for '{}' (raw reply: {:?})", proposed, source_term, raw);
        Ok(proposed)
    }
}

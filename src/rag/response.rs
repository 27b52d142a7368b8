//! RAG response generation.

use super::context::format_context_for_prompt;
use super::AnswerGenerator;
use crate::chunking::Passage;
use crate::config::{Prompts, Settings};
use crate::error::{with_timeout, LeseError, Result};
use crate::retriever::{Retriever, DEFAULT_TOP_K};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Default cap on generated answer length.
pub const DEFAULT_MAX_TOKENS: u32 = 300;

/// RAG engine for question answering.
pub struct RagEngine {
    retriever: Arc<Retriever>,
    generator: Arc<dyn AnswerGenerator>,
    prompts: Prompts,
    top_k: usize,
    max_tokens: u32,
    generation_timeout: Duration,
}

impl RagEngine {
    /// Create a new RAG engine.
    pub fn new(retriever: Arc<Retriever>, generator: Arc<dyn AnswerGenerator>) -> Self {
        Self {
            retriever,
            generator,
            prompts: Prompts::default(),
            top_k: DEFAULT_TOP_K,
            max_tokens: DEFAULT_MAX_TOKENS,
            generation_timeout: Duration::from_secs(120),
        }
    }

    /// Create an engine configured from settings.
    pub fn from_settings(
        retriever: Arc<Retriever>,
        generator: Arc<dyn AnswerGenerator>,
        settings: &Settings,
        prompts: Prompts,
    ) -> Self {
        Self::new(retriever, generator)
            .with_prompts(prompts)
            .with_top_k(settings.retrieval.top_k)
            .with_max_tokens(settings.generation.max_tokens)
            .with_generation_timeout(settings.generation.timeout())
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Set the number of passages used as context.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the maximum answer length in tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the upper bound for each generation call.
    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = timeout;
        self
    }

    /// Get a reference to the retriever.
    pub fn retriever(&self) -> Arc<Retriever> {
        self.retriever.clone()
    }

    /// Render the user prompt for a question and its context passages.
    pub fn build_prompt(&self, question: &str, passages: &[Passage]) -> String {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("context".to_string(), format_context_for_prompt(passages));

        self.prompts.render_with_custom(&self.prompts.rag.user, &vars)
    }

    /// Ask a question and get the answer with the passages it was grounded on.
    #[instrument(skip(self), fields(question = %question))]
    pub async fn ask(&self, question: &str) -> Result<RagResponse> {
        let question = question.trim();
        if question.is_empty() {
            return Err(LeseError::InvalidInput("No question provided".to_string()));
        }

        info!("Processing question: {}", question);

        let passages = self.retriever.retrieve(question, self.top_k).await?;
        let user_prompt = self.build_prompt(question, &passages);

        let answer = with_timeout(
            "generation",
            self.generation_timeout,
            self.generator
                .generate(&self.prompts.rag.system, &user_prompt, self.max_tokens),
        )
        .await
        .map_err(|e| match e {
            LeseError::Generation(_) | LeseError::Timeout { .. } => e,
            other => LeseError::Generation(other.to_string()),
        })?;

        debug!("Generated response with {} sources", passages.len());

        Ok(RagResponse {
            answer: answer.trim().to_string(),
            sources: passages,
        })
    }

    /// Ask a question and return only the answer text.
    pub async fn answer(&self, question: &str) -> Result<String> {
        Ok(self.ask(question).await?.answer)
    }
}

/// A RAG response with answer and sources.
#[derive(Debug, Clone, Serialize)]
pub struct RagResponse {
    /// The generated answer.
    pub answer: String,
    /// Passages the answer was grounded on, in ranked order.
    pub sources: Vec<Passage>,
}

impl RagResponse {
    /// Format the response for display.
    pub fn format_for_display(&self) -> String {
        let mut output = self.answer.clone();

        if !self.sources.is_empty() {
            output.push_str("\n\n--- Sources ---\n");
            for source in &self.sources {
                output.push_str(&format!("\n{}", source.citation()));
            }
        }

        output
    }
}

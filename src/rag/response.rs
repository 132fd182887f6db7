//! Answer and summary generation over retrieved hits.

use super::context::{format_answer_with_sources, format_snippets};
use crate::config::Prompts;
use crate::llm::LanguageModel;
use crate::retrieval::Hit;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Turns hits into answers and call summaries.
///
/// Without a language model every reply is built from the hits alone. Model failures never
/// surface as errors; they are folded into the reply text.
pub struct Copilot {
    model: Option<Arc<dyn LanguageModel>>,
    prompts: Prompts,
}

impl Copilot {
    pub fn new(model: Option<Arc<dyn LanguageModel>>) -> Self {
        Self {
            model,
            prompts: Prompts::default(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.model.is_some()
    }

    /// Answer `question` from `hits`, followed by a sources block.
    #[instrument(skip(self, hits), fields(question = %question, hits = hits.len()))]
    pub async fn answer(&self, question: &str, hits: &[Hit]) -> String {
        let Some(model) = &self.model else {
            return format_answer_with_sources(
                "(GROQ not configured) Showing top snippets-derived context below.",
                hits,
            );
        };

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("snippets".to_string(), format_snippets(hits));
        let user = self.prompts.render_with_custom(&self.prompts.qa.user, &vars);
        let system = self.prompts.render_with_custom(&self.prompts.qa.system, &vars);

        let answer = match model.complete(&system, &user).await {
            Ok(answer) => {
                info!("Answered with {}", model.model());
                answer
            }
            Err(e) => {
                warn!("Language model failed: {}", e);
                format!("(LLM error: {}) Using retrieved snippets only.", e.kind())
            }
        };

        format_answer_with_sources(&answer, hits)
    }

    /// Summarize one call from `hits`, followed by a sources block.
    #[instrument(skip(self, hits), fields(call_id = %call_id, hits = hits.len()))]
    pub async fn summarize(&self, call_id: &str, hits: &[Hit]) -> String {
        let snippets = format_snippets(hits);

        let Some(model) = &self.model else {
            return format_answer_with_sources(
                &format!("(GROQ not configured) Top snippets for {}:\n\n{}\n", call_id, snippets),
                hits,
            );
        };

        let mut vars = HashMap::new();
        vars.insert("call_id".to_string(), call_id.to_string());
        vars.insert("snippets".to_string(), snippets.clone());
        let user = self.prompts.render_with_custom(&self.prompts.summary.user, &vars);
        let system = self.prompts.render_with_custom(&self.prompts.summary.system, &vars);

        let summary = match model.complete(&system, &user).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!("Language model failed: {}", e);
                format!(
                    "(LLM error: {}) Showing retrieved snippets only.\n\n{}",
                    e.kind(),
                    snippets
                )
            }
        };

        format_answer_with_sources(&summary, hits)
    }
}

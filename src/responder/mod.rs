//! One reply per message: history and knowledge into a prompt, the prompt
//! through the model, and a canned fallback when the model gives nothing.

mod extract;

pub use extract::fallback_index;

use crate::knowledge::KnowledgeAugmenter;
use crate::persona::Persona;
use crate::prompt::{build_prompt, build_short_prompt};
use crate::providers::{FinishReason, GenerationParams, ModelClient, ModelResponse};
use crate::storage::ConversationStore;
use crate::utils::truncate_chars;
use extract::extract_reply;
use std::sync::Arc;
use strum::Display;

const TEMPERATURE: f64 = 0.7;
const TOP_P: f64 = 0.9;
const TOP_K: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum PromptVariant {
    /// Persona, history, knowledge, message and the full instruction.
    Full,
    /// Persona and message only.
    Short,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    pub max_output_tokens: u32,
    pub variant: PromptVariant,
}

impl Attempt {
    pub fn params(&self) -> GenerationParams {
        GenerationParams {
            max_output_tokens: self.max_output_tokens,
            temperature: TEMPERATURE,
            top_p: TOP_P,
            top_k: TOP_K,
        }
    }
}

/// The first attempt always runs; the second only when the first was cut
/// off at its token limit.
pub const ATTEMPTS: [Attempt; 2] = [
    Attempt {
        max_output_tokens: 150,
        variant: PromptVariant::Full,
    },
    Attempt {
        max_output_tokens: 100,
        variant: PromptVariant::Short,
    },
];

pub struct Responder {
    model: Arc<dyn ModelClient>,
    store: Arc<ConversationStore>,
    knowledge: Option<KnowledgeAugmenter>,
    persona: Arc<Persona>,
    history_turns: usize,
}

impl Responder {
    pub fn new(
        model: Arc<dyn ModelClient>,
        store: Arc<ConversationStore>,
        knowledge: Option<KnowledgeAugmenter>,
        persona: Arc<Persona>,
        history_turns: usize,
    ) -> Self {
        Self {
            model,
            store,
            knowledge,
            persona,
            history_turns,
        }
    }

    /// Reply text for `message`. Never fails: a fallback line stands in for
    /// anything the model could not provide.
    pub async fn generate(&self, message: &str, user_id: i64) -> String {
        match self.try_generate(message, user_id).await {
            Ok(reply) => {
                tracing::info!(
                    "Successfully generated Gemini response: {}...",
                    truncate_chars(&reply, 100)
                );
                reply
            }
            Err(e) => {
                tracing::error!("Error generating Gemini response: {e:#}");
                self.fallback(message, user_id)
            }
        }
    }

    fn fallback(&self, message: &str, user_id: i64) -> String {
        let pool = &self.persona.fallback_replies;
        if pool.is_empty() {
            return self.persona.apology.clone();
        }
        pool[fallback_index(message, user_id, pool.len())].clone()
    }

    async fn try_generate(&self, message: &str, user_id: i64) -> anyhow::Result<String> {
        let history = self
            .store
            .get_formatted_context(user_id, self.history_turns)
            .await;

        let knowledge = match &self.knowledge {
            Some(augmenter) => augmenter.augment(message).await,
            None => String::new(),
        };

        let mut response = self
            .run_attempt(&ATTEMPTS[0], message, &history, &knowledge)
            .await?;

        if response.first_finish_reason() == Some(&FinishReason::MaxTokens) {
            tracing::warn!("Gemini response was truncated due to MAX_TOKENS limit");
            response = self
                .run_attempt(&ATTEMPTS[1], message, &history, &knowledge)
                .await?;
        }

        let (via, reply) = extract_reply(&response).ok_or_else(|| {
            anyhow::anyhow!("Gemini returned empty response after retries")
        })?;
        tracing::debug!("Got response via {via}: {}...", truncate_chars(&reply, 50));
        Ok(reply)
    }

    fn prompt_for(
        &self,
        variant: PromptVariant,
        message: &str,
        history: &str,
        knowledge: &str,
    ) -> String {
        match variant {
            PromptVariant::Full => build_prompt(&self.persona.script, history, knowledge, message),
            PromptVariant::Short => build_short_prompt(&self.persona.script, message),
        }
    }

    async fn run_attempt(
        &self,
        attempt: &Attempt,
        message: &str,
        history: &str,
        knowledge: &str,
    ) -> anyhow::Result<ModelResponse> {
        let prompt = self.prompt_for(attempt.variant, message, history, knowledge);
        tracing::debug!(
            "Calling {} ({} prompt, max {} tokens)",
            self.model.name(),
            attempt.variant,
            attempt.max_output_tokens
        );
        Ok(self.model.generate(&prompt, &attempt.params()).await?)
    }
}

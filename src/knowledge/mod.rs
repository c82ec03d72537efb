//! Encyclopedia lookups spliced into prompts for factual questions.

mod wikipedia;

pub use wikipedia::WikipediaClient;

use crate::error::KnowledgeError;
use crate::utils::truncate_chars;
use async_trait::async_trait;
use std::sync::Arc;

/// Lowercased substrings that mark a message as a factual question.
pub const TRIGGER_TERMS: [&str; 8] = [
    "എന്താണ്",
    "what",
    "കേരളം",
    "kerala",
    "ഇന്ത്യ",
    "india",
    "ചരിത്രം",
    "history",
];

const PRIMARY_SUMMARY_CHARS: usize = 500;
const SECONDARY_SUMMARY_CHARS: usize = 300;
const RELATED_TITLES: usize = 3;

const PRIMARY_PREFIX: &str = "വിക്കിപീഡിയയിൽ നിന്ന്";
const SECONDARY_PREFIX: &str = "അറിവ്";
const SECONDARY_SUFFIX: &str = "(ഇംഗ്ലീഷിൽ നിന്ന് വിവർത്തനം)";
const RELATED_PREFIX: &str = "ബന്ധപ്പെട്ട വിഷയങ്ങൾ";
const KNOWLEDGE_HEADER: &str = "അധിക അറിവ്:";

/// A remote encyclopedia.
#[async_trait]
pub trait KnowledgeSource: Send + Sync {
    /// Summary of the page titled exactly `title`; `None` if no such page.
    async fn summary(&self, title: &str) -> Result<Option<String>, KnowledgeError>;

    /// Titles of up to `limit` pages matching `query`.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, KnowledgeError>;
}

pub fn needs_lookup(text: &str) -> bool {
    let lowered = text.to_lowercase();
    TRIGGER_TERMS.iter().any(|term| lowered.contains(term))
}

pub struct KnowledgeAugmenter {
    primary: Arc<dyn KnowledgeSource>,
    secondary: Arc<dyn KnowledgeSource>,
}

impl KnowledgeAugmenter {
    pub fn new(primary: Arc<dyn KnowledgeSource>, secondary: Arc<dyn KnowledgeSource>) -> Self {
        Self { primary, secondary }
    }

    /// Best available snippet for `text`, or empty.
    ///
    /// Tries an exact primary-language page, then an exact secondary-language
    /// page, then related secondary titles. Any remote error ends the lookup.
    pub async fn lookup(&self, text: &str) -> String {
        match self.try_lookup(text).await {
            Ok(snippet) => snippet,
            Err(e) => {
                tracing::error!("Wikipedia search error: {e}");
                String::new()
            }
        }
    }

    async fn try_lookup(&self, text: &str) -> Result<String, KnowledgeError> {
        if let Some(summary) = self.primary.summary(text).await? {
            return Ok(format!(
                "{PRIMARY_PREFIX}: {}...",
                truncate_chars(&summary, PRIMARY_SUMMARY_CHARS)
            ));
        }

        if let Some(summary) = self.secondary.summary(text).await? {
            return Ok(format!(
                "{SECONDARY_PREFIX}: {}... {SECONDARY_SUFFIX}",
                truncate_chars(&summary, SECONDARY_SUMMARY_CHARS)
            ));
        }

        let titles = self.secondary.search(text, RELATED_TITLES).await?;
        if titles.is_empty() {
            return Ok(String::new());
        }
        let shown: Vec<&str> = titles
            .iter()
            .take(RELATED_TITLES)
            .map(String::as_str)
            .collect();
        Ok(format!("{RELATED_PREFIX}: {}", shown.join(", ")))
    }

    /// Knowledge block for the prompt; empty unless `text` asks something
    /// factual and a snippet was found.
    pub async fn augment(&self, text: &str) -> String {
        if !needs_lookup(text) {
            return String::new();
        }

        let snippet = self.lookup(text).await;
        if snippet.is_empty() {
            return String::new();
        }
        tracing::debug!("Knowledge snippet added ({} chars)", snippet.chars().count());
        format!("\n\n{KNOWLEDGE_HEADER}\n{snippet}")
    }
}

use crate::error::LlmError;
use async_trait::async_trait;
use strum::{Display, EnumString};

/// Sampling settings for one model call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_output_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
}

/// Why the model stopped producing a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FinishReason {
    Stop,
    MaxTokens,
    Safety,
    Recitation,
    #[strum(default)]
    Other(String),
}

/// One candidate: its text parts in order and the reason it ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateReply {
    pub parts: Vec<String>,
    pub finish_reason: Option<FinishReason>,
}

/// Provider-neutral view of a generation result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelResponse {
    pub candidates: Vec<CandidateReply>,
}

impl ModelResponse {
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            candidates: vec![CandidateReply {
                parts: vec![text.into()],
                finish_reason: Some(FinishReason::Stop),
            }],
        }
    }

    /// Concatenated text of the first candidate.
    pub fn text(&self) -> Option<String> {
        let first = self.candidates.first()?;
        if first.parts.is_empty() {
            return None;
        }
        Some(first.parts.concat())
    }

    pub fn first_finish_reason(&self) -> Option<&FinishReason> {
        self.candidates.first()?.finish_reason.as_ref()
    }
}

#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &str;

    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<ModelResponse, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn finish_reason_parses_wire_names() {
        assert_eq!(FinishReason::from_str("MAX_TOKENS").unwrap(), FinishReason::MaxTokens);
        assert_eq!(FinishReason::from_str("STOP").unwrap(), FinishReason::Stop);
        assert_eq!(
            FinishReason::from_str("BLOCKLIST").unwrap(),
            FinishReason::Other("BLOCKLIST".into())
        );
    }

    #[test]
    fn text_concatenates_first_candidate_parts() {
        let response = ModelResponse {
            candidates: vec![
                CandidateReply {
                    parts: vec!["ഹലോ ".into(), "ബ്രോ".into()],
                    finish_reason: None,
                },
                CandidateReply {
                    parts: vec!["ignored".into()],
                    finish_reason: None,
                },
            ],
        };
        assert_eq!(response.text().as_deref(), Some("ഹലോ ബ്രോ"));
    }

    #[test]
    fn empty_response_has_no_text() {
        assert!(ModelResponse::default().text().is_none());
        assert!(ModelResponse::default().first_finish_reason().is_none());
    }
}

//! Google Gemini `generateContent` client.

use super::gemini_types::{
    Candidate, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
};
use super::scrub::{api_error, sanitize_api_error};
use super::traits::{CandidateReply, FinishReason, GenerationParams, ModelClient, ModelResponse};
use crate::error::LlmError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::str::FromStr;

const PROVIDER: &str = "gemini";

pub struct GeminiClient {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

impl GeminiClient {
    pub fn new(api_key: &str, model: &str, base_url: &str, client: Client) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    fn model_name(model: &str) -> String {
        if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{model}")
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/{}:generateContent",
            self.base_url,
            Self::model_name(&self.model)
        )
    }

    fn build_request(prompt: &str, params: &GenerationParams) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: params.temperature,
                top_p: params.top_p,
                top_k: params.top_k,
                max_output_tokens: params.max_output_tokens,
            },
        }
    }

    fn map_candidate(candidate: Candidate) -> CandidateReply {
        let parts = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        CandidateReply {
            parts,
            finish_reason: candidate
                .finish_reason
                .as_deref()
                .and_then(|reason| FinishReason::from_str(reason).ok()),
        }
    }

    fn request_error(message: impl Into<String>) -> LlmError {
        LlmError::Request {
            provider: PROVIDER.to_string(),
            message: message.into(),
        }
    }

    async fn call_api_with_request(
        &self,
        request: &GenerateContentRequest,
    ) -> anyhow::Result<GenerateContentResponse> {
        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(request)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Err(LlmError::Auth {
                provider: PROVIDER.to_string(),
            }
            .into());
        }
        if !response.status().is_success() {
            return Err(api_error("Gemini", response).await);
        }

        let result: GenerateContentResponse = response
            .json()
            .await
            .map_err(reqwest::Error::without_url)?;

        if let Some(err) = result.error.as_ref() {
            anyhow::bail!("Gemini API error: {}", sanitize_api_error(&err.message));
        }

        Ok(result)
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<ModelResponse, LlmError> {
        let request = Self::build_request(prompt, params);
        let result = self
            .call_api_with_request(&request)
            .await
            .map_err(|e| match e.downcast::<LlmError>() {
                Ok(llm) => llm,
                Err(other) => Self::request_error(format!("{other:#}")),
            })?;

        if let Some(reason) = result
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.as_deref())
        {
            tracing::warn!("Gemini blocked the prompt: {reason}");
        }

        let candidates: Vec<CandidateReply> = result
            .candidates
            .unwrap_or_default()
            .into_iter()
            .map(Self::map_candidate)
            .collect();

        if candidates.is_empty() {
            return Err(LlmError::EmptyResponse {
                provider: PROVIDER.to_string(),
            });
        }

        Ok(ModelResponse { candidates })
    }
}

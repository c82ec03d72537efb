use super::{LONG_POLL_SECS, MAX_CAPTION_UTF16, TelegramChannel, parse_update};
use crate::channels::traits::{Channel, ChatAction, InboundMessage};
use crate::error::TransportError;
use crate::providers::sanitize_api_error;
use anyhow::Context;
use async_trait::async_trait;
use std::path::Path;

impl TelegramChannel {
    async fn post_json(&self, method: &str, body: &serde_json::Value) -> anyhow::Result<()> {
        let resp = self
            .client
            .post(self.api_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::Send {
                channel: "telegram".into(),
                message: format!("{method}: {}", e.without_url()),
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let err = resp
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read response body: {e}>"));
            return Err(TransportError::Send {
                channel: "telegram".into(),
                message: format!("{method} failed ({status}): {}", sanitize_api_error(&err)),
            }
            .into());
        }

        Ok(())
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn max_caption_length(&self) -> usize {
        MAX_CAPTION_UTF16
    }

    async fn reply_text(
        &self,
        chat_id: i64,
        reply_to: Option<i64>,
        text: &str,
    ) -> anyhow::Result<()> {
        let mut body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });
        if let Some(message_id) = reply_to {
            body["reply_to_message_id"] = message_id.into();
        }
        self.post_json("sendMessage", &body).await
    }

    async fn reply_voice(
        &self,
        chat_id: i64,
        reply_to: Option<i64>,
        audio: &Path,
        caption: &str,
    ) -> anyhow::Result<()> {
        let bytes = tokio::fs::read(audio)
            .await
            .with_context(|| format!("read voice file {}", audio.display()))?;
        let filename = audio
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("voice.mp3")
            .to_string();

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename)
            .mime_str("audio/mpeg")?;
        let mut form = reqwest::multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .part("voice", part);
        if let Some(message_id) = reply_to {
            form = form.text("reply_to_message_id", message_id.to_string());
        }

        let resp = self
            .client
            .post(self.api_url("sendVoice"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| TransportError::Send {
                channel: "telegram".into(),
                message: format!("sendVoice: {}", e.without_url()),
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let err = resp
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read response body: {e}>"));
            return Err(TransportError::Send {
                channel: "telegram".into(),
                message: format!("sendVoice failed ({status}): {}", sanitize_api_error(&err)),
            }
            .into());
        }

        Ok(())
    }

    async fn send_chat_action(&self, chat_id: i64, action: ChatAction) -> anyhow::Result<()> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "action": action.to_string(),
        });
        self.post_json("sendChatAction", &body).await
    }

    async fn listen(&self, tx: tokio::sync::mpsc::Sender<InboundMessage>) -> anyhow::Result<()> {
        let mut offset: i64 = 0;

        tracing::info!("Telegram channel listening for messages...");

        loop {
            let url = self.api_url("getUpdates");
            let body = serde_json::json!({
                "offset": offset,
                "timeout": LONG_POLL_SECS,
                "allowed_updates": ["message"]
            });

            let resp = match self.client.post(&url).json(&body).send().await {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!("Telegram poll error: {}", e.without_url());
                    tokio::time::sleep(self.retry_delay).await;
                    continue;
                }
            };

            let data: serde_json::Value = match resp.json().await {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!("Telegram parse error: {}", e.without_url());
                    tokio::time::sleep(self.retry_delay).await;
                    continue;
                }
            };

            let Some(results) = data.get("result").and_then(serde_json::Value::as_array) else {
                tracing::warn!(
                    "Telegram getUpdates returned no result: {}",
                    sanitize_api_error(&data.to_string())
                );
                tokio::time::sleep(self.retry_delay).await;
                continue;
            };

            for update in results {
                // Advance offset past this update
                if let Some(uid) = update.get("update_id").and_then(serde_json::Value::as_i64) {
                    offset = uid + 1;
                }

                let Some(msg) = parse_update(update) else {
                    continue;
                };

                if tx.send(msg).await.is_err() {
                    return Ok(());
                }
            }
        }
    }

    async fn health_check(&self) -> bool {
        self.client
            .get(self.api_url("getMe"))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}

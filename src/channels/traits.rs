use async_trait::async_trait;
use std::path::Path;
use strum::{Display, EnumString};

/// Who sent an inbound message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sender {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl Sender {
    /// First name for logs and the dashboard.
    pub fn display_name(&self) -> &str {
        self.first_name.as_deref().unwrap_or("Unknown")
    }
}

/// A text message received from a chat platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub message_id: i64,
    pub chat_id: i64,
    pub sender: Sender,
    pub text: String,
}

/// Status shown to the user while a reply is prepared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ChatAction {
    Typing,
    UploadVoice,
}

/// Core channel trait: receive text, reply with text or voice.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name
    fn name(&self) -> &str;

    /// Send `text` into `chat_id`, threaded under `reply_to` when given.
    async fn reply_text(&self, chat_id: i64, reply_to: Option<i64>, text: &str)
    -> anyhow::Result<()>;

    /// Upload the audio file at `audio` as a voice message with `caption`.
    async fn reply_voice(
        &self,
        chat_id: i64,
        reply_to: Option<i64>,
        audio: &Path,
        caption: &str,
    ) -> anyhow::Result<()>;

    async fn send_chat_action(&self, _chat_id: i64, _action: ChatAction) -> anyhow::Result<()> {
        Ok(())
    }

    /// Start listening for incoming messages (long-running)
    async fn listen(&self, tx: tokio::sync::mpsc::Sender<InboundMessage>) -> anyhow::Result<()>;

    /// Check if channel is healthy
    async fn health_check(&self) -> bool {
        true
    }

    /// Longest caption a voice message may carry, in UTF-16 code units.
    fn max_caption_length(&self) -> usize {
        usize::MAX
    }
}

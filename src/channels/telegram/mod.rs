mod handler;

use super::traits::{InboundMessage, Sender};
use serde_json::Value;
use std::time::Duration;

/// Telegram caps voice captions at this many UTF-16 code units.
pub const MAX_CAPTION_UTF16: usize = 1024;
/// Seconds the server holds a `getUpdates` request open.
pub const LONG_POLL_SECS: u64 = 30;

/// Telegram Bot API channel using long polling.
pub struct TelegramChannel {
    bot_token: String,
    base_url: String,
    client: reqwest::Client,
    retry_delay: Duration,
}

impl TelegramChannel {
    /// `client` must allow requests longer than [`LONG_POLL_SECS`].
    pub fn new(bot_token: String, base_url: &str, client: reqwest::Client) -> Self {
        Self {
            bot_token,
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            retry_delay: Duration::from_secs(5),
        }
    }

    /// Pause after a failed poll.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.base_url, self.bot_token)
    }
}

fn opt_string(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Extract a text message from one `getUpdates` entry.
///
/// Updates without a message, a text body or a sender are skipped.
pub(crate) fn parse_update(update: &Value) -> Option<InboundMessage> {
    let message = update.get("message")?;
    let text = message.get("text").and_then(Value::as_str)?;
    let from = message.get("from")?;

    let sender = Sender {
        id: from.get("id").and_then(Value::as_i64)?,
        username: opt_string(from, "username"),
        first_name: opt_string(from, "first_name"),
        last_name: opt_string(from, "last_name"),
    };

    Some(InboundMessage {
        message_id: message.get("message_id").and_then(Value::as_i64)?,
        chat_id: message
            .get("chat")
            .and_then(|c| c.get("id"))
            .and_then(Value::as_i64)?,
        sender,
        text: text.to_string(),
    })
}

use super::SpeechBackend;
use crate::error::SpeechError;
use async_trait::async_trait;
use reqwest::Client;

/// Longest text the translate endpoint accepts per request.
const MAX_CHUNK_CHARS: usize = 100;
const SLOW_SPEED: &str = "0.24";
const NORMAL_SPEED: &str = "1";

/// Google Translate's public speech endpoint.
///
/// Long text is split into chunks, each fetched separately; the MP3 frames
/// are concatenated into one playable stream.
pub struct GoogleTranslateTts {
    base_url: String,
    language: String,
    slow: bool,
    client: Client,
}

impl GoogleTranslateTts {
    pub fn new(base_url: &str, language: &str, slow: bool, client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            language: language.to_string(),
            slow,
            client,
        }
    }

    async fn fetch_chunk(
        &self,
        chunk: &str,
        index: usize,
        total: usize,
    ) -> Result<Vec<u8>, SpeechError> {
        let total = total.to_string();
        let index = index.to_string();
        let textlen = chunk.chars().count().to_string();
        let speed = if self.slow { SLOW_SPEED } else { NORMAL_SPEED };

        let response = self
            .client
            .get(format!("{}/translate_tts", self.base_url))
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", self.language.as_str()),
                ("q", chunk),
                ("ttsspeed", speed),
                ("total", total.as_str()),
                ("idx", index.as_str()),
                ("textlen", textlen.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SpeechError::Request(e.without_url().to_string()))?;

        if !response.status().is_success() {
            return Err(SpeechError::Request(format!(
                "chunk {index}: HTTP {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SpeechError::Request(e.without_url().to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Split `text` into chunks of at most `max_chars` characters, breaking on
/// whitespace. A single word longer than the limit is split mid-word.
pub(crate) fn split_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let needed = if current.is_empty() {
            word_len
        } else {
            current_len + 1 + word_len
        };
        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[async_trait]
impl SpeechBackend for GoogleTranslateTts {
    fn name(&self) -> &str {
        "google-translate-tts"
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
        let chunks = split_chunks(text, MAX_CHUNK_CHARS);
        let mut audio = Vec::new();
        for (index, chunk) in chunks.iter().enumerate() {
            audio.extend(self.fetch_chunk(chunk, index, chunks.len()).await?);
        }
        Ok(audio)
    }
}

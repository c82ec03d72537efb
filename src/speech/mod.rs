//! Reply text to a voice clip on disk.

mod google_tts;

pub use google_tts::GoogleTranslateTts;

use crate::error::SpeechError;
use async_trait::async_trait;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempPath;

/// Turns text into encoded audio bytes.
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError>;
}

/// Characters a speech engine would read out as noise.
///
/// Everything from enclosed alphanumerics (U+24C2) upward goes: box drawing,
/// dingbats, emoji, flags, presentation selectors and the supplementary
/// planes. Below that only the zero-width joiner and a few watch and media
/// pictographs are dropped, so Malayalam and Latin text survive.
fn is_speech_noise(c: char) -> bool {
    matches!(
        c,
        '\u{200D}' | '\u{231A}' | '\u{23CF}' | '\u{23E9}' | '\u{24C2}'..='\u{10FFFF}'
    )
}

/// Strip symbols and collapse whitespace.
pub fn clean_for_speech(text: &str) -> String {
    let stripped: String = text.chars().filter(|c| !is_speech_noise(*c)).collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A synthesized clip in a temporary `.mp3` file.
///
/// The file is removed when the artifact is dropped.
#[derive(Debug)]
pub struct AudioArtifact {
    path: TempPath,
}

impl AudioArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file now instead of on drop.
    pub fn cleanup(self) {
        let shown = self.path.display().to_string();
        match self.path.close() {
            Ok(()) => tracing::info!("Cleaned up temp file: {shown}"),
            Err(e) => tracing::error!("Error cleaning up temp file {shown}: {e}"),
        }
    }
}

fn write_artifact(bytes: &[u8]) -> Result<AudioArtifact, SpeechError> {
    let mut file = tempfile::Builder::new()
        .prefix("maveli-")
        .suffix(".mp3")
        .tempfile()?;
    file.write_all(bytes)?;
    file.flush()?;
    Ok(AudioArtifact {
        path: file.into_temp_path(),
    })
}

pub struct SpeechSynthesizer {
    backend: Arc<dyn SpeechBackend>,
}

impl SpeechSynthesizer {
    pub fn new(backend: Arc<dyn SpeechBackend>) -> Self {
        Self { backend }
    }

    /// Voice clip for `text`, or `None` when there is nothing speakable or
    /// synthesis failed.
    pub async fn synthesize(&self, text: &str) -> Option<AudioArtifact> {
        let clean = clean_for_speech(text);
        if clean.is_empty() {
            tracing::warn!("Text became empty after emoji removal");
            return None;
        }

        match self.try_synthesize(&clean).await {
            Ok(artifact) => {
                tracing::info!("Generated audio file: {}", artifact.path().display());
                Some(artifact)
            }
            Err(e) => {
                tracing::error!("Error generating TTS via {}: {e}", self.backend.name());
                None
            }
        }
    }

    async fn try_synthesize(&self, clean: &str) -> Result<AudioArtifact, SpeechError> {
        let bytes = self.backend.synthesize(clean).await?;
        if bytes.is_empty() {
            return Err(SpeechError::EmptyAudio);
        }
        write_artifact(&bytes)
    }
}

use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `maveli`.
///
/// The conversation pipeline degrades instead of failing, so these surface only
/// at startup and at adapter boundaries. Adapters keep `anyhow::Result` for
/// context chains and convert at the edge.
#[derive(Debug, Error)]
pub enum MaveliError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── LLM / Provider ──────────────────────────────────────────────────
    #[error("llm: {0}")]
    Llm(#[from] LlmError),

    // ── Storage ─────────────────────────────────────────────────────────
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    // ── Speech ──────────────────────────────────────────────────────────
    #[error("speech: {0}")]
    Speech(#[from] SpeechError),

    // ── Knowledge ───────────────────────────────────────────────────────
    #[error("knowledge: {0}")]
    Knowledge(#[from] KnowledgeError),

    // ── Transport / Channel ─────────────────────────────────────────────
    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── LLM / Provider errors ──────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("provider {provider} request failed: {message}")]
    Request { provider: String, message: String },

    #[error("provider {provider} returned no usable text")]
    EmptyResponse { provider: String },

    #[error("provider {provider} authentication failed")]
    Auth { provider: String },
}

// ─── Storage errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("open failed: {0}")]
    Open(String),

    #[error("schema migration failed: {0}")]
    Migration(String),
}

// ─── Speech errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("synthesis request failed: {0}")]
    Request(String),

    #[error("backend returned no audio")]
    EmptyAudio,

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Knowledge errors ───────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("{source_name} lookup failed: {message}")]
    Lookup {
        source_name: String,
        message: String,
    },
}

// ─── Transport errors ───────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("channel {channel} send failed: {message}")]
    Send { channel: String, message: String },
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, MaveliError>;

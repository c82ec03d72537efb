pub mod gemini;
mod gemini_types;
pub mod http_client;
pub mod scrub;
pub mod traits;

pub use gemini::GeminiClient;
pub use http_client::build_client;
pub use scrub::{sanitize_api_error, scrub_secret_patterns};
pub use traits::{CandidateReply, FinishReason, GenerationParams, ModelClient, ModelResponse};

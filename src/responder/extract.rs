use crate::providers::{FinishReason, ModelResponse};

pub(super) type Extractor = fn(&ModelResponse) -> Option<String>;

/// Tried in order; the first non-empty trimmed result wins.
pub(super) const EXTRACTORS: [(&str, Extractor); 3] = [
    ("text", direct_text),
    ("first_part", first_part),
    ("truncated", truncated_candidate),
];

/// All text of the first candidate.
fn direct_text(response: &ModelResponse) -> Option<String> {
    response.text()
}

/// Only the first part of the first candidate.
fn first_part(response: &ModelResponse) -> Option<String> {
    response.candidates.first()?.parts.first().cloned()
}

/// Partial text of any candidate cut off by the output limit.
fn truncated_candidate(response: &ModelResponse) -> Option<String> {
    response
        .candidates
        .iter()
        .filter(|c| c.finish_reason == Some(FinishReason::MaxTokens))
        .map(|c| c.parts.concat())
        .find(|text| !text.trim().is_empty())
}

pub(super) fn extract_reply(response: &ModelResponse) -> Option<(&'static str, String)> {
    EXTRACTORS.iter().find_map(|(name, extractor)| {
        let text = extractor(response)?;
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| (*name, trimmed.to_string()))
    })
}

/// 64-bit FNV-1a.
pub(crate) fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash = 0xCBF2_9CE4_8422_2325_u64;
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0100_0000_01B3);
    }
    hash
}

/// Stable fallback choice: FNV-1a of `"{message}{user_id}"` modulo the pool size.
///
/// `pool_len` must be non-zero.
pub fn fallback_index(message: &str, user_id: i64, pool_len: usize) -> usize {
    let hash = fnv1a64(format!("{message}{user_id}").as_bytes());
    // The remainder is below `pool_len`, so it fits back into usize.
    #[allow(clippy::cast_possible_truncation)]
    let index = (hash % pool_len as u64) as usize;
    index
}

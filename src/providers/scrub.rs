use std::borrow::Cow;

const MAX_API_ERROR_CHARS: usize = 200;
const REDACTED: &str = "[REDACTED]";

/// Markers whose following token is a credential.
///
/// `AIza` keeps the prefix-only form Google API keys use; `key=` covers the
/// Gemini query string; `/bot` covers Telegram method URLs.
const SECRET_MARKERS: [&str; 4] = ["AIza", "key=", "/bot", "\"key\":\""];

fn is_secret_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':')
}

fn token_end(input: &str, from: usize) -> usize {
    input[from..]
        .char_indices()
        .find(|(_, c)| !is_secret_char(*c))
        .map_or(input.len(), |(i, _)| from + i)
}

fn scrub_after_marker(scrubbed: &mut String, marker: &str) {
    let mut search_from = 0;
    while let Some(rel) = scrubbed[search_from..].find(marker) {
        let start = search_from + rel;
        let content_start = start + marker.len();
        let end = token_end(scrubbed, content_start);

        // Bare marker with nothing after it.
        if end == content_start {
            search_from = content_start;
            continue;
        }

        scrubbed.replace_range(content_start..end, REDACTED);
        search_from = content_start + REDACTED.len();
    }
}

/// Redact API keys and bot tokens from text headed for logs.
pub fn scrub_secret_patterns(input: &str) -> Cow<'_, str> {
    if !SECRET_MARKERS.iter().any(|marker| input.contains(marker)) {
        return Cow::Borrowed(input);
    }

    let mut scrubbed = input.to_string();
    for marker in SECRET_MARKERS {
        scrub_after_marker(&mut scrubbed, marker);
    }
    Cow::Owned(scrubbed)
}

/// Scrub secrets and cap the length of a remote error body.
pub fn sanitize_api_error(input: &str) -> String {
    let scrubbed = scrub_secret_patterns(input);

    match scrubbed.char_indices().nth(MAX_API_ERROR_CHARS) {
        None => scrubbed.into_owned(),
        Some((end, _)) => format!("{}...", &scrubbed[..end]),
    }
}

/// Build a sanitized error from a failed HTTP response.
pub async fn api_error(service: &str, response: reqwest::Response) -> anyhow::Error {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());
    anyhow::anyhow!("{service} API error ({status}): {}", sanitize_api_error(&body))
}

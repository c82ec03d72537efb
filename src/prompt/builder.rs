/// Label in front of the incoming message in the full prompt.
pub const NEW_MESSAGE_LABEL: &str = "ഉപയോക്താവിന്റെ പുതിയ സന്ദേശം";

/// Closes the full prompt: answer as Maveli, in Malayalam, using any encyclopedia text.
pub const REPLY_INSTRUCTION: &str = "മാവേലി രാജാവായി മലയാളത്തിൽ മാത്രം മറുപടി നൽകുക. \
വിക്കിപീഡിയയിൽ നിന്നുള്ള അറിവ് ഉണ്ടെങ്കിൽ അത് ഉപയോഗിച്ച് വിശദമായ ഉത്തരം നൽകുക:";

/// Closes the short retry prompt.
pub const SHORT_REPLY_INSTRUCTION: &str = "Reply in Malayalam only (2-3 sentences max):";

/// Persona script, history block, knowledge block, new message, instruction.
///
/// Empty blocks are left out entirely rather than rendered as blank sections.
pub fn build_prompt(persona: &str, history: &str, knowledge: &str, new_message: &str) -> String {
    let message_line = format!("{NEW_MESSAGE_LABEL}: {new_message}");

    [
        persona.trim(),
        history.trim(),
        knowledge.trim(),
        message_line.as_str(),
        REPLY_INSTRUCTION,
    ]
    .into_iter()
    .filter(|section| !section.is_empty())
    .collect::<Vec<_>>()
    .join("\n\n")
}

/// Retry prompt after a truncated reply: persona and message only, English labels.
pub fn build_short_prompt(persona: &str, new_message: &str) -> String {
    format!(
        "{}\n\nUser: {new_message}\n\n{SHORT_REPLY_INSTRUCTION}",
        persona.trim()
    )
}

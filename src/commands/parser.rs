use super::types::Command;
use std::str::FromStr;

/// Recognize a known slash command, with or without an `@botname` suffix.
///
/// Unknown commands and plain text return `None` and are treated as
/// ordinary messages.
pub fn parse_command(input: &str) -> Option<Command> {
    let trimmed = input.trim();
    let name = trimmed.strip_prefix('/')?;

    let word = name.split(char::is_whitespace).next()?;
    let bare = word.split_once('@').map_or(word, |(cmd, _bot)| cmd);
    if bare.is_empty() {
        return None;
    }

    Command::from_str(&bare.to_lowercase()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_command() {
        assert_eq!(parse_command("/start"), Some(Command::Start));
    }

    #[test]
    fn help_case_insensitive() {
        assert_eq!(parse_command("/HELP"), Some(Command::Help));
    }

    #[test]
    fn bot_suffix_is_ignored() {
        assert_eq!(parse_command("/start@MaveliBot"), Some(Command::Start));
        assert_eq!(parse_command("/Stats@maveli_bot now"), Some(Command::Stats));
    }

    #[test]
    fn trailing_arguments_are_ignored() {
        assert_eq!(parse_command("  /help please "), Some(Command::Help));
    }

    #[test]
    fn unknown_command_is_none() {
        assert_eq!(parse_command("/weather"), None);
        assert_eq!(parse_command("/"), None);
        assert_eq!(parse_command("/@bot"), None);
    }

    #[test]
    fn plain_text_is_none() {
        assert_eq!(parse_command("start"), None);
        assert_eq!(parse_command("ഹലോ /start"), None);
    }

    #[test]
    fn only_stats_is_admin_only() {
        assert!(Command::Stats.admin_only());
        assert!(!Command::Start.admin_only());
        assert!(!Command::Help.admin_only());
    }
}

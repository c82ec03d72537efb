//! The character the bot speaks as: the prompt script plus every canned
//! string the pipeline sends without asking the model.

use anyhow::Context;
use std::path::Path;

/// Bundled persona script (Maveli, king of Kerala, replies in Malayalam).
pub const MAVELI_SCRIPT: &str = include_str!("maveli.txt");

/// Header of the prior-conversation block spliced into prompts.
pub const HISTORY_HEADER: &str = "ഞങ്ങളുടെ പഴയ സംഭാഷണം:";
/// Speaker label for the user in the history block.
pub const USER_LABEL: &str = "ഉപയോക്താവ്";
/// Speaker label for the persona in the history block.
pub const BOT_LABEL: &str = "മാവേലി";

const WELCOME: &str = "\
🔥 ദാ! മാവേലി കിംഗ് ഇൻ ദ ഹൗസ്! 🔥

ഓണാശംസകൾ എന്റെ പൊളിച്ച മക്കളെ! 🎉

എന്തും ചോദിക്കൂ ബ്രോ - ഞാൻ സൂപ്പർ മലയാളത്തിൽ വോയ്സും ടെക്സ്റ്റും അയച്ചു തരാം! കിടിലൻ ആയിട്ട് ചാറ്റ് ചെയ്യാം 💬

🎭 ഓണത്തിന്റെ വൈബ്സ് പൊളിച്ചടുക്കാം! 🎭";

const APOLOGY: &str = "എന്റെ പ്രിയ കുട്ടിയേ, ക്ഷമിക്കണം. ഇപ്പോൾ എനിക്ക് മറുപടി നൽകാൻ കഴിയുന്നില്ല. കുറച്ച് സമയം കഴിഞ്ഞ് വീണ്ടും ശ്രമിക്കൂ. 🙏";

const ADMIN_ONLY: &str = "ക്ഷമിക്കണം, ഈ കമാൻഡ് അഡ്മിൻ മാത്രമേ ഉപയോഗിക്കാൻ കഴിയൂ.";

const FALLBACK_REPLIES: [&str; 10] = [
    "ഹലോ എന്റെ പ്രിയ പ്രജകളേ! എന്താണ് അറിയാൻ ഉള്ളത്? രാജാവിന്റെ പക്കൽ എല്ലാ അറിവും ഉണ്ട്! 👑🔥",
    "ദാ ബ്രോ! എന്തേലും ചോദിക്കാനുണ്ടോ? പാട്ടോ, കഥയോ, അറിവോ - എല്ലാം തരാം! 🎵😎",
    "മോനേ, മാവേലി രാജാവ് ഇവിടെ! പാട്ട് വേണോ? കഥ വേണോ? എന്തും ചോദിക്കൂ! ⚡👑",
    "പൊളിച്ചു! എന്റെ കിംഗ്ഡത്തിലെ എല്ലാ അറിവും നിനക്ക് തരാം, പാട്ടും പാടാം! 🎭🔥",
    "കിടിലൻ വൈബ്സ്! രാജാവിന്റെ പക്കൽ എല്ലാ ജ്ഞാനവും ഉണ്ട് - ചോദിച്ചോളൂ! 💫👑",
    "മാസ്സ് എൻട്രി! മാവേലി രാജാവ് റെഡി - പാട്ടും പാടാം, കഥയും പറയാം! 🚀🎵",
    "ലിറ്റ് വൈബ്സ്! എന്തെങ്കിലും അറിയാനുണ്ടോ? ഓണപ്പാട്ടും പാടാം! 🌟🎭",
    "ഫയർ എനർജി! രാജാവിന്റെ കിംഗ്ഡത്തിൽ എന്തും ചോദിക്കാം! 💪🔥",
    "സൂപ്പർ കിംഗ് മാവേലി ഹിയർ! ഗാനം, കഥ, അറിവ് - എല്ലാം റെഡി! 🎯👑",
    "അടിപൊളി എൻട്രി! രാജകീയ സേവനത്തിൽ എന്തും ചോദിക്കൂ ബ്രോ! 🎵⚡",
];

#[derive(Debug, Clone)]
pub struct Persona {
    /// Instructions prepended to every prompt.
    pub script: String,
    /// Canned replies used when the model gives nothing usable. Never empty.
    pub fallback_replies: Vec<String>,
    /// Reply to `/start` and `/help`.
    pub welcome: String,
    /// Sent when a turn fails outright.
    pub apology: String,
    /// Sent to non-admins who try `/stats`.
    pub admin_only: String,
}

impl Persona {
    pub fn maveli() -> Self {
        Self {
            script: MAVELI_SCRIPT.trim().to_string(),
            fallback_replies: FALLBACK_REPLIES.iter().map(|s| (*s).to_string()).collect(),
            welcome: WELCOME.to_string(),
            apology: APOLOGY.to_string(),
            admin_only: ADMIN_ONLY.to_string(),
        }
    }

    /// Bundled persona, or the bundled one with its script replaced by `path`.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut persona = Self::maveli();
        if let Some(path) = path {
            let script = std::fs::read_to_string(path)
                .with_context(|| format!("read persona script {}", path.display()))?;
            anyhow::ensure!(
                !script.trim().is_empty(),
                "persona script {} is empty",
                path.display()
            );
            persona.script = script.trim().to_string();
        }
        Ok(persona)
    }
}

impl Default for Persona {
    fn default() -> Self {
        Self::maveli()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn bundled_script_is_malayalam_king() {
        let persona = Persona::maveli();
        assert!(persona.script.starts_with("നീ മാവേലി രാജാവാണ്"));
        assert!(persona.script.contains("മലയാളത്തിൽ മാത്രം മറുപടി"));
    }

    #[test]
    fn fallback_pool_has_ten_non_empty_entries() {
        let persona = Persona::maveli();
        assert_eq!(persona.fallback_replies.len(), 10);
        assert!(persona.fallback_replies.iter().all(|r| !r.trim().is_empty()));
    }

    #[test]
    fn load_replaces_script_only() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  You are a test persona.  ").unwrap();

        let persona = Persona::load(Some(file.path())).unwrap();
        assert_eq!(persona.script, "You are a test persona.");
        assert_eq!(persona.apology, Persona::maveli().apology);
    }

    #[test]
    fn load_rejects_empty_script() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(Persona::load(Some(file.path())).is_err());
    }

    #[test]
    fn load_without_path_is_bundled() {
        let persona = Persona::load(None).unwrap();
        assert_eq!(persona.script, Persona::maveli().script);
    }
}

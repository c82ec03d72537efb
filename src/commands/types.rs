use strum::{Display, EnumString};

/// Slash commands the bot answers directly instead of as a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Command {
    /// Greeting for new users.
    Start,
    /// Same greeting, on request.
    Help,
    /// Runtime counters; administrator only.
    Stats,
}

impl Command {
    pub fn admin_only(self) -> bool {
        matches!(self, Self::Stats)
    }
}

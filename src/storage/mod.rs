mod store;
mod types;

pub use store::{ConversationStore, format_transcript};
pub use types::{DailyStats, HistoryEntry, RecentConversation, User, UserStats};

pub mod startup;
pub mod telegram;
pub mod traits;

pub use startup::wait_until_healthy;
pub use telegram::TelegramChannel;
pub use traits::{Channel, ChatAction, InboundMessage, Sender};

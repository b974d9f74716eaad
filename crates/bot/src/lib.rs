//! Conversation handling and the Telegram front end for Paperbot.

pub mod handler;
pub mod messages;
pub mod telegram;

pub use handler::{failure_notice, Button, ConversationHandler, ReplySink};
pub use telegram::TelegramFrontend;

//! Telegram front end.

use crate::handler::{Button, ConversationHandler, ReplySink};
use async_trait::async_trait;
use paperbot_core::{AppError, AppResult};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, MessageId};
use teloxide::utils::command::BotCommands;

/// Telegram rejects longer messages.
const MAX_MESSAGE_CHARS: usize = 4096;

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
enum Command {
    #[command(description = "show the greeting")]
    Start,
    #[command(description = "show the greeting")]
    Help,
}

/// Replies into one chat, optionally bound to the message a button was
/// pressed on.
struct ChatSink {
    bot: Bot,
    chat_id: ChatId,
    message_id: Option<MessageId>,
}

fn channel_err(e: teloxide::RequestError) -> AppError {
    AppError::Channel(e.to_string())
}

#[async_trait]
impl ReplySink for ChatSink {
    async fn send_text(&self, text: &str) -> AppResult<()> {
        for part in split_message(text, MAX_MESSAGE_CHARS) {
            self.bot
                .send_message(self.chat_id, part)
                .await
                .map_err(channel_err)?;
        }
        Ok(())
    }

    async fn send_with_buttons(&self, text: &str, buttons: &[Button]) -> AppResult<()> {
        let row: Vec<InlineKeyboardButton> = buttons
            .iter()
            .map(|b| InlineKeyboardButton::callback(b.label.clone(), b.callback_data.clone()))
            .collect();

        self.bot
            .send_message(self.chat_id, text)
            .reply_markup(InlineKeyboardMarkup::new([row]))
            .await
            .map_err(channel_err)?;
        Ok(())
    }

    async fn edit_text(&self, text: &str) -> AppResult<()> {
        let message_id = self
            .message_id
            .ok_or_else(|| AppError::Channel("No message to edit".to_string()))?;

        self.bot
            .edit_message_text(self.chat_id, message_id, text)
            .await
            .map_err(channel_err)?;
        Ok(())
    }
}

/// Long-polling Telegram bot driving a [`ConversationHandler`].
pub struct TelegramFrontend {
    bot: Bot,
    handler: Arc<ConversationHandler>,
}

impl TelegramFrontend {
    pub fn new(token: &str, handler: Arc<ConversationHandler>) -> Self {
        Self {
            bot: Bot::new(token),
            handler,
        }
    }

    /// Check the token, then dispatch updates until Ctrl-C.
    pub async fn run(self) -> AppResult<()> {
        let me = self
            .bot
            .get_me()
            .await
            .map_err(|e| AppError::Config(format!("Telegram rejected the bot token: {}", e)))?;
        tracing::info!("Bot @{} started and ready", me.username());

        let tree = dptree::entry()
            .branch(
                Update::filter_message()
                    .filter_command::<Command>()
                    .endpoint(on_command),
            )
            .branch(Update::filter_message().endpoint(on_message))
            .branch(Update::filter_callback_query().endpoint(on_callback));

        Dispatcher::builder(self.bot, tree)
            .dependencies(dptree::deps![self.handler])
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        tracing::info!("Bot stopped");
        Ok(())
    }
}

async fn on_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    handler: Arc<ConversationHandler>,
) -> ResponseResult<()> {
    tracing::debug!(chat = %msg.chat.id, "Command {:?}", cmd);
    let sink = ChatSink {
        bot,
        chat_id: msg.chat.id,
        message_id: None,
    };

    match cmd {
        Command::Start | Command::Help => {
            if let Err(e) = handler.handle_start(&sink).await {
                tracing::error!(error.kind = %e.kind(), "Failed to send greeting: {}", e);
            }
        }
    }
    Ok(())
}

async fn on_message(
    bot: Bot,
    msg: Message,
    handler: Arc<ConversationHandler>,
) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    if is_command(text) {
        tracing::debug!(chat = %msg.chat.id, "Ignoring unsupported command {:?}", text);
        return Ok(());
    }

    tracing::info!(chat = %msg.chat.id, "Question received ({} chars)", text.len());
    let sink = ChatSink {
        bot,
        chat_id: msg.chat.id,
        message_id: None,
    };
    handler.handle_question(text, &sink).await;
    Ok(())
}

async fn on_callback(
    bot: Bot,
    query: CallbackQuery,
    handler: Arc<ConversationHandler>,
) -> ResponseResult<()> {
    bot.answer_callback_query(query.id.clone()).await?;

    let (Some(data), Some(message)) = (query.data.as_deref(), query.message.as_ref()) else {
        return Ok(());
    };

    let sink = ChatSink {
        bot,
        chat_id: message.chat().id,
        message_id: Some(message.id()),
    };
    if let Err(e) = handler.handle_callback(data, &sink).await {
        tracing::error!(error.kind = %e.kind(), "Failed to handle callback: {}", e);
    }
    Ok(())
}

fn is_command(text: &str) -> bool {
    text.split_whitespace()
        .next()
        .is_some_and(|word| word.starts_with('/'))
}

/// Split `text` into parts of at most `max_chars` characters, preferring to
/// break after a newline.
fn split_message(text: &str, max_chars: usize) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = text;

    while rest.chars().count() > max_chars {
        let hard_limit = rest
            .char_indices()
            .nth(max_chars)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let split_at = rest[..hard_limit]
            .rfind('\n')
            .map(|i| i + 1)
            .filter(|&i| i > 0)
            .unwrap_or(hard_limit);

        parts.push(&rest[..split_at]);
        rest = &rest[split_at..];
    }

    if !rest.is_empty() || parts.is_empty() {
        parts.push(rest);
    }
    parts
}

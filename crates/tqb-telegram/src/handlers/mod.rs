//! Telegram update handlers.
//!
//! Each handler decodes the update, calls the matching `QuizEngine` entry
//! point and renders the result. Every error ends up as a reply.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message, ReplyMarkup},
};

use crate::{render, router::AppState};

mod callback;
mod commands;

pub use callback::{parse_callback, CallbackAction};
pub use commands::{classify, Command};

pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let chat_id = q.message.as_ref().map(|m| m.chat.id.0);
    match chat_id {
        Some(id) => {
            let _guard = state.chat_locks.lock_chat(id).await;
            callback::handle_callback(bot, q, state).await
        }
        None => callback::handle_callback(bot, q, state).await,
    }
}

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let Some(command) = classify(text) else {
        state
            .replier
            .send_html(
                msg.chat.id,
                "Use the buttons below or /help to see what I can do.",
                Some(ReplyMarkup::Keyboard(render::main_keyboard())),
            )
            .await?;
        return Ok(());
    };

    // Sequentialize command handling per chat.
    let _guard = state.chat_locks.lock_chat(msg.chat.id.0).await;
    commands::handle_command(msg, command, state).await
}

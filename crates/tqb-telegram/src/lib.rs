//! Telegram adapter (teloxide).
//!
//! Routes commands, reply-keyboard buttons and inline callbacks into
//! `tqb_core::engine::QuizEngine` and renders the results as HTML messages.

use teloxide::{
    prelude::*,
    types::{ParseMode, ReplyMarkup},
    RequestError,
};

use tokio::time::sleep;
use tracing::warn;

pub mod handlers;
pub mod render;
pub mod router;

/// Outgoing messages with one retry on Telegram flood control.
#[derive(Clone)]
pub struct Replier {
    bot: Bot,
}

impl Replier {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> ResponseResult<T>
    where
        Fut: std::future::IntoFuture<Output = ResponseResult<T>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(RequestError::RetryAfter(d)) if attempts < MAX_RETRIES => {
                    attempts += 1;
                    warn!(retry_after = ?d, "telegram flood control; retrying");
                    sleep(d).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub async fn send_html(
        &self,
        chat_id: ChatId,
        html: &str,
        markup: Option<ReplyMarkup>,
    ) -> ResponseResult<()> {
        self.with_retry(|| {
            let req = self
                .bot
                .send_message(chat_id, html.to_string())
                .parse_mode(ParseMode::Html);
            match markup.clone() {
                Some(m) => req.reply_markup(m),
                None => req,
            }
        })
        .await?;
        Ok(())
    }
}

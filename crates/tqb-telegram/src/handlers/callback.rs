use std::sync::Arc;

use teloxide::{prelude::*, types::ReplyMarkup};
use tracing::error;

use tqb_core::{
    domain::{FilterKind, RoundId, UserId},
    engine::AnswerOutcome,
    errors::Error,
    session::AnswerTicket,
};

use crate::{render, router::AppState};

/// Decoded inline-button payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallbackAction {
    Answer(AnswerTicket),
    SetFilter {
        kind: FilterKind,
        value: Option<String>,
    },
}

/// Parse `ans:{round}:{position}:{choice}`, `setcat:{label|*}` or `setdiff:{label|*}`.
pub fn parse_callback(data: &str) -> Option<CallbackAction> {
    let (prefix, rest) = data.split_once(':')?;
    match prefix {
        "ans" => {
            let mut parts = rest.split(':');
            let round = parts.next()?.parse::<u64>().ok()?;
            let position = parts.next()?.parse::<usize>().ok()?;
            let choice = parts.next()?.parse::<usize>().ok()?;
            if parts.next().is_some() {
                return None;
            }
            Some(CallbackAction::Answer(AnswerTicket {
                round: RoundId(round),
                position,
                choice,
            }))
        }
        "setcat" | "setdiff" => {
            let kind = if prefix == "setcat" {
                FilterKind::Category
            } else {
                FilterKind::Difficulty
            };
            // Labels may contain ':' themselves; everything after the prefix is the label.
            let value = (rest != render::ANY_VALUE && !rest.is_empty()).then(|| rest.to_string());
            Some(CallbackAction::SetFilter { kind, value })
        }
        _ => None,
    }
}

pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let cb_id = q.id.clone();
    let Some(message) = q.message.as_ref() else {
        let _ = bot.answer_callback_query(cb_id).await;
        return Ok(());
    };
    let chat_id = message.chat.id;

    let Some(action) = q.data.as_deref().and_then(parse_callback) else {
        let _ = bot
            .answer_callback_query(cb_id)
            .text("Invalid button".to_string())
            .await;
        return Ok(());
    };

    let user = UserId(q.from.id.0 as i64);

    match action {
        CallbackAction::Answer(ticket) => {
            match state.engine.submit_answer(user, ticket).await {
                Ok(outcome) => {
                    let _ = bot.answer_callback_query(cb_id).await;
                    // The answered question's buttons are dead now.
                    let _ = bot
                        .edit_message_reply_markup(chat_id, message.id)
                        .await;

                    state
                        .replier
                        .send_html(chat_id, render::verdict_text(outcome.correct()), None)
                        .await?;

                    match outcome {
                        AnswerOutcome::Next { question, .. } => {
                            state
                                .replier
                                .send_html(
                                    chat_id,
                                    &render::question_text(&question),
                                    Some(ReplyMarkup::InlineKeyboard(render::question_keyboard(
                                        &question,
                                    ))),
                                )
                                .await?;
                        }
                        AnswerOutcome::Finished { summary, .. } => {
                            state
                                .replier
                                .send_html(
                                    chat_id,
                                    &render::summary_text(&summary),
                                    Some(ReplyMarkup::Keyboard(render::main_keyboard())),
                                )
                                .await?;
                        }
                    }
                }
                Err(e) => alert(&bot, cb_id, user, &e).await,
            }
        }

        CallbackAction::SetFilter { kind, value } => {
            match state.engine.set_filter(user, kind, value).await {
                Ok(filters) => {
                    let _ = bot.answer_callback_query(cb_id).await;
                    state
                        .replier
                        .send_html(chat_id, &render::filter_set_text(kind, &filters), None)
                        .await?;
                }
                Err(e) => alert(&bot, cb_id, user, &e).await,
            }
        }
    }

    Ok(())
}

async fn alert(bot: &Bot, cb_id: String, user: UserId, err: &Error) {
    if !err.is_user_facing() {
        error!(user = user.0, error = %err, "callback failed");
    }
    let _ = bot
        .answer_callback_query(cb_id)
        .text(render::alert_text(err))
        .show_alert(true)
        .await;
}

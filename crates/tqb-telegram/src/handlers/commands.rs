use std::sync::Arc;

use teloxide::{prelude::*, types::ReplyMarkup};
use tracing::error;

use tqb_core::{
    domain::{FilterKind, UserId},
    errors::Error,
    utils::display_name,
};

use crate::{render, router::AppState};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Play,
    Daily,
    Rank,
    /// `/cat` shows the picker; `/cat <label>` sets it directly.
    Filter(FilterKind, Option<String>),
    Mode,
    Quit,
    Unknown(String),
}

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

/// Map a slash command or a reply-keyboard button to a [`Command`].
/// Returns `None` for ordinary chat text.
pub fn classify(text: &str) -> Option<Command> {
    let text = text.trim();
    match text {
        render::BTN_PLAY => return Some(Command::Play),
        render::BTN_DAILY => return Some(Command::Daily),
        render::BTN_RANK => return Some(Command::Rank),
        render::BTN_FILTERS => return Some(Command::Mode),
        _ => {}
    }
    if !text.starts_with('/') {
        return None;
    }

    let (cmd, arg) = parse_command(text);
    let arg = (!arg.is_empty()).then_some(arg);
    Some(match cmd.as_str() {
        "start" => Command::Start,
        "help" => Command::Help,
        "play" => Command::Play,
        "daily" => Command::Daily,
        "rank" => Command::Rank,
        "cat" => Command::Filter(FilterKind::Category, arg),
        "diff" => Command::Filter(FilterKind::Difficulty, arg),
        "mode" => Command::Mode,
        "quit" => Command::Quit,
        _ => Command::Unknown(cmd),
    })
}

pub async fn handle_command(
    msg: Message,
    command: Command,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let Some(from) = msg.from() else {
        return Ok(());
    };
    let user = UserId(from.id.0 as i64);
    let name = display_name(&from.full_name(), user.0);
    let chat_id = msg.chat.id;
    let replier = &state.replier;
    let main_kb = || Some(ReplyMarkup::Keyboard(render::main_keyboard()));

    match command {
        Command::Start => match state.engine.account(user, &name).await {
            Ok(acc) => {
                replier
                    .send_html(chat_id, &render::welcome_text(acc.free_left), main_kb())
                    .await?
            }
            Err(e) => reply_error(&state, chat_id, user, &e).await?,
        },

        Command::Help => {
            let text = render::help_text(state.engine.config().questions_per_round);
            replier.send_html(chat_id, &text, main_kb()).await?;
        }

        Command::Play => match state.engine.start_round_with_preferences(user, &name).await {
            Ok(started) => {
                replier
                    .send_html(chat_id, &render::round_started_text(&started), None)
                    .await?;
                replier
                    .send_html(
                        chat_id,
                        &render::question_text(&started.question),
                        Some(ReplyMarkup::InlineKeyboard(render::question_keyboard(
                            &started.question,
                        ))),
                    )
                    .await?;
            }
            Err(Error::RoundInProgress) => {
                // Re-send the pending question so the player can carry on.
                reply_error(&state, chat_id, user, &Error::RoundInProgress).await?;
                if let Some(q) = state.engine.active_round(user).await {
                    replier
                        .send_html(
                            chat_id,
                            &render::question_text(&q),
                            Some(ReplyMarkup::InlineKeyboard(render::question_keyboard(&q))),
                        )
                        .await?;
                }
            }
            Err(e) => reply_error(&state, chat_id, user, &e).await?,
        },

        Command::Daily => match state.engine.claim_daily(user, &name).await {
            Ok(free_left) => {
                replier
                    .send_html(chat_id, &render::daily_claimed_text(free_left), main_kb())
                    .await?
            }
            Err(e) => reply_error(&state, chat_id, user, &e).await?,
        },

        Command::Rank => match state.engine.ranking(state.cfg.ranking_limit) {
            Ok(entries) => {
                replier
                    .send_html(chat_id, &render::ranking_text(&entries), main_kb())
                    .await?
            }
            Err(e) => reply_error(&state, chat_id, user, &e).await?,
        },

        Command::Filter(kind, None) => {
            let labels = match kind {
                FilterKind::Category => state.engine.categories(),
                FilterKind::Difficulty => state.engine.difficulties(),
            };
            replier
                .send_html(
                    chat_id,
                    &render::label_prompt(kind),
                    Some(ReplyMarkup::InlineKeyboard(render::label_keyboard(
                        kind, &labels,
                    ))),
                )
                .await?;
        }

        Command::Filter(kind, Some(arg)) => {
            let clear = arg == render::ANY_VALUE || arg.eq_ignore_ascii_case(render::ANY_LABEL);
            let value = (!clear).then_some(arg);
            match state.engine.set_filter(user, kind, value).await {
                Ok(filters) => {
                    replier
                        .send_html(chat_id, &render::filter_set_text(kind, &filters), main_kb())
                        .await?
                }
                Err(e) => reply_error(&state, chat_id, user, &e).await?,
            }
        }

        Command::Mode => {
            let filters = state.engine.filters(user).await;
            replier
                .send_html(chat_id, &render::filters_text(&filters), main_kb())
                .await?;
        }

        Command::Quit => {
            let abandoned = state.engine.abandon_round(user).await;
            replier
                .send_html(chat_id, render::quit_text(abandoned), main_kb())
                .await?;
        }

        Command::Unknown(cmd) => {
            let text = format!(
                "Unknown command: /{}. Try /help.",
                render::escape_html(&cmd)
            );
            replier.send_html(chat_id, &text, main_kb()).await?;
        }
    }

    Ok(())
}

/// Friendly reply for user-facing errors; hard failures are logged and get a generic text.
pub async fn reply_error(
    state: &AppState,
    chat_id: ChatId,
    user: UserId,
    err: &Error,
) -> ResponseResult<()> {
    if !err.is_user_facing() {
        error!(user = user.0, error = %err, "command failed");
    }
    state
        .replier
        .send_html(
            chat_id,
            &render::error_text(err),
            Some(ReplyMarkup::Keyboard(render::main_keyboard())),
        )
        .await
}

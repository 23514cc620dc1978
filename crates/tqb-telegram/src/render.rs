//! Text templates and keyboards. Everything here is pure so it can be tested
//! without a bot.

use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup,
};

use tqb_core::{
    domain::{FilterKind, Filters},
    engine::{RoundStarted, RoundSummary},
    errors::Error,
    ranking::RankedEntry,
    session::QuestionView,
};

// Reply-keyboard buttons. Incoming text is matched against these exactly.
pub const BTN_PLAY: &str = "▶️ Play";
pub const BTN_DAILY: &str = "🎁 Daily chest";
pub const BTN_RANK: &str = "🏆 Ranking";
pub const BTN_FILTERS: &str = "⚙️ Filters";

/// Label shown for "no filter".
pub const ANY_LABEL: &str = "Any";
/// Callback value meaning "clear this filter".
pub const ANY_VALUE: &str = "*";

/// Telegram rejects callback data over 64 bytes.
pub const MAX_CALLBACK_DATA: usize = 64;

const ANSWERS_PER_ROW: usize = 2;
const LABELS_PER_ROW: usize = 3;

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn main_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![KeyboardButton::new(BTN_PLAY)],
        vec![KeyboardButton::new(BTN_DAILY), KeyboardButton::new(BTN_RANK)],
        vec![KeyboardButton::new(BTN_FILTERS)],
    ])
    .resize_keyboard(true)
}

pub fn answer_data(q: &QuestionView, choice: usize) -> String {
    format!("ans:{}:{}:{choice}", q.round.0, q.position)
}

pub fn filter_data(kind: FilterKind, label: Option<&str>) -> String {
    let prefix = match kind {
        FilterKind::Category => "setcat",
        FilterKind::Difficulty => "setdiff",
    };
    format!("{prefix}:{}", label.unwrap_or(ANY_VALUE))
}

pub fn question_text(q: &QuestionView) -> String {
    format!(
        "❓ <b>Question {}/{}</b>\n{}",
        q.position + 1,
        q.total,
        escape_html(&q.prompt)
    )
}

pub fn question_keyboard(q: &QuestionView) -> InlineKeyboardMarkup {
    let buttons: Vec<InlineKeyboardButton> = q
        .options
        .iter()
        .enumerate()
        .map(|(i, opt)| InlineKeyboardButton::callback(opt.clone(), answer_data(q, i)))
        .collect();
    InlineKeyboardMarkup::new(buttons.chunks(ANSWERS_PER_ROW).map(|row| row.to_vec()))
}

/// "Any" first, then every label that fits in callback data.
pub fn label_keyboard(kind: FilterKind, labels: &[String]) -> InlineKeyboardMarkup {
    let mut buttons = vec![InlineKeyboardButton::callback(
        ANY_LABEL,
        filter_data(kind, None),
    )];
    buttons.extend(labels.iter().filter_map(|label| {
        let data = filter_data(kind, Some(label));
        (data.len() <= MAX_CALLBACK_DATA)
            .then(|| InlineKeyboardButton::callback(label.clone(), data))
    }));
    InlineKeyboardMarkup::new(buttons.chunks(LABELS_PER_ROW).map(|row| row.to_vec()))
}

pub fn label_prompt(kind: FilterKind) -> String {
    format!("Choose a {kind}:")
}

pub fn welcome_text(free_left: u32) -> String {
    format!(
        "⚡ <b>Welcome to Lightning Trivia!</b>\n\n\
You have <b>{free_left}</b> free rounds today.\n\n\
<b>Commands:</b>\n\
/play - play one round\n\
/daily - daily chest (+1 round)\n\
/rank - leaderboard\n\
/cat - choose a category\n\
/diff - choose a difficulty\n\
/mode - show current filters\n\
/quit - abandon the current round\n\
/help - how to play"
    )
}

pub fn help_text(questions_per_round: usize) -> String {
    format!(
        "Answer {questions_per_round} questions per round, none repeated. \
Use /cat and /diff to filter. Pinning a difficulty earns a bonus. Good luck!"
    )
}

pub fn round_started_text(started: &RoundStarted) -> String {
    let mut out = format!("▶️ <b>Round started!</b> ({} questions)", started.total);
    if started.fell_back {
        out.push_str("\nNo question matches your filters, so this round uses the whole catalog.");
    }
    out.push_str(&format!("\nFree rounds left today: {}", started.free_left));
    out
}

pub fn verdict_text(correct: bool) -> &'static str {
    if correct {
        "✅ Correct!"
    } else {
        "❌ Wrong. Better luck on the next one!"
    }
}

pub fn summary_text(s: &RoundSummary) -> String {
    let mut out = format!("🏁 Round over: <b>{}/{}</b> pts.", s.score, s.total);
    if s.bonus > 0 {
        out.push_str(&format!("\nDifficulty bonus: <b>+{}</b>", s.bonus));
    }
    out.push_str(&format!("\nYour total: <b>{}</b>", s.new_total));
    out
}

pub fn ranking_text(entries: &[RankedEntry]) -> String {
    if entries.is_empty() {
        return "No scores yet. Be the first!".to_string();
    }
    let mut lines = vec!["🏆 <b>Ranking</b>".to_string()];
    for e in entries {
        lines.push(format!(
            "{}. {} - <b>{}</b> pts",
            e.rank,
            escape_html(&e.display_name),
            e.total
        ));
    }
    lines.join("\n")
}

pub fn filters_text(f: &Filters) -> String {
    format!(
        "⚙️ Current filters:\n• Category: <b>{}</b>\n• Difficulty: <b>{}</b>",
        escape_html(f.category.as_deref().unwrap_or(ANY_LABEL)),
        escape_html(f.difficulty.as_deref().unwrap_or(ANY_LABEL)),
    )
}

pub fn filter_set_text(kind: FilterKind, f: &Filters) -> String {
    let value = f.get(kind).unwrap_or(ANY_LABEL);
    let name = match kind {
        FilterKind::Category => "Category",
        FilterKind::Difficulty => "Difficulty",
    };
    format!("✅ {name} selected: {}", escape_html(value))
}

pub fn daily_claimed_text(free_left: u32) -> String {
    format!("🎁 Daily chest opened! +1 round. Free rounds left today: <b>{free_left}</b>")
}

pub fn quit_text(abandoned: bool) -> &'static str {
    if abandoned {
        "Round abandoned. The free round it used is not refunded."
    } else {
        "You have no active round."
    }
}

/// Player-facing HTML for an error. Hard failures get a generic message;
/// callers log the details.
pub fn error_text(err: &Error) -> String {
    error_message(err, escape_html)
}

/// Same wording as [`error_text`] for plain-text surfaces (callback alerts).
pub fn alert_text(err: &Error) -> String {
    error_message(err, str::to_string)
}

fn error_message(err: &Error, quote: fn(&str) -> String) -> String {
    match err {
        Error::NoFreeRounds => {
            "You used all your free rounds today. Come back tomorrow or open the /daily chest."
                .to_string()
        }
        Error::EmptyPool => "No questions match those filters. Adjust them with /cat and /diff."
            .to_string(),
        Error::InvalidFilter { kind, value } => {
            format!("Unknown {kind}: {}. Pick one from the list.", quote(value))
        }
        Error::RoundInProgress => {
            "You already have a round in progress. Answer it or use /quit.".to_string()
        }
        Error::NoActiveRound => "There is no active round. Use /play.".to_string(),
        Error::SessionMismatch => "That button is no longer active.".to_string(),
        Error::AlreadyClaimed => "You already opened today's chest.".to_string(),
        Error::Config(_)
        | Error::Io(_)
        | Error::Json(_)
        | Error::Storage(_)
        | Error::External(_) => {
            "⚠️ Something went wrong. Please try again.".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tqb_core::domain::RoundId;

    fn view(options: &[&str]) -> QuestionView {
        QuestionView {
            round: RoundId(7),
            position: 2,
            total: 5,
            prompt: "Is 1 < 2 & 3 > 2?".to_string(),
            options: options.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn callback_data(kb: &InlineKeyboardMarkup) -> Vec<Vec<String>> {
        use teloxide::types::InlineKeyboardButtonKind;
        kb.inline_keyboard
            .iter()
            .map(|row| {
                row.iter()
                    .map(|b| match &b.kind {
                        InlineKeyboardButtonKind::CallbackData(d) => d.clone(),
                        other => panic!("unexpected button kind {other:?}"),
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn question_text_is_escaped_and_numbered() {
        let t = question_text(&view(&["a", "b"]));
        assert!(t.contains("Question 3/5"));
        assert!(t.contains("1 &lt; 2 &amp; 3 &gt; 2"));
    }

    #[test]
    fn answers_two_per_row_with_tickets() {
        let kb = question_keyboard(&view(&["a", "b", "c"]));
        assert_eq!(
            callback_data(&kb),
            vec![
                vec!["ans:7:2:0".to_string(), "ans:7:2:1".to_string()],
                vec!["ans:7:2:2".to_string()],
            ]
        );
    }

    #[test]
    fn label_keyboard_starts_with_any_and_skips_oversized() {
        let long = "x".repeat(70);
        let labels = vec![
            "History".to_string(),
            long,
            "Science".to_string(),
            "Sports".to_string(),
        ];
        let kb = label_keyboard(FilterKind::Category, &labels);
        assert_eq!(
            callback_data(&kb),
            vec![
                vec![
                    "setcat:*".to_string(),
                    "setcat:History".to_string(),
                    "setcat:Science".to_string(),
                ],
                vec!["setcat:Sports".to_string()],
            ]
        );
        assert_eq!(filter_data(FilterKind::Difficulty, Some("Hard")), "setdiff:Hard");
    }

    #[test]
    fn summary_mentions_bonus_only_when_earned() {
        let mut s = RoundSummary {
            score: 4,
            total: 5,
            bonus: 0,
            new_total: 12,
        };
        assert!(!summary_text(&s).contains("bonus"));
        s.bonus = 3;
        let t = summary_text(&s);
        assert!(t.contains("4/5"));
        assert!(t.contains("+3"));
        assert!(t.contains("<b>12</b>"));
    }

    #[test]
    fn ranking_lists_entries_in_order() {
        assert_eq!(ranking_text(&[]), "No scores yet. Be the first!");
        let t = ranking_text(&[
            RankedEntry {
                rank: 1,
                display_name: "<Ana>".into(),
                total: 30,
            },
            RankedEntry {
                rank: 2,
                display_name: "Bo".into(),
                total: 20,
            },
        ]);
        let lines: Vec<&str> = t.lines().collect();
        assert_eq!(lines[1], "1. &lt;Ana&gt; - <b>30</b> pts");
        assert_eq!(lines[2], "2. Bo - <b>20</b> pts");
    }

    #[test]
    fn filters_default_to_any() {
        let t = filters_text(&Filters::new(Some("History"), None));
        assert!(t.contains("Category: <b>History</b>"));
        assert!(t.contains("Difficulty: <b>Any</b>"));
    }

    #[test]
    fn every_user_facing_error_has_specific_text() {
        let generic = error_text(&Error::Storage("disk".into()));
        let errors = [
            Error::NoFreeRounds,
            Error::EmptyPool,
            Error::InvalidFilter {
                kind: FilterKind::Difficulty,
                value: "Insane".into(),
            },
            Error::RoundInProgress,
            Error::NoActiveRound,
            Error::SessionMismatch,
            Error::AlreadyClaimed,
        ];
        for e in &errors {
            assert!(e.is_user_facing());
            assert_ne!(error_text(e), generic, "{e:?}");
        }
        assert!(!generic.contains("disk"));
    }

    #[test]
    fn alerts_are_plain_text() {
        let err = Error::InvalidFilter {
            kind: FilterKind::Category,
            value: "<Sci & Fi>".into(),
        };
        assert_eq!(
            alert_text(&err),
            "Unknown category: <Sci & Fi>. Pick one from the list."
        );
        assert!(error_text(&err).contains("&lt;Sci &amp; Fi&gt;"));
        assert_eq!(
            alert_text(&Error::SessionMismatch),
            error_text(&Error::SessionMismatch)
        );
    }

    #[test]
    fn stale_button_text_does_not_assume_a_repeat_press() {
        let t = alert_text(&Error::SessionMismatch);
        assert_eq!(t, "That button is no longer active.");
        assert!(!t.contains("already answered"));
    }
}

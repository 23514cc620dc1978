use std::collections::{HashMap, VecDeque};

use crate::{
    domain::{RoundId, UserId},
    errors::Error,
    selector::RoundQuestion,
    Result,
};

/// The pending question as shown to a player. Never carries the answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionView {
    pub round: RoundId,
    /// 0-based index of this question within the round.
    pub position: usize,
    pub total: usize,
    pub prompt: String,
    pub options: Vec<String>,
}

/// Identifies which question a player is answering and with which option.
///
/// Adapters embed `round` and `position` in their buttons so stale or foreign
/// presses can be told apart from the pending question.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnswerTicket {
    pub round: RoundId,
    pub position: usize,
    pub choice: usize,
}

/// In-memory progress through one round.
#[derive(Clone, Debug)]
pub struct Session {
    round: RoundId,
    display_name: String,
    bonus: i64,
    position: usize,
    score: u32,
    total: usize,
    remaining: VecDeque<RoundQuestion>,
}

impl Session {
    pub fn new(
        round: RoundId,
        display_name: String,
        bonus: i64,
        questions: Vec<RoundQuestion>,
    ) -> Self {
        Self {
            round,
            display_name,
            bonus,
            position: 0,
            score: 0,
            total: questions.len(),
            remaining: questions.into(),
        }
    }

    pub fn round(&self) -> RoundId {
        self.round
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Bonus added once when the round is committed.
    pub fn bonus(&self) -> i64 {
        self.bonus
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_last(&self) -> bool {
        self.remaining.len() <= 1
    }

    pub fn view(&self) -> Option<QuestionView> {
        let q = self.remaining.front()?;
        Some(QuestionView {
            round: self.round,
            position: self.position,
            total: self.total,
            prompt: q.prompt.clone(),
            options: q.options.clone(),
        })
    }

    /// Check `ticket` against the pending question without changing anything.
    pub fn grade(&self, ticket: &AnswerTicket) -> Result<bool> {
        if ticket.round != self.round || ticket.position != self.position {
            return Err(Error::SessionMismatch);
        }
        let pending = self.remaining.front().ok_or(Error::NoActiveRound)?;
        Ok(ticket.choice == pending.correct)
    }

    /// Consume the pending question.
    pub fn advance(&mut self, correct: bool) {
        if self.remaining.pop_front().is_none() {
            return;
        }
        self.position += 1;
        if correct {
            self.score += 1;
        }
    }
}

/// Active sessions keyed by user; at most one per user.
#[derive(Debug, Default)]
pub struct SessionStore {
    inner: HashMap<UserId, Session>,
}

impl SessionStore {
    pub fn contains(&self, user: UserId) -> bool {
        self.inner.contains_key(&user)
    }

    pub fn get(&self, user: UserId) -> Option<&Session> {
        self.inner.get(&user)
    }

    /// Insert a session, refusing to replace a live one.
    pub fn insert(&mut self, user: UserId, session: Session) -> Result<()> {
        if self.inner.contains_key(&user) {
            return Err(Error::RoundInProgress);
        }
        self.inner.insert(user, session);
        Ok(())
    }

    pub fn take(&mut self, user: UserId) -> Option<Session> {
        self.inner.remove(&user)
    }

    pub fn restore(&mut self, user: UserId, session: Session) {
        self.inner.insert(user, session);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

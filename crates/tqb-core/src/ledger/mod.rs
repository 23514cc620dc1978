//! Durable per-user score and allowance storage.
//!
//! Every operation starts with [`touch`], the single place where the daily
//! reset happens. Backends serialize their own operations, so two updates for
//! the same user can't overwrite each other.

pub mod json;
pub mod sqlite;

use std::sync::Arc;

use crate::{
    domain::{LeaderboardEntry, UserAccount, UserId},
    errors::Error,
    utils::{display_name, Clock},
    Result,
};

pub use json::JsonLedger;
pub use sqlite::SqliteLedger;

/// Ledger port. Implementations are local storage, so calls are synchronous.
pub trait Ledger: Send + Sync {
    /// Fetch the account, creating it with the daily allowance on first sight.
    fn get_or_create(&self, user: UserId, name: &str) -> Result<UserAccount>;

    /// Spend one free round. Fails with [`Error::NoFreeRounds`] at zero.
    fn decrement_free_round(&self, user: UserId, name: &str) -> Result<UserAccount>;

    fn add_points(&self, user: UserId, name: &str, delta: i64) -> Result<UserAccount>;

    /// Grant one extra free round, once per day ([`Error::AlreadyClaimed`]).
    fn claim_daily(&self, user: UserId, name: &str) -> Result<UserAccount>;

    /// Highest totals first; ties in ascending user id order.
    fn top(&self, limit: usize) -> Result<Vec<LeaderboardEntry>>;
}

#[derive(Clone)]
pub struct LedgerSettings {
    pub daily_free_rounds: u32,
    pub clock: Arc<dyn Clock>,
}

/// A single ledger mutation, shared by all backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Op {
    Touch,
    DecrementFreeRound,
    AddPoints(i64),
    ClaimDaily,
}

pub(crate) fn new_account(user: UserId, name: &str, day: i64, allowance: u32) -> UserAccount {
    UserAccount {
        user_id: user,
        display_name: display_name(name, user.0),
        total: 0,
        free_left: allowance,
        day_key: day,
        claim_day: None,
    }
}

/// Daily reset plus display-name refresh. Returns whether anything changed.
///
/// Idempotent within a day: a second call with the same `day` is a no-op.
pub(crate) fn touch(acc: &mut UserAccount, name: &str, day: i64, allowance: u32) -> bool {
    let mut changed = false;

    if acc.day_key != day {
        acc.day_key = day;
        acc.free_left = allowance;
        acc.claim_day = None;
        changed = true;
    }

    if !name.trim().is_empty() {
        let name = display_name(name, acc.user_id.0);
        if name != acc.display_name {
            acc.display_name = name;
            changed = true;
        }
    }

    changed
}

/// Apply `op` to an already touched account. Returns whether anything changed.
pub(crate) fn apply(acc: &mut UserAccount, op: Op, day: i64) -> Result<bool> {
    match op {
        Op::Touch => Ok(false),
        Op::DecrementFreeRound => {
            if acc.free_left == 0 {
                return Err(Error::NoFreeRounds);
            }
            acc.free_left -= 1;
            Ok(true)
        }
        Op::AddPoints(delta) => {
            acc.total = acc.total.saturating_add(delta);
            Ok(delta != 0)
        }
        Op::ClaimDaily => {
            if acc.claim_day == Some(day) {
                return Err(Error::AlreadyClaimed);
            }
            acc.claim_day = Some(day);
            acc.free_left = acc.free_left.saturating_add(1);
            Ok(true)
        }
    }
}

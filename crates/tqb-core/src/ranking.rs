use std::sync::Arc;

use crate::{domain::LeaderboardEntry, ledger::Ledger, Result};

pub const MAX_RANKING_LIMIT: usize = 100;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RankedEntry {
    /// 1-based position on the board.
    pub rank: usize,
    pub display_name: String,
    pub total: i64,
}

/// Leaderboard read straight from the ledger on every call.
#[derive(Clone)]
pub struct Ranking {
    ledger: Arc<dyn Ledger>,
}

impl Ranking {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self { ledger }
    }

    /// Top `limit` players, `limit` clamped to `1..=MAX_RANKING_LIMIT`.
    pub fn top(&self, limit: usize) -> Result<Vec<RankedEntry>> {
        let limit = limit.clamp(1, MAX_RANKING_LIMIT);
        Ok(number(self.ledger.top(limit)?))
    }
}

fn number(entries: Vec<LeaderboardEntry>) -> Vec<RankedEntry> {
    entries
        .into_iter()
        .enumerate()
        .map(|(i, e)| RankedEntry {
            rank: i + 1,
            display_name: e.display_name,
            total: e.total,
        })
        .collect()
}

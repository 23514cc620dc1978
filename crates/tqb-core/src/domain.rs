use std::fmt;

/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub i64);

/// Identifies one round instance; increases monotonically per engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RoundId(pub u64);

/// Which question filter a preference update targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterKind {
    Category,
    Difficulty,
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterKind::Category => f.write_str("category"),
            FilterKind::Difficulty => f.write_str("difficulty"),
        }
    }
}

/// Optional category/difficulty restriction for a round. `None` means "any".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Filters {
    pub category: Option<String>,
    pub difficulty: Option<String>,
}

impl Filters {
    pub fn new(category: Option<&str>, difficulty: Option<&str>) -> Self {
        Self {
            category: category.map(str::to_string),
            difficulty: difficulty.map(str::to_string),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.difficulty.is_none()
    }

    pub fn get(&self, kind: FilterKind) -> Option<&str> {
        match kind {
            FilterKind::Category => self.category.as_deref(),
            FilterKind::Difficulty => self.difficulty.as_deref(),
        }
    }

    pub fn set(&mut self, kind: FilterKind, value: Option<String>) {
        match kind {
            FilterKind::Category => self.category = value,
            FilterKind::Difficulty => self.difficulty = value,
        }
    }
}

/// Durable per-user record kept by the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserAccount {
    pub user_id: UserId,
    pub display_name: String,
    pub total: i64,
    pub free_left: u32,
    /// Day key of the last daily reset.
    pub day_key: i64,
    /// Day key of the last daily-bonus claim; `None` until claimed.
    pub claim_day: Option<i64>,
}

/// Read-only leaderboard projection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub display_name: String,
    pub total: i64,
}

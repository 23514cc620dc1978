// SQLite persistence for the ledger.

use std::{
    path::Path,
    sync::{Mutex, MutexGuard},
};

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::{
    domain::{LeaderboardEntry, UserAccount, UserId},
    errors::Error,
    ledger::{apply, new_account, touch, Ledger, LedgerSettings, Op},
    Result,
};

/// SQLite-backed ledger: one row per user, one transaction per operation.
pub struct SqliteLedger {
    conn: Mutex<Connection>,
    settings: LedgerSettings,
}

impl SqliteLedger {
    /// Open (or create) the database at `path` and ensure the schema exists.
    /// `":memory:"` gives an ephemeral database for tests.
    pub fn open(path: impl AsRef<Path>, settings: LedgerSettings) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            Error::Storage(format!("failed to open database at {}: {e}", path.display()))
        })?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS accounts (
                user_id      INTEGER PRIMARY KEY,
                display_name TEXT NOT NULL,
                total        INTEGER NOT NULL DEFAULT 0,
                free_left    INTEGER NOT NULL,
                day_key      INTEGER NOT NULL,
                claim_day    INTEGER
            );

            CREATE INDEX IF NOT EXISTS idx_accounts_total ON accounts(total DESC, user_id);
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
            settings,
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn run(&self, user: UserId, name: &str, op: Op) -> Result<UserAccount> {
        let day = self.settings.clock.day_key();
        let allowance = self.settings.daily_free_rounds;

        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let existing = tx
            .query_row(
                "SELECT user_id, display_name, total, free_left, day_key, claim_day
                 FROM accounts WHERE user_id = ?1",
                params![user.0],
                account_from_row,
            )
            .optional()?;

        let is_new = existing.is_none();
        let mut acc = existing.unwrap_or_else(|| new_account(user, name, day, allowance));
        let touched = touch(&mut acc, name, day, allowance);
        // An error here drops `tx`, which rolls back.
        let changed = apply(&mut acc, op, day)?;

        if is_new || touched || changed {
            tx.execute(
                "INSERT INTO accounts (user_id, display_name, total, free_left, day_key, claim_day)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(user_id) DO UPDATE SET
                    display_name = excluded.display_name,
                    total        = excluded.total,
                    free_left    = excluded.free_left,
                    day_key      = excluded.day_key,
                    claim_day    = excluded.claim_day",
                params![
                    acc.user_id.0,
                    acc.display_name,
                    acc.total,
                    acc.free_left,
                    acc.day_key,
                    acc.claim_day,
                ],
            )?;
        }
        tx.commit()?;

        Ok(acc)
    }
}

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<UserAccount> {
    Ok(UserAccount {
        user_id: UserId(row.get(0)?),
        display_name: row.get(1)?,
        total: row.get(2)?,
        free_left: row.get(3)?,
        day_key: row.get(4)?,
        claim_day: row.get(5)?,
    })
}

impl Ledger for SqliteLedger {
    fn get_or_create(&self, user: UserId, name: &str) -> Result<UserAccount> {
        self.run(user, name, Op::Touch)
    }

    fn decrement_free_round(&self, user: UserId, name: &str) -> Result<UserAccount> {
        self.run(user, name, Op::DecrementFreeRound)
    }

    fn add_points(&self, user: UserId, name: &str, delta: i64) -> Result<UserAccount> {
        self.run(user, name, Op::AddPoints(delta))
    }

    fn claim_daily(&self, user: UserId, name: &str) -> Result<UserAccount> {
        self.run(user, name, Op::ClaimDaily)
    }

    fn top(&self, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT display_name, total FROM accounts
             ORDER BY total DESC, user_id ASC
             LIMIT ?1",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map(params![limit], |row| {
                Ok(LeaderboardEntry {
                    display_name: row.get(0)?,
                    total: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

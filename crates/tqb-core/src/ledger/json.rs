use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::{
    domain::{LeaderboardEntry, UserAccount, UserId},
    ledger::{apply, new_account, touch, Ledger, LedgerSettings, Op},
    Result,
};

/// On-disk record, keyed by user id in the file's top-level object.
///
/// Everything but the name is optional so score files holding only
/// `{"name", "total"}` still load; missing day keys force a reset on first touch.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct StoredAccount {
    #[serde(alias = "name")]
    display_name: String,
    #[serde(default)]
    total: i64,
    #[serde(default)]
    free_left: u32,
    #[serde(default = "never")]
    day_key: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    claim_day: Option<i64>,
}

fn never() -> i64 {
    i64::MIN
}

impl StoredAccount {
    fn into_account(self, user: UserId) -> UserAccount {
        UserAccount {
            user_id: user,
            display_name: self.display_name,
            total: self.total,
            free_left: self.free_left,
            day_key: self.day_key,
            claim_day: self.claim_day,
        }
    }
}

impl From<&UserAccount> for StoredAccount {
    fn from(a: &UserAccount) -> Self {
        Self {
            display_name: a.display_name.clone(),
            total: a.total,
            free_left: a.free_left,
            day_key: a.day_key,
            claim_day: a.claim_day,
        }
    }
}

/// Ledger kept in a single JSON file, rewritten atomically on every change.
pub struct JsonLedger {
    path: PathBuf,
    settings: LedgerSettings,
    users: Mutex<BTreeMap<i64, UserAccount>>,
}

impl JsonLedger {
    pub fn open(path: impl Into<PathBuf>, settings: LedgerSettings) -> Result<Self> {
        let path = path.into();
        let users = load_file(&path)?;
        Ok(Self {
            path,
            settings,
            users: Mutex::new(users),
        })
    }

    fn users(&self) -> MutexGuard<'_, BTreeMap<i64, UserAccount>> {
        self.users.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn run(&self, user: UserId, name: &str, op: Op) -> Result<UserAccount> {
        let mut users = self.users();
        let day = self.settings.clock.day_key();
        let allowance = self.settings.daily_free_rounds;

        let previous = users.get(&user.0).cloned();
        let mut acc = previous
            .clone()
            .unwrap_or_else(|| new_account(user, name, day, allowance));

        let touched = touch(&mut acc, name, day, allowance);
        let changed = apply(&mut acc, op, day)?;
        if !(previous.is_none() || touched || changed) {
            return Ok(acc);
        }

        users.insert(user.0, acc.clone());
        if let Err(e) = save_file(&self.path, &users) {
            error!(path = %self.path.display(), error = %e, "failed to write ledger");
            match previous {
                Some(prev) => users.insert(user.0, prev),
                None => users.remove(&user.0),
            };
            return Err(e);
        }
        Ok(acc)
    }
}

impl Ledger for JsonLedger {
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
        let users = self.users();
        // BTreeMap iteration is id-ascending and the sort is stable, so ties keep id order.
        let mut all: Vec<&UserAccount> = users.values().collect();
        all.sort_by(|a, b| b.total.cmp(&a.total));
        Ok(all
            .into_iter()
            .take(limit)
            .map(|a| LeaderboardEntry {
                display_name: a.display_name.clone(),
                total: a.total,
            })
            .collect())
    }
}

fn load_file(path: &Path) -> Result<BTreeMap<i64, UserAccount>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let txt = fs::read_to_string(path)?;
    if txt.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    let stored: BTreeMap<i64, StoredAccount> = serde_json::from_str(&txt)?;
    Ok(stored
        .into_iter()
        .map(|(id, s)| (id, s.into_account(UserId(id))))
        .collect())
}

/// Write to a sibling temp file, then rename over the target.
fn save_file(path: &Path, users: &BTreeMap<i64, UserAccount>) -> Result<()> {
    let stored: BTreeMap<i64, StoredAccount> =
        users.iter().map(|(id, a)| (*id, a.into())).collect();
    let txt = serde_json::to_string_pretty(&stored)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, txt)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

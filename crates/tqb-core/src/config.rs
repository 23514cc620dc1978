use std::{
    collections::BTreeMap,
    env, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use tracing::warn;

use crate::{errors::Error, Result};

pub const DEFAULT_FREE_ROUNDS_PER_DAY: u32 = 3;
pub const DEFAULT_QUESTIONS_PER_ROUND: usize = 5;
pub const DEFAULT_RANKING_LIMIT: usize = 10;
pub const DEFAULT_DIFFICULTY_BONUS: &str = "Easy=1,Medium=2,Hard=3";

/// What to do when the player's filters match no question.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EmptyPoolPolicy {
    /// Refuse to start the round.
    #[default]
    Reject,
    /// Play from the whole catalog instead (no difficulty bonus).
    FallbackToCatalog,
}

impl FromStr for EmptyPoolPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "fallback" | "fallback_to_catalog" => Ok(Self::FallbackToCatalog),
            other => Err(Error::Config(format!(
                "EMPTY_POOL_POLICY must be `reject` or `fallback`, got `{other}`"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LedgerBackend {
    #[default]
    Json,
    Sqlite,
}

impl FromStr for LedgerBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(Error::Config(format!(
                "LEDGER_BACKEND must be `json` or `sqlite`, got `{other}`"
            ))),
        }
    }
}

/// Rules of the game, independent of where they were loaded from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameConfig {
    pub questions_per_round: usize,
    pub free_rounds_per_day: u32,
    pub empty_pool_policy: EmptyPoolPolicy,
    /// Points added once per round when it was pinned to this difficulty.
    pub difficulty_bonus: BTreeMap<String, i64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            questions_per_round: DEFAULT_QUESTIONS_PER_ROUND,
            free_rounds_per_day: DEFAULT_FREE_ROUNDS_PER_DAY,
            empty_pool_policy: EmptyPoolPolicy::Reject,
            difficulty_bonus: parse_bonus_table(DEFAULT_DIFFICULTY_BONUS),
        }
    }
}

impl GameConfig {
    pub fn bonus_for(&self, difficulty: Option<&str>) -> i64 {
        difficulty
            .and_then(|d| self.difficulty_bonus.get(d))
            .copied()
            .unwrap_or(0)
    }
}

/// Typed process configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_bot_token: String,

    // Storage
    pub catalog_file: PathBuf,
    pub ledger_backend: LedgerBackend,
    pub ledger_file: PathBuf,

    // Presentation
    pub ranking_limit: usize,

    pub game: GameConfig,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let telegram_bot_token = env_str("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let catalog_file = env_path("CATALOG_FILE").unwrap_or_else(|| "data_seed.json".into());

        let ledger_backend = match env_str("LEDGER_BACKEND").and_then(non_empty) {
            Some(v) => v.parse()?,
            None => LedgerBackend::default(),
        };
        let ledger_file = env_path("LEDGER_FILE").unwrap_or_else(|| match ledger_backend {
            LedgerBackend::Json => "scores.json".into(),
            LedgerBackend::Sqlite => "scores.db".into(),
        });

        let ranking_limit = env_parse::<usize>("RANKING_LIMIT")
            .unwrap_or(DEFAULT_RANKING_LIMIT)
            .max(1);

        let empty_pool_policy = match env_str("EMPTY_POOL_POLICY").and_then(non_empty) {
            Some(v) => v.parse()?,
            None => EmptyPoolPolicy::default(),
        };

        let game = GameConfig {
            questions_per_round: env_parse::<usize>("QUESTIONS_PER_ROUND")
                .unwrap_or(DEFAULT_QUESTIONS_PER_ROUND)
                .max(1),
            free_rounds_per_day: env_parse::<u32>("FREE_ROUNDS_PER_DAY")
                .unwrap_or(DEFAULT_FREE_ROUNDS_PER_DAY),
            empty_pool_policy,
            difficulty_bonus: bonus_table_or_default(env_str("DIFFICULTY_BONUS")),
        };

        Ok(Self {
            telegram_bot_token,
            catalog_file,
            ledger_backend,
            ledger_file,
            ranking_limit,
            game,
        })
    }
}

/// Parse `Label=points,Label=points`. Malformed pairs are ignored.
pub fn parse_bonus_table(v: &str) -> BTreeMap<String, i64> {
    v.split(',')
        .filter_map(|pair| {
            let (label, points) = pair.split_once('=')?;
            let label = label.trim();
            if label.is_empty() {
                return None;
            }
            let points = points.trim().parse::<i64>().ok()?;
            Some((label.to_string(), points))
        })
        .collect()
}

/// `DIFFICULTY_BONUS` value, or the default table when it is unset or has no
/// valid pair.
fn bonus_table_or_default(raw: Option<String>) -> BTreeMap<String, i64> {
    let Some(raw) = raw.and_then(non_empty) else {
        return parse_bonus_table(DEFAULT_DIFFICULTY_BONUS);
    };
    let table = parse_bonus_table(&raw);
    if table.is_empty() {
        warn!(
            value = %raw,
            default = DEFAULT_DIFFICULTY_BONUS,
            "DIFFICULTY_BONUS has no valid Label=points pair; using default"
        );
        return parse_bonus_table(DEFAULT_DIFFICULTY_BONUS);
    }
    table
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

/// Parsed env var. A set but malformed value is logged and treated as unset.
fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = env_str(key).and_then(non_empty)?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = %raw, "ignoring malformed value; using default");
            None
        }
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    env_str(key).and_then(non_empty).map(PathBuf::from)
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

//! Question catalog: load, validate and index the question set.
//!
//! The on-disk format is a JSON array of entries shaped like
//! `{"q": "...", "a": ["...", "..."], "correct": 1, "category": "...", "difficulty": "..."}`.
//! Each entry is validated on its own; a bad entry is logged and skipped, it
//! never fails the whole load.

use std::{
    collections::{BTreeSet, HashSet},
    fs,
    path::Path,
};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    domain::{FilterKind, Filters},
    errors::Error,
    Result,
};

pub const DEFAULT_CATEGORY: &str = "General";
pub const DEFAULT_DIFFICULTY: &str = "Normal";

/// A validated, immutable question.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionRecord {
    pub prompt: String,
    pub options: Vec<String>,
    pub correct: usize,
    pub category: String,
    pub difficulty: String,
}

impl QuestionRecord {
    pub fn correct_option(&self) -> &str {
        &self.options[self.correct]
    }
}

/// Wire shape of a catalog entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct RawQuestion {
    q: String,
    a: Vec<String>,
    correct: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    difficulty: Option<String>,
}

impl TryFrom<RawQuestion> for QuestionRecord {
    type Error = &'static str;

    fn try_from(raw: RawQuestion) -> std::result::Result<Self, Self::Error> {
        let prompt = raw.q.trim().to_string();
        if prompt.is_empty() {
            return Err("empty prompt");
        }
        if raw.a.len() < 2 {
            return Err("fewer than two options");
        }
        let correct = usize::try_from(raw.correct).map_err(|_| "negative correct index")?;
        if correct >= raw.a.len() {
            return Err("correct index out of bounds");
        }

        Ok(Self {
            prompt,
            options: raw.a,
            correct,
            category: label_or(raw.category, DEFAULT_CATEGORY),
            difficulty: label_or(raw.difficulty, DEFAULT_DIFFICULTY),
        })
    }
}

fn label_or(v: Option<String>, default: &str) -> String {
    v.map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Deduplicated set of valid questions.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    records: Vec<QuestionRecord>,
}

impl Catalog {
    /// Load the catalog from `path`.
    ///
    /// A missing file is replaced by the built-in set, which is also written to
    /// `path` for the next startup. A file that is not a JSON array is a config
    /// error. If no entry survives validation the built-in set is used.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(path = %path.display(), "catalog file missing; writing built-in questions");
            let txt = serde_json::to_string_pretty(&builtin_raw())?;
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, txt)?;
            return Ok(Self::builtin());
        }

        let txt = fs::read_to_string(path)?;
        let items: Vec<serde_json::Value> = serde_json::from_str(&txt).map_err(|e| {
            Error::Config(format!(
                "catalog {} is not a JSON array: {e}",
                path.display()
            ))
        })?;

        let catalog = Self::from_values(items);
        if catalog.is_empty() {
            warn!(path = %path.display(), "catalog has no valid questions; using built-in set");
            return Ok(Self::builtin());
        }

        info!(
            path = %path.display(),
            questions = catalog.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    /// Validate raw JSON entries, skipping (and logging) the ones that don't fit.
    pub fn from_values(items: Vec<serde_json::Value>) -> Self {
        let mut records = Vec::with_capacity(items.len());
        for (idx, item) in items.into_iter().enumerate() {
            let raw: RawQuestion = match serde_json::from_value(item) {
                Ok(r) => r,
                Err(e) => {
                    warn!(index = idx, error = %e, "skipping malformed catalog entry");
                    continue;
                }
            };
            match QuestionRecord::try_from(raw) {
                Ok(rec) => records.push(rec),
                Err(reason) => warn!(index = idx, reason, "skipping invalid catalog entry"),
            }
        }
        Self::from_records(records)
    }

    /// Build a catalog from already-validated records; later duplicates of a
    /// prompt are dropped.
    pub fn from_records(records: impl IntoIterator<Item = QuestionRecord>) -> Self {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for rec in records {
            if !seen.insert(rec.prompt.clone()) {
                warn!(prompt = %rec.prompt, "skipping duplicate question");
                continue;
            }
            out.push(rec);
        }
        Self { records: out }
    }

    pub fn builtin() -> Self {
        Self::from_records(
            builtin_raw()
                .into_iter()
                .filter_map(|r| QuestionRecord::try_from(r).ok()),
        )
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[QuestionRecord] {
        &self.records
    }

    /// Records matching every set filter (exact label match).
    pub fn filter(&self, filters: &Filters) -> Vec<&QuestionRecord> {
        self.records
            .iter()
            .filter(|r| {
                filters
                    .category
                    .as_deref()
                    .map_or(true, |c| r.category == c)
            })
            .filter(|r| {
                filters
                    .difficulty
                    .as_deref()
                    .map_or(true, |d| r.difficulty == d)
            })
            .collect()
    }

    pub fn categories(&self) -> Vec<String> {
        self.labels(FilterKind::Category)
    }

    pub fn difficulties(&self) -> Vec<String> {
        self.labels(FilterKind::Difficulty)
    }

    /// Distinct labels of `kind`, sorted.
    pub fn labels(&self, kind: FilterKind) -> Vec<String> {
        self.records
            .iter()
            .map(|r| match kind {
                FilterKind::Category => r.category.as_str(),
                FilterKind::Difficulty => r.difficulty.as_str(),
            })
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn has_label(&self, kind: FilterKind, value: &str) -> bool {
        self.records.iter().any(|r| match kind {
            FilterKind::Category => r.category == value,
            FilterKind::Difficulty => r.difficulty == value,
        })
    }

    /// Reject filters naming a label the catalog doesn't have.
    pub fn validate_filters(&self, filters: &Filters) -> Result<()> {
        for kind in [FilterKind::Category, FilterKind::Difficulty] {
            if let Some(value) = filters.get(kind) {
                if !self.has_label(kind, value) {
                    return Err(Error::InvalidFilter {
                        kind,
                        value: value.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

fn builtin_raw() -> Vec<RawQuestion> {
    fn q(prompt: &str, options: [&str; 4], correct: i64, cat: &str, diff: &str) -> RawQuestion {
        RawQuestion {
            q: prompt.to_string(),
            a: options.iter().map(|s| s.to_string()).collect(),
            correct,
            category: Some(cat.to_string()),
            difficulty: Some(diff.to_string()),
        }
    }

    vec![
        q("How many minutes are in an hour?", ["30", "45", "90", "60"], 3, "General", "Easy"),
        q(
            "What is the capital of Argentina?",
            ["La Plata", "Córdoba", "Buenos Aires", "Rosario"],
            2,
            "Geography",
            "Easy",
        ),
        q(
            "Which platform has Reels?",
            ["Twitch", "Reddit", "Twitter", "Instagram"],
            3,
            "Technology",
            "Easy",
        ),
        q(
            "Which metal is liquid at room temperature?",
            ["Iron", "Calcium", "Lead", "Mercury"],
            3,
            "Science",
            "Medium",
        ),
        q(
            "Which company created Android?",
            ["Apple", "Google", "Microsoft", "Nokia"],
            1,
            "Technology",
            "Medium",
        ),
        q(
            "Which universe is Iron Man from?",
            ["Marvel", "DC", "Image", "Dark Horse"],
            0,
            "Entertainment",
            "Easy",
        ),
        q(
            "Where was the Inca Empire centered?",
            ["Chile", "Peru", "Colombia", "Mexico"],
            1,
            "History",
            "Easy",
        ),
        q(
            "What was the Aztec capital?",
            ["Chan Chan", "Cusco", "Tikal", "Tenochtitlan"],
            3,
            "History",
            "Medium",
        ),
    ]
}

#[cfg(test)]
pub(crate) fn record(
    prompt: &str,
    options: &[&str],
    correct: usize,
    cat: &str,
    diff: &str,
) -> QuestionRecord {
    QuestionRecord {
        prompt: prompt.to_string(),
        options: options.iter().map(|s| s.to_string()).collect(),
        correct,
        category: cat.to_string(),
        difficulty: diff.to_string(),
    }
}

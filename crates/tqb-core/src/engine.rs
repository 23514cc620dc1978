//! Round engine: the entry points the chat adapter calls.
//!
//! Each user's calls are serialized by a per-user lock, so a user only ever
//! sees their own operations in order while different users run concurrently.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use rand::{rngs::StdRng, SeedableRng};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};

use crate::{
    catalog::Catalog,
    config::{EmptyPoolPolicy, GameConfig},
    domain::{FilterKind, Filters, RoundId, UserAccount, UserId},
    errors::Error,
    ledger::Ledger,
    ranking::{RankedEntry, Ranking},
    selector::{self, RoundQuestion},
    session::{AnswerTicket, QuestionView, Session, SessionStore},
    Result,
};

/// Result of a successful round start.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoundStarted {
    pub question: QuestionView,
    /// Questions in this round; lower than configured when the pool is small.
    pub total: usize,
    /// The filters matched nothing and the whole catalog was used instead.
    pub fell_back: bool,
    pub free_left: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoundSummary {
    pub score: u32,
    pub total: usize,
    pub bonus: i64,
    /// Cumulative total after this round was committed.
    pub new_total: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnswerOutcome {
    Next {
        correct: bool,
        question: QuestionView,
    },
    Finished {
        correct: bool,
        summary: RoundSummary,
    },
}

impl AnswerOutcome {
    pub fn correct(&self) -> bool {
        match self {
            AnswerOutcome::Next { correct, .. } | AnswerOutcome::Finished { correct, .. } => {
                *correct
            }
        }
    }
}

#[derive(Default)]
pub struct UserLocks {
    inner: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl UserLocks {
    pub async fn lock_user(&self, user: UserId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(user)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

pub struct QuizEngine {
    cfg: GameConfig,
    catalog: Arc<Catalog>,
    ledger: Arc<dyn Ledger>,
    ranking: Ranking,
    sessions: Mutex<SessionStore>,
    preferences: Mutex<HashMap<UserId, Filters>>,
    locks: UserLocks,
    next_round: AtomicU64,
    rng: std::sync::Mutex<StdRng>,
}

impl QuizEngine {
    pub fn new(cfg: GameConfig, catalog: Arc<Catalog>, ledger: Arc<dyn Ledger>) -> Self {
        Self::with_rng(cfg, catalog, ledger, StdRng::from_os_rng())
    }

    /// Same as [`QuizEngine::new`] with a caller-provided RNG (deterministic tests).
    pub fn with_rng(
        cfg: GameConfig,
        catalog: Arc<Catalog>,
        ledger: Arc<dyn Ledger>,
        rng: StdRng,
    ) -> Self {
        Self {
            cfg,
            catalog,
            ranking: Ranking::new(ledger.clone()),
            ledger,
            sessions: Mutex::new(SessionStore::default()),
            preferences: Mutex::new(HashMap::new()),
            locks: UserLocks::default(),
            next_round: AtomicU64::new(round_id_seed()),
            rng: std::sync::Mutex::new(rng),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.cfg
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn categories(&self) -> Vec<String> {
        self.catalog.categories()
    }

    pub fn difficulties(&self) -> Vec<String> {
        self.catalog.difficulties()
    }

    /// Account snapshot (after the daily reset).
    pub async fn account(&self, user: UserId, name: &str) -> Result<UserAccount> {
        let _guard = self.locks.lock_user(user).await;
        self.ledger.get_or_create(user, name)
    }

    /// Start a round with explicit filters.
    ///
    /// Checks run in order: filter labels, live round, allowance, pool. The
    /// free round is only spent once the questions are drawn, and the session
    /// is stored right after under the same user lock.
    pub async fn start_round(
        &self,
        user: UserId,
        name: &str,
        filters: Filters,
    ) -> Result<RoundStarted> {
        let _guard = self.locks.lock_user(user).await;

        self.catalog.validate_filters(&filters)?;
        if self.sessions.lock().await.contains(user) {
            return Err(Error::RoundInProgress);
        }

        let account = self.ledger.get_or_create(user, name)?;
        if account.free_left == 0 {
            return Err(Error::NoFreeRounds);
        }

        let (questions, fell_back) = self.draw_round(&filters)?;
        let bonus = if fell_back {
            0
        } else {
            self.cfg.bonus_for(filters.difficulty.as_deref())
        };

        let account = self.ledger.decrement_free_round(user, name)?;

        let round = RoundId(self.next_round.fetch_add(1, Ordering::Relaxed));
        let session = Session::new(round, account.display_name.clone(), bonus, questions);
        let question = session.view().ok_or(Error::EmptyPool)?;
        let total = session.total();
        self.sessions.lock().await.insert(user, session)?;

        info!(
            user = user.0,
            round = round.0,
            questions = total,
            fell_back,
            free_left = account.free_left,
            "round started"
        );

        Ok(RoundStarted {
            question,
            total,
            fell_back,
            free_left: account.free_left,
        })
    }

    /// Start a round with the user's saved filter preferences.
    pub async fn start_round_with_preferences(
        &self,
        user: UserId,
        name: &str,
    ) -> Result<RoundStarted> {
        let filters = self.filters(user).await;
        self.start_round(user, name, filters).await
    }

    /// Grade an answer and move the round forward.
    ///
    /// On the last question the score (plus bonus) is committed to the ledger
    /// before the session is dropped; if that write fails the session stays so
    /// the answer can be sent again.
    pub async fn submit_answer(&self, user: UserId, ticket: AnswerTicket) -> Result<AnswerOutcome> {
        let _guard = self.locks.lock_user(user).await;

        let mut session = self
            .sessions
            .lock()
            .await
            .take(user)
            .ok_or(Error::NoActiveRound)?;

        let correct = match session.grade(&ticket) {
            Ok(c) => c,
            Err(e) => {
                self.sessions.lock().await.restore(user, session);
                return Err(e);
            }
        };

        if !session.is_last() {
            session.advance(correct);
            let question = session.view().ok_or(Error::NoActiveRound)?;
            self.sessions.lock().await.restore(user, session);
            debug!(user = user.0, position = question.position, correct, "answer graded");
            return Ok(AnswerOutcome::Next { correct, question });
        }

        let score = session.score() + u32::from(correct);
        let bonus = session.bonus();
        let account = match self
            .ledger
            .add_points(user, session.display_name(), i64::from(score) + bonus)
        {
            Ok(a) => a,
            Err(e) => {
                self.sessions.lock().await.restore(user, session);
                return Err(e);
            }
        };

        let summary = RoundSummary {
            score,
            total: session.total(),
            bonus,
            new_total: account.total,
        };
        info!(
            user = user.0,
            round = session.round().0,
            score,
            total = summary.total,
            bonus,
            new_total = summary.new_total,
            "round finished"
        );

        Ok(AnswerOutcome::Finished { correct, summary })
    }

    /// Drop the user's live round without scoring it. The spent free round is not refunded.
    pub async fn abandon_round(&self, user: UserId) -> bool {
        let _guard = self.locks.lock_user(user).await;
        let dropped = self.sessions.lock().await.take(user);
        if let Some(s) = &dropped {
            info!(user = user.0, round = s.round().0, "round abandoned");
        }
        dropped.is_some()
    }

    /// The pending question of the user's live round, if any.
    pub async fn active_round(&self, user: UserId) -> Option<QuestionView> {
        self.sessions.lock().await.get(user).and_then(Session::view)
    }

    /// Grant the daily extra round; returns the new free-round count.
    pub async fn claim_daily(&self, user: UserId, name: &str) -> Result<u32> {
        let _guard = self.locks.lock_user(user).await;
        let account = self.ledger.claim_daily(user, name)?;
        info!(user = user.0, free_left = account.free_left, "daily bonus claimed");
        Ok(account.free_left)
    }

    pub fn ranking(&self, limit: usize) -> Result<Vec<RankedEntry>> {
        self.ranking.top(limit)
    }

    /// Update one filter preference. `None` clears it. Unknown labels are rejected.
    pub async fn set_filter(
        &self,
        user: UserId,
        kind: FilterKind,
        value: Option<String>,
    ) -> Result<Filters> {
        let value = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        if let Some(v) = &value {
            if !self.catalog.has_label(kind, v) {
                return Err(Error::InvalidFilter {
                    kind,
                    value: v.clone(),
                });
            }
        }

        let mut prefs = self.preferences.lock().await;
        let filters = prefs.entry(user).or_default();
        filters.set(kind, value);
        Ok(filters.clone())
    }

    pub async fn filters(&self, user: UserId) -> Filters {
        self.preferences
            .lock()
            .await
            .get(&user)
            .cloned()
            .unwrap_or_default()
    }

    fn draw_round(&self, filters: &Filters) -> Result<(Vec<RoundQuestion>, bool)> {
        let mut pool = self.catalog.filter(filters);
        let mut fell_back = false;

        if pool.is_empty() {
            match self.cfg.empty_pool_policy {
                EmptyPoolPolicy::Reject => return Err(Error::EmptyPool),
                EmptyPoolPolicy::FallbackToCatalog => {
                    pool = self.catalog.filter(&Filters::default());
                    fell_back = true;
                }
            }
        }
        if pool.is_empty() {
            return Err(Error::EmptyPool);
        }

        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        let questions = selector::draw(&pool, self.cfg.questions_per_round, &mut *rng);
        if questions.is_empty() {
            return Err(Error::EmptyPool);
        }
        Ok((questions, fell_back))
    }
}

/// Starting point for round ids. Random per process so buttons left over
/// from before a restart can't match a new round.
fn round_id_seed() -> u64 {
    // Top bit clear leaves room to count up without wrapping.
    rand::random::<u64>() >> 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::record,
        ledger::{JsonLedger, LedgerSettings, SqliteLedger},
        utils::ManualClock,
    };
    use std::collections::HashSet;

    const ANA: UserId = UserId(1);

    fn catalog() -> Arc<Catalog> {
        let mut recs = Vec::new();
        for i in 0..6 {
            let prompt = format!("easy science {i}");
            recs.push(record(&prompt, &["a", "b", "c", "d"], i % 4, "Science", "Easy"));
        }
        for i in 0..6 {
            let prompt = format!("hard history {i}");
            recs.push(record(&prompt, &["a", "b", "c"], i % 3, "History", "Hard"));
        }
        recs.push(record("easy history", &["a", "b"], 1, "History", "Easy"));
        Arc::new(Catalog::from_records(recs))
    }

    fn sqlite_ledger(clock: Arc<ManualClock>) -> Arc<dyn Ledger> {
        Arc::new(
            SqliteLedger::open(
                ":memory:",
                LedgerSettings {
                    daily_free_rounds: 3,
                    clock,
                },
            )
            .unwrap(),
        )
    }

    fn engine_with(cfg: GameConfig) -> (QuizEngine, Arc<dyn Ledger>) {
        let ledger = sqlite_ledger(Arc::new(ManualClock::new(1)));
        let engine =
            QuizEngine::with_rng(cfg, catalog(), ledger.clone(), StdRng::seed_from_u64(9));
        (engine, ledger)
    }

    fn engine() -> (QuizEngine, Arc<dyn Ledger>) {
        engine_with(GameConfig::default())
    }

    /// Test-side oracle: find the right option by re-reading the catalog.
    fn right_choice(engine: &QuizEngine, q: &QuestionView) -> usize {
        let rec = engine
            .catalog()
            .records()
            .iter()
            .find(|r| r.prompt == q.prompt)
            .unwrap();
        q.options
            .iter()
            .position(|o| o == rec.correct_option())
            .unwrap()
    }

    fn wrong_choice(engine: &QuizEngine, q: &QuestionView) -> usize {
        (right_choice(engine, q) + 1) % q.options.len()
    }

    fn ticket(q: &QuestionView, choice: usize) -> AnswerTicket {
        AnswerTicket {
            round: q.round,
            position: q.position,
            choice,
        }
    }

    async fn play_perfect(engine: &QuizEngine, user: UserId, first: QuestionView) -> RoundSummary {
        let mut q = first;
        loop {
            let choice = right_choice(engine, &q);
            match engine.submit_answer(user, ticket(&q, choice)).await.unwrap() {
                AnswerOutcome::Next { correct, question } => {
                    assert!(correct);
                    q = question;
                }
                AnswerOutcome::Finished { correct, summary } => {
                    assert!(correct);
                    return summary;
                }
            }
        }
    }

    #[tokio::test]
    async fn perfect_round_end_to_end() {
        let (engine, ledger) = engine();
        let started = engine.start_round(ANA, "Ana", Filters::default()).await.unwrap();
        assert_eq!(started.total, 5);
        assert_eq!(started.free_left, 2);
        assert!(!started.fell_back);
        assert_eq!(started.question.position, 0);

        // A second start while the round is live is rejected and costs nothing.
        let err = engine
            .start_round(ANA, "Ana", Filters::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RoundInProgress));
        assert_eq!(ledger.get_or_create(ANA, "Ana").unwrap().free_left, 2);

        let summary = play_perfect(&engine, ANA, started.question).await;
        assert_eq!(
            summary,
            RoundSummary {
                score: 5,
                total: 5,
                bonus: 0,
                new_total: 5
            }
        );

        let acc = ledger.get_or_create(ANA, "Ana").unwrap();
        assert_eq!(acc.total, 5);
        assert_eq!(acc.free_left, 2);
        assert!(engine.active_round(ANA).await.is_none());
    }

    #[tokio::test]
    async fn round_questions_are_distinct() {
        let (engine, _ledger) = engine();
        let started = engine.start_round(ANA, "Ana", Filters::default()).await.unwrap();

        let mut seen = HashSet::new();
        let mut q = started.question;
        loop {
            assert!(seen.insert(q.prompt.clone()), "repeated {}", q.prompt);
            let choice = wrong_choice(&engine, &q);
            match engine.submit_answer(ANA, ticket(&q, choice)).await.unwrap() {
                AnswerOutcome::Next { question, .. } => q = question,
                AnswerOutcome::Finished { summary, .. } => {
                    assert_eq!(summary.score, 0);
                    break;
                }
            }
        }
        assert_eq!(seen.len(), 5);
    }

    #[tokio::test]
    async fn difficulty_bonus_applies_once_at_commit() {
        let (engine, ledger) = engine();
        let filters = Filters::new(Some("History"), Some("Hard"));
        let started = engine.start_round(ANA, "Ana", filters).await.unwrap();

        let summary = play_perfect(&engine, ANA, started.question).await;
        assert_eq!(summary.score, 5);
        assert_eq!(summary.bonus, 3);
        assert_eq!(summary.new_total, 8);
        assert_eq!(ledger.get_or_create(ANA, "Ana").unwrap().total, 8);
    }

    #[tokio::test]
    async fn short_pool_is_reported_in_total() {
        let (engine, _ledger) = engine();
        let started = engine
            .start_round(ANA, "Ana", Filters::new(Some("History"), Some("Easy")))
            .await
            .unwrap();
        assert_eq!(started.total, 1);
        assert_eq!(started.question.total, 1);

        let choice = right_choice(&engine, &started.question);
        let out = engine
            .submit_answer(ANA, ticket(&started.question, choice))
            .await
            .unwrap();
        match out {
            AnswerOutcome::Finished { summary, .. } => {
                assert_eq!((summary.score, summary.total, summary.bonus), (1, 1, 1));
            }
            other => panic!("expected finish, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_pool_rejects_without_spending() {
        let (engine, ledger) = engine();
        // Both labels exist, but not together.
        let filters = Filters::new(Some("Science"), Some("Hard"));
        let err = engine.start_round(ANA, "Ana", filters).await.unwrap_err();
        assert!(matches!(err, Error::EmptyPool));
        assert_eq!(ledger.get_or_create(ANA, "Ana").unwrap().free_left, 3);
        assert!(engine.active_round(ANA).await.is_none());
    }

    #[tokio::test]
    async fn empty_pool_fallback_uses_whole_catalog() {
        let (engine, _ledger) = engine_with(GameConfig {
            empty_pool_policy: EmptyPoolPolicy::FallbackToCatalog,
            ..GameConfig::default()
        });
        let started = engine
            .start_round(ANA, "Ana", Filters::new(Some("Science"), Some("Hard")))
            .await
            .unwrap();
        assert!(started.fell_back);
        assert_eq!(started.total, 5);

        let summary = play_perfect(&engine, ANA, started.question).await;
        assert_eq!(summary.bonus, 0);
    }

    #[tokio::test]
    async fn unknown_filter_label_is_invalid() {
        let (engine, _ledger) = engine();
        let err = engine
            .start_round(ANA, "Ana", Filters::new(Some("Sports"), None))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidFilter {
                kind: FilterKind::Category,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn no_free_rounds_after_allowance_is_spent() {
        let (engine, ledger) = engine();
        for _ in 0..3 {
            engine.start_round(ANA, "Ana", Filters::default()).await.unwrap();
            assert!(engine.abandon_round(ANA).await);
        }
        let err = engine
            .start_round(ANA, "Ana", Filters::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoFreeRounds));

        // The daily chest buys one more.
        assert_eq!(engine.claim_daily(ANA, "Ana").await.unwrap(), 1);
        assert!(matches!(
            engine.claim_daily(ANA, "Ana").await,
            Err(Error::AlreadyClaimed)
        ));
        assert_eq!(ledger.get_or_create(ANA, "Ana").unwrap().free_left, 1);
        engine.start_round(ANA, "Ana", Filters::default()).await.unwrap();
    }

    #[tokio::test]
    async fn answers_without_round_or_with_stale_ticket_are_rejected() {
        let (engine, ledger) = engine();
        let bogus = AnswerTicket {
            round: RoundId(99),
            position: 0,
            choice: 0,
        };
        assert!(matches!(
            engine.submit_answer(ANA, bogus).await,
            Err(Error::NoActiveRound)
        ));

        let started = engine.start_round(ANA, "Ana", Filters::default()).await.unwrap();
        let q = started.question;
        assert!(matches!(
            engine.submit_answer(ANA, bogus).await,
            Err(Error::SessionMismatch)
        ));

        let choice = right_choice(&engine, &q);
        let first = engine.submit_answer(ANA, ticket(&q, choice)).await.unwrap();
        assert!(first.correct());

        // Same button pressed again: already consumed.
        assert!(matches!(
            engine.submit_answer(ANA, ticket(&q, choice)).await,
            Err(Error::SessionMismatch)
        ));

        // Nothing double counted: finishing with all wrong answers scores 1.
        let mut next = match first {
            AnswerOutcome::Next { question, .. } => question,
            other => panic!("unexpected {other:?}"),
        };
        let summary = loop {
            let choice = wrong_choice(&engine, &next);
            match engine.submit_answer(ANA, ticket(&next, choice)).await.unwrap() {
                AnswerOutcome::Next { question, .. } => next = question,
                AnswerOutcome::Finished { summary, .. } => break summary,
            }
        };
        assert_eq!(summary.score, 1);
        assert_eq!(ledger.get_or_create(ANA, "Ana").unwrap().total, 1);

        // Another user's ticket can't touch Ana's next round.
        let started = engine.start_round(ANA, "Ana", Filters::default()).await.unwrap();
        let bob = UserId(2);
        assert!(matches!(
            engine.submit_answer(bob, ticket(&started.question, 0)).await,
            Err(Error::NoActiveRound)
        ));
        engine.start_round(bob, "Bob", Filters::default()).await.unwrap();
        assert!(matches!(
            engine.submit_answer(bob, ticket(&started.question, 0)).await,
            Err(Error::SessionMismatch)
        ));
    }

    #[tokio::test]
    async fn buttons_from_before_a_restart_are_rejected() {
        let ledger = sqlite_ledger(Arc::new(ManualClock::new(1)));
        let fresh_engine = || {
            QuizEngine::with_rng(
                GameConfig::default(),
                catalog(),
                ledger.clone(),
                StdRng::seed_from_u64(9),
            )
        };

        let before = fresh_engine();
        let old = before
            .start_round(ANA, "Ana", Filters::default())
            .await
            .unwrap()
            .question;
        drop(before);

        let after = fresh_engine();
        let new = after
            .start_round(ANA, "Ana", Filters::default())
            .await
            .unwrap()
            .question;
        assert_ne!(old.round, new.round);

        for choice in 0..old.options.len() {
            assert!(matches!(
                after.submit_answer(ANA, ticket(&old, choice)).await,
                Err(Error::SessionMismatch)
            ));
        }
        assert_eq!(after.active_round(ANA).await.unwrap(), new);
    }

    #[tokio::test]
    async fn concurrent_duplicate_answers_count_once() {
        let (engine, _ledger) = engine();
        let engine = Arc::new(engine);
        let started = engine.start_round(ANA, "Ana", Filters::default()).await.unwrap();
        let q = started.question;
        let t = ticket(&q, right_choice(&engine, &q));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let engine = engine.clone();
                tokio::spawn(async move { engine.submit_answer(ANA, t).await })
            })
            .collect();

        let mut accepted = 0;
        for h in handles {
            match h.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(Error::SessionMismatch) => {}
                Err(e) => panic!("unexpected error {e}"),
            }
        }
        assert_eq!(accepted, 1);
        assert_eq!(engine.active_round(ANA).await.unwrap().position, 1);
    }

    #[tokio::test]
    async fn failed_commit_keeps_the_round() {
        let path = std::env::temp_dir().join(format!("tqb-engine-commit-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&path);
        let _ = std::fs::remove_file(&path);
        let ledger: Arc<dyn Ledger> = Arc::new(
            JsonLedger::open(
                &path,
                LedgerSettings {
                    daily_free_rounds: 3,
                    clock: Arc::new(ManualClock::new(1)),
                },
            )
            .unwrap(),
        );
        let engine = QuizEngine::with_rng(
            GameConfig {
                questions_per_round: 1,
                ..GameConfig::default()
            },
            catalog(),
            ledger.clone(),
            StdRng::seed_from_u64(3),
        );

        let started = engine.start_round(ANA, "Ana", Filters::default()).await.unwrap();
        let q = started.question;
        let choice = right_choice(&engine, &q);

        // Block the ledger file with a directory so the commit can't be written.
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir_all(path.join("blocker")).unwrap();
        assert!(engine.submit_answer(ANA, ticket(&q, choice)).await.is_err());
        assert_eq!(engine.active_round(ANA).await.unwrap().position, 0);

        // Unblock and retry the same answer.
        std::fs::remove_dir_all(&path).unwrap();
        match engine.submit_answer(ANA, ticket(&q, choice)).await.unwrap() {
            AnswerOutcome::Finished { summary, .. } => assert_eq!(summary.new_total, 1),
            other => panic!("unexpected {other:?}"),
        }

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn filter_preferences() {
        let (engine, _ledger) = engine();
        assert!(engine.filters(ANA).await.is_empty());

        let f = engine
            .set_filter(ANA, FilterKind::Difficulty, Some("Hard".into()))
            .await
            .unwrap();
        assert_eq!(f.difficulty.as_deref(), Some("Hard"));

        assert!(matches!(
            engine
                .set_filter(ANA, FilterKind::Category, Some("Sports".into()))
                .await,
            Err(Error::InvalidFilter { .. })
        ));

        let f = engine
            .set_filter(ANA, FilterKind::Category, Some("History".into()))
            .await
            .unwrap();
        assert_eq!(f, Filters::new(Some("History"), Some("Hard")));

        let started = engine.start_round_with_preferences(ANA, "Ana").await.unwrap();
        assert!(started.question.prompt.starts_with("hard history"));
        engine.abandon_round(ANA).await;

        let f = engine.set_filter(ANA, FilterKind::Category, None).await.unwrap();
        assert_eq!(f, Filters::new(None, Some("Hard")));
    }

    #[tokio::test]
    async fn ranking_reads_committed_totals() {
        let (engine, ledger) = engine();
        ledger.add_points(UserId(10), "ten", 10).unwrap();
        ledger.add_points(UserId(30), "thirty", 30).unwrap();
        ledger.add_points(UserId(20), "twenty", 20).unwrap();

        let totals: Vec<i64> = engine.ranking(10).unwrap().iter().map(|e| e.total).collect();
        assert_eq!(totals, vec![30, 20, 10]);
    }
}

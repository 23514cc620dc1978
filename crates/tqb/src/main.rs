use std::sync::Arc;

use tracing::info;

use tqb_core::{
    catalog::Catalog,
    config::{Config, LedgerBackend},
    engine::QuizEngine,
    ledger::{JsonLedger, Ledger, LedgerSettings, SqliteLedger},
    utils::SystemClock,
};

fn open_ledger(cfg: &Config) -> Result<Arc<dyn Ledger>, tqb_core::Error> {
    let settings = LedgerSettings {
        daily_free_rounds: cfg.game.free_rounds_per_day,
        clock: Arc::new(SystemClock),
    };
    let ledger: Arc<dyn Ledger> = match cfg.ledger_backend {
        LedgerBackend::Json => Arc::new(JsonLedger::open(&cfg.ledger_file, settings)?),
        LedgerBackend::Sqlite => Arc::new(SqliteLedger::open(&cfg.ledger_file, settings)?),
    };
    info!(
        backend = ?cfg.ledger_backend,
        path = %cfg.ledger_file.display(),
        "ledger opened"
    );
    Ok(ledger)
}

#[tokio::main]
async fn main() -> Result<(), tqb_core::Error> {
    tqb_core::logging::init("tqb")?;

    let cfg = Arc::new(Config::load()?);

    let catalog = Catalog::load(&cfg.catalog_file).map_err(|e| {
        tqb_core::Error::Config(format!(
            "failed to load catalog {}: {e}",
            cfg.catalog_file.display()
        ))
    })?;
    info!(questions = catalog.len(), path = %cfg.catalog_file.display(), "catalog loaded");

    let ledger = open_ledger(&cfg)?;
    let engine = Arc::new(QuizEngine::new(cfg.game.clone(), Arc::new(catalog), ledger));

    tqb_telegram::router::run_polling(cfg, engine)
        .await
        .map_err(|e| tqb_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}

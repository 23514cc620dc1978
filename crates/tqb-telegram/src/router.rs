use std::{collections::HashMap, sync::Arc};

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, warn};

use tqb_core::{config::Config, engine::QuizEngine};

use crate::handlers;
use crate::Replier;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub engine: Arc<QuizEngine>,
    pub replier: Replier,
    pub chat_locks: Arc<ChatLocks>,
}

#[derive(Default)]
pub struct ChatLocks {
    inner: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl ChatLocks {
    pub async fn lock_chat(&self, chat_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(chat_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

pub async fn run_polling(cfg: Arc<Config>, engine: Arc<QuizEngine>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    match bot.get_me().await {
        Ok(me) => info!(username = %me.username(), id = me.id.0, "connected to telegram"),
        Err(e) => warn!(error = %e, "get_me failed; starting dispatcher anyway"),
    }
    info!(
        questions = engine.catalog().len(),
        categories = engine.categories().len(),
        "catalog ready"
    );

    let state = Arc::new(AppState {
        cfg,
        engine,
        replier: Replier::new(bot.clone()),
        chat_locks: Arc::new(ChatLocks::default()),
    });

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn chat_lock_serializes_same_chat() {
        let locks = Arc::new(ChatLocks::default());
        let guard = locks.lock_chat(1).await;

        let l = locks.clone();
        let waiter = tokio::spawn(async move {
            let _g = l.lock_chat(1).await;
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        // Other chats are not blocked.
        let _other = locks.lock_chat(2).await;

        drop(guard);
        waiter.await.unwrap();
    }
}

//! Core of the trivia quiz bot.
//!
//! Framework-agnostic: question catalog, round drawing, per-user sessions,
//! the persistent score ledger and the leaderboard. Chat adapters live in
//! their own crates and only talk to [`engine::QuizEngine`].

pub mod catalog;
pub mod config;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod ledger;
pub mod logging;
pub mod ranking;
pub mod selector;
pub mod session;
pub mod utils;

pub use errors::{Error, Result};

#![warn(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Conversation state that survives between invocations.
//!
//! # Key Features
//! - JSON history file replaced atomically on every save
//! - Turn-count trimming with an optional pinned system turn
//! - Rollback of the user turn when a request fails
//! - Interactive loop with `exit` and `/reset` commands

mod controller;
mod history;
mod repl;
mod store;

pub use controller::{SessionController, TurnError};
pub use history::TrimPolicy;
pub use repl::{RESET_DONE, Repl, ReplCommand, WELCOME};
pub use store::{HistoryError, HistoryStore};

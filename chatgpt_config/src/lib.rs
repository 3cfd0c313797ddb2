#![deny(
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

mod schema;

pub use schema::{
    API_KEY_VAR, BASE_URL_VAR, CONFIG_PATH_VAR, Config, ConfigError, ConfigFile, DEFAULT_BASE_URL,
    DEFAULT_MAX_TURNS, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS, HISTORY_PATH_VAR, MAX_TURNS_VAR,
    MODEL_VAR, SYSTEM_PROMPT_VAR, TIMEOUT_SECS_VAR,
};

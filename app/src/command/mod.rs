//! Static strategy pattern for CLI modes.
//!
//! Each invocation mode is a separate strategy with its own input type, so
//! `main` only resolves the mode and dispatches.

use chatgpt_config::{Config, ConfigError};
use chatgpt_conversation::{HistoryStore, SessionController, TrimPolicy};
use chatgpt_providers::OpenAiClient;
use std::time::Duration;
use tracing::info;

mod prompt;
mod repl;
mod reset;

pub use prompt::{PromptInput, PromptStrategy};
pub use repl::ReplStrategy;
pub use reset::ResetStrategy;

fn history_store(config: &Config) -> HistoryStore {
    HistoryStore::new(config.history_path.clone(), TrimPolicy::from_config(config))
}

/// Build the controller shared by the one-shot and interactive modes.
///
/// Fails before any request when the credential is missing.
fn init_session(config: &Config) -> Result<SessionController<OpenAiClient>, ConfigError> {
    let client = OpenAiClient::from_config(config)?;
    info!("History path: {}", config.history_path.display());

    let retry_delays = config
        .retry_delays_secs
        .iter()
        .copied()
        .map(Duration::from_secs)
        .collect();

    Ok(SessionController::new(client, history_store(config)).with_retry_delays(retry_delays))
}

/// Core trait defining the contract for all command strategies.
pub trait CommandStrategy {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    ///
    /// # Errors
    /// Returns an error if command execution fails.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}

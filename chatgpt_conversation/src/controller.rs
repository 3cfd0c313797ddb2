//! One request/response cycle per call.
//!
//! The controller owns the in-memory history; the shell only ever goes
//! through it, so `/reset` and normal turns see the same state.

use chatgpt_core::{CompletionClient, CompletionError, Turn};
use chatgpt_providers::retry_with_backoff;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::store::{HistoryError, HistoryStore};

/// A turn that produced no reply. `Display` is the message shown to the user.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error(
        "Rate limit reached: {message}. Wait a moment and try again, or check your plan and usage limits."
    )]
    RateLimit { message: String },

    #[error("Network error: {0}. Check your connection and try again.")]
    Network(String),

    #[error("The API rejected the request (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected response from the API: {0}")]
    MalformedResponse(String),

    #[error("Nothing to send: the message is empty")]
    EmptyInput,

    #[error(transparent)]
    History(#[from] HistoryError),
}

impl From<CompletionError> for TurnError {
    fn from(e: CompletionError) -> Self {
        match e {
            CompletionError::RateLimit { message } => Self::RateLimit { message },
            CompletionError::Network(message) => Self::Network(message),
            CompletionError::Api { status, message } => Self::Api { status, message },
            CompletionError::MalformedResponse(message) => Self::MalformedResponse(message),
        }
    }
}

pub struct SessionController<C> {
    client: C,
    store: HistoryStore,
    history: Vec<Turn>,
    retry_delays: Vec<Duration>,
}

impl<C> SessionController<C>
where
    C: CompletionClient,
{
    /// Load the stored history and get ready for the first turn.
    pub fn new(client: C, store: HistoryStore) -> Self {
        let history = store.load();
        info!(
            "Session ready: model={}, {} turns loaded",
            client.model(),
            history.len()
        );

        Self {
            client,
            store,
            history,
            retry_delays: vec![Duration::from_secs(2)],
        }
    }

    /// Set the wait before each retry of a transient failure.
    #[must_use]
    pub fn with_retry_delays(mut self, delays: Vec<Duration>) -> Self {
        self.retry_delays = delays;
        self
    }

    /// Send `user_text` with the conversation so far and record the reply.
    ///
    /// On failure the history, in memory and on disk, is left exactly as it
    /// was before the call.
    pub async fn run_turn(&mut self, user_text: &str) -> Result<String, TurnError> {
        let text = user_text.trim();
        if text.is_empty() {
            return Err(TurnError::EmptyInput);
        }

        let snapshot = self.history.clone();
        self.history.push(Turn::user(text));
        self.store.policy().apply(&mut self.history);
        debug!("Sending {} turns", self.history.len());

        let client = &self.client;
        let turns = &self.history;
        let result = retry_with_backoff(
            || client.complete(turns),
            &self.retry_delays,
            CompletionError::is_transient,
        )
        .await;

        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Turn failed, rolling back: {e}");
                self.history = snapshot;
                return Err(e.into());
            }
        };

        self.history.push(Turn::assistant(reply.clone()));
        self.store.policy().apply(&mut self.history);

        if let Err(e) = self.store.save(&self.history) {
            warn!("Reply received but history was not saved: {e}");
        }

        Ok(reply)
    }

    /// Clear the conversation, keeping only the pinned system turn.
    pub fn reset(&mut self) -> Result<(), TurnError> {
        self.history = self.store.reset()?;
        Ok(())
    }

    #[must_use]
    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    #[must_use]
    pub const fn store(&self) -> &HistoryStore {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::TrimPolicy;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails with a network error `failures` times, then echoes the last turn.
    struct FlakyClient {
        failures: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionClient for FlakyClient {
        async fn complete(&self, turns: &[Turn]) -> Result<String, CompletionError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(CompletionError::Network("connection reset".to_string()));
            }
            Ok(format!("echo: {}", turns.last().map_or("", Turn::content)))
        }

        fn model(&self) -> &str {
            "flaky"
        }
    }

    fn controller(
        dir: &tempfile::TempDir,
        failures: usize,
    ) -> SessionController<FlakyClient> {
        let store = HistoryStore::new(dir.path().join("history.json"), TrimPolicy::new(60));
        SessionController::new(
            FlakyClient {
                failures,
                calls: AtomicUsize::new(0),
            },
            store,
        )
        .with_retry_delays(vec![Duration::ZERO])
    }

    #[tokio::test]
    async fn transient_failure_is_retried_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = controller(&dir, 1);

        let reply = controller.run_turn("hello").await.unwrap();

        assert_eq!(reply, "echo: hello");
        assert_eq!(controller.client.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn persistent_failure_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = controller(&dir, 5);

        let err = controller.run_turn("hello").await.unwrap_err();

        assert!(matches!(err, TurnError::Network(_)));
        assert!(controller.history().is_empty());
        assert!(!controller.store().path().exists());
    }

    #[tokio::test]
    async fn blank_input_is_rejected_without_a_call() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = controller(&dir, 0);

        let err = controller.run_turn("  \n").await.unwrap_err();

        assert!(matches!(err, TurnError::EmptyInput));
        assert_eq!(controller.client.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn rate_limit_message_includes_guidance() {
        let err = TurnError::from(CompletionError::RateLimit {
            message: "Too many requests".to_string(),
        });
        let rendered = err.to_string();
        assert!(rendered.contains("Too many requests"));
        assert!(rendered.contains("try again"));
    }
}

//! Single request/response cycle from arguments or piped stdin.

use chatgpt_config::Config;
use tracing::info;

/// Input parameters for the one-shot strategy.
#[derive(Debug, Clone)]
pub struct PromptInput {
    pub config: Config,
    /// Already trimmed, never empty
    pub prompt: String,
}

/// Strategy for sending one prompt and printing the reply.
///
/// A failed request is returned as an error so the process exits non-zero.
#[derive(Debug, Clone, Copy)]
pub struct PromptStrategy;

impl super::CommandStrategy for PromptStrategy {
    type Input = PromptInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let mut session = super::init_session(&input.config)?;

        let reply = session.run_turn(&input.prompt).await?;
        println!("{reply}");

        info!("One-shot turn completed");
        Ok(())
    }
}

use chatgpt_config::Config;
use chatgpt_conversation::RESET_DONE;

/// Strategy for clearing the saved conversation.
///
/// Needs no credential and makes no request.
#[derive(Debug, Clone, Copy)]
pub struct ResetStrategy;

impl super::CommandStrategy for ResetStrategy {
    type Input = Config;

    async fn execute(&self, config: Self::Input) -> anyhow::Result<()> {
        super::history_store(&config).reset()?;
        println!("{RESET_DONE}");
        Ok(())
    }
}

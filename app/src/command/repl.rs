use chatgpt_config::Config;
use chatgpt_conversation::Repl;

/// Strategy for the interactive loop on a terminal.
#[derive(Debug, Clone, Copy)]
pub struct ReplStrategy;

impl super::CommandStrategy for ReplStrategy {
    type Input = Config;

    async fn execute(&self, config: Self::Input) -> anyhow::Result<()> {
        let mut session = super::init_session(&config)?;

        let stdin = std::io::stdin();
        Repl::new(&mut session)
            .run(stdin.lock(), std::io::stdout(), std::io::stderr())
            .await?;
        Ok(())
    }
}

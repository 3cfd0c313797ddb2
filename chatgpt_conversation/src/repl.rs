//! Interactive read-turn-print loop.

use chatgpt_core::CompletionClient;
use std::io::{self, BufRead, Write};
use tracing::info;

use crate::controller::SessionController;

pub const WELCOME: &str = "Welcome to the terminal of GPT (to quit -> 'exit')";
pub const RESET_DONE: &str = "History cleared.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Exit,
    Reset,
    Skip,
    Prompt(String),
}

impl ReplCommand {
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Skip;
        }
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            return Self::Exit;
        }
        if line == "/reset" {
            return Self::Reset;
        }
        Self::Prompt(line.to_string())
    }
}

pub struct Repl<'a, C> {
    controller: &'a mut SessionController<C>,
}

impl<'a, C> Repl<'a, C>
where
    C: CompletionClient,
{
    pub const fn new(controller: &'a mut SessionController<C>) -> Self {
        Self { controller }
    }

    /// Read lines from `input` until `exit` or end of input.
    ///
    /// Replies go to `output`; failures go to `errors` and the loop keeps
    /// going.
    pub async fn run<R, W, E>(self, mut input: R, mut output: W, mut errors: E) -> io::Result<()>
    where
        R: BufRead,
        W: Write,
        E: Write,
    {
        writeln!(output, "{WELCOME}")?;

        loop {
            write!(output, "> ")?;
            output.flush()?;

            // Invalid UTF-8 is replaced, not fatal.
            let mut raw = Vec::new();
            if input.read_until(b'\n', &mut raw)? == 0 {
                writeln!(output)?;
                break;
            }
            let line = String::from_utf8_lossy(&raw);

            match ReplCommand::parse(&line) {
                ReplCommand::Skip => {}
                ReplCommand::Exit => break,
                ReplCommand::Reset => match self.controller.reset() {
                    Ok(()) => writeln!(output, "{RESET_DONE}")?,
                    Err(e) => writeln!(errors, "Error: {e}")?,
                },
                ReplCommand::Prompt(prompt) => match self.controller.run_turn(&prompt).await {
                    Ok(reply) => writeln!(output, "{reply}\n")?,
                    Err(e) => writeln!(errors, "Error: {e}")?,
                },
            }
        }

        info!(
            "Interactive session ended with {} turns in history",
            self.controller.history().len()
        );
        Ok(())
    }
}

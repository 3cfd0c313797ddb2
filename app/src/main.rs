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

use chatgpt_config::{Config, ConfigError};
use clap::Parser;
use std::io::{IsTerminal, Read};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod command;
mod mode;

use command::{CommandStrategy, PromptInput, PromptStrategy, ReplStrategy, ResetStrategy};
use mode::{Mode, USAGE};

#[derive(Parser)]
#[command(name = "chatgpt", version)]
#[command(about = "Chat with an OpenAI model from the terminal", long_about = None)]
struct Cli {
    /// Clear the saved conversation history and exit
    #[arg(long)]
    reset: bool,

    /// Model to use for this invocation (overrides OPENAI_MODEL)
    #[arg(short = 'M', long)]
    model: Option<String>,

    /// Log progress to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Prompt to send; words are joined with spaces
    #[arg(trailing_var_arg = true)]
    prompt: Vec<String>,
}

fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn read_piped_stdin() -> anyhow::Result<Option<String>> {
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut raw = Vec::new();
    stdin.lock().read_to_end(&mut raw)?;
    debug!("Read {} bytes from stdin", raw.len());
    Ok(Some(String::from_utf8_lossy(&raw).into_owned()))
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    // Clearing history must still work when other settings are broken.
    let config = if cli.reset {
        Config::load_for_reset()?
    } else {
        Config::load()?
    }
    .with_model(cli.model);
    debug!("Resolved config: {config:?}");

    let piped = if cli.reset { None } else { read_piped_stdin()? };

    match mode::resolve(cli.reset, &cli.prompt, piped.as_deref()) {
        Mode::Reset => ResetStrategy.execute(config).await?,
        Mode::OneShot(prompt) => {
            info!("One-shot mode");
            PromptStrategy
                .execute(PromptInput { config, prompt })
                .await?;
        }
        Mode::Interactive => {
            info!("Interactive mode");
            ReplStrategy.execute(config).await?;
        }
        Mode::Usage => {
            eprintln!("{USAGE}");
            return Ok(ExitCode::from(2));
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            if let Some(hint) = e.downcast_ref::<ConfigError>().and_then(ConfigError::hint) {
                eprintln!("{hint}");
            }
            ExitCode::FAILURE
        }
    }
}

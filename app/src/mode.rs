//! Invocation mode resolution.

pub const USAGE: &str = r#"Usage:
  chatgpt "Your question here"
  chatgpt explain bfs
  cat file.txt | chatgpt
  chatgpt --reset"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Clear history and exit.
    Reset,
    /// Send one prompt, print the reply, exit.
    OneShot(String),
    /// Read prompts from the terminal until `exit`.
    Interactive,
    /// Stdin was piped but carried nothing to send.
    Usage,
}

/// Decide what to do with this invocation.
///
/// `piped` holds the whole of stdin when it is not a terminal.
#[must_use]
pub fn resolve(reset: bool, args: &[String], piped: Option<&str>) -> Mode {
    if reset {
        return Mode::Reset;
    }

    if let Some(text) = piped.map(str::trim).filter(|t| !t.is_empty()) {
        return Mode::OneShot(text.to_string());
    }

    let joined = args.join(" ");
    let joined = joined.trim();
    if !joined.is_empty() {
        return Mode::OneShot(joined.to_string());
    }

    if piped.is_some() {
        Mode::Usage
    } else {
        Mode::Interactive
    }
}

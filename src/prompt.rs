// Interactive yes/no confirmation
use crate::error::{KeeError, Result};
use std::io::{self, BufRead, IsTerminal, Write};

#[cfg_attr(test, mockall::automock)]
pub trait Confirm {
    /// Ask a yes/no question; anything but "y"/"yes" is a no
    fn confirm(&self, question: &str) -> Result<bool>;
}

/// Prompts on stdout and reads the answer from stdin.
///
/// Without a terminal there is nobody to answer, so the question fails with
/// `ConfirmationRequired` instead of silently counting as a no.
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, question: &str) -> Result<bool> {
        let stdin = io::stdin();
        ask(question, stdin.is_terminal(), &mut stdin.lock())
    }
}

fn ask(question: &str, interactive: bool, input: &mut dyn BufRead) -> Result<bool> {
    if !interactive {
        tracing::debug!("stdin is not a terminal, cannot ask: {}", question);
        return Err(KeeError::ConfirmationRequired("--yes".to_string()));
    }

    print!("\n {} (y/N): ", question);
    io::stdout().flush()?;

    let mut response = String::new();
    input.read_line(&mut response)?;
    Ok(is_yes(&response))
}

/// Skips the question and answers yes, for `--yes`
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, question: &str) -> Result<bool> {
        tracing::debug!("Assuming yes: {}", question);
        Ok(true)
    }
}

fn is_yes(response: &str) -> bool {
    let response = response.trim();
    response.eq_ignore_ascii_case("y") || response.eq_ignore_ascii_case("yes")
}

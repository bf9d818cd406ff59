// External AWS CLI invocations
use crate::error::{KeeError, Result};
use std::io;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};

/// The three AWS CLI operations kee delegates to.
///
/// Each returns whether the command exited successfully; `Err` only when the
/// program could not be run at all.
#[cfg_attr(test, mockall::automock)]
pub trait AwsCli {
    /// `aws configure sso --profile <profile>`, interactive, inherits the terminal
    fn configure_sso(&self, profile: &str) -> Result<bool>;

    /// `aws sts get-caller-identity --profile <profile>`, silent
    fn caller_identity(&self, profile: &str) -> Result<bool>;

    /// `aws sso login --profile <profile>`, interactive, may open a browser
    fn sso_login(&self, profile: &str) -> Result<bool>;
}

/// Runs the real AWS CLI binary
pub struct SystemAwsCli {
    program: String,
    config_file: Option<PathBuf>,
}

impl SystemAwsCli {
    pub fn new(program: impl Into<String>, config_file: Option<PathBuf>) -> Self {
        Self {
            program: program.into(),
            config_file,
        }
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut command = Command::new(&self.program);
        command.args(args);
        if let Some(file) = &self.config_file {
            command.env("AWS_CONFIG_FILE", file);
        }
        command
    }

    fn run(&self, mut command: Command, description: &str) -> Result<ExitStatus> {
        tracing::debug!("Running {} ({:?})", description, command);
        let status = command.status().map_err(|e| self.spawn_error(e))?;
        tracing::debug!("{} exited with {}", description, status);
        Ok(status)
    }

    fn spawn_error(&self, error: io::Error) -> KeeError {
        if error.kind() == io::ErrorKind::NotFound {
            KeeError::ExternalCommand(format!(
                "AWS CLI '{}' not found. Install AWS CLI v2 or set KEE_AWS_CLI",
                self.program
            ))
        } else {
            KeeError::ExternalCommand(format!("Could not run '{}': {}", self.program, error))
        }
    }
}

impl AwsCli for SystemAwsCli {
    fn configure_sso(&self, profile: &str) -> Result<bool> {
        let command = self.command(&["configure", "sso", "--profile", profile]);
        Ok(self.run(command, "aws configure sso")?.success())
    }

    fn caller_identity(&self, profile: &str) -> Result<bool> {
        let mut command = self.command(&["sts", "get-caller-identity", "--profile", profile]);
        command
            .env("AWS_CLI_AUTO_PROMPT", "off")
            .env("AWS_PAGER", "")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        Ok(self.run(command, "aws sts get-caller-identity")?.success())
    }

    fn sso_login(&self, profile: &str) -> Result<bool> {
        let command = self.command(&["sso", "login", "--profile", profile]);
        Ok(self.run(command, "aws sso login")?.success())
    }
}

// Sub-shell sessions
use crate::env::{ACCOUNT_VAR, ACTIVE_VAR, PROFILE_VAR};
use crate::error::{KeeError, Result};
use std::path::Path;
use std::process::Command;

/// Everything needed to start one account's sub-shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSpec {
    pub account_name: String,
    pub profile_name: String,
    pub shell: String,
    /// Variables set on the child only; the parent environment is never touched
    pub vars: Vec<(String, String)>,
}

impl SessionSpec {
    pub fn new(
        account_name: &str,
        profile_name: &str,
        shell: String,
        prompt_prefix: &str,
        inherited_prompt: Option<&str>,
        aws_config_file: Option<&Path>,
    ) -> Self {
        let mut vars = vec![
            (PROFILE_VAR.to_string(), profile_name.to_string()),
            (ACCOUNT_VAR.to_string(), account_name.to_string()),
            (ACTIVE_VAR.to_string(), "1".to_string()),
        ];

        if let Some(file) = aws_config_file {
            vars.push((
                "AWS_CONFIG_FILE".to_string(),
                file.to_string_lossy().into_owned(),
            ));
        }

        #[cfg(unix)]
        vars.push((
            crate::env::PROMPT_VAR.to_string(),
            prompt(prompt_prefix, account_name, inherited_prompt),
        ));
        #[cfg(not(unix))]
        let _ = (prompt_prefix, inherited_prompt);

        Self {
            account_name: account_name.to_string(),
            profile_name: profile_name.to_string(),
            shell,
            vars,
        }
    }

    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.shell);
        command.envs(self.vars.iter().map(|(k, v)| (k, v)));
        command
    }
}

/// Prompt for the sub-shell: `<prefix>:<account> ` in front of the inherited one
#[cfg_attr(not(unix), allow(dead_code))]
fn prompt(prefix: &str, account_name: &str, inherited: Option<&str>) -> String {
    match inherited {
        Some(ps1) if !ps1.is_empty() => format!("{}:{} {}", prefix, account_name, ps1),
        _ => format!("{}:{} $ ", prefix, account_name),
    }
}

/// Shell to start: explicit override, then the platform's usual variable
pub fn resolve_shell(override_shell: Option<&str>) -> String {
    if let Some(shell) = override_shell.filter(|s| !s.is_empty()) {
        return shell.to_string();
    }

    let (var, fallback) = if cfg!(windows) {
        ("COMSPEC", "cmd.exe")
    } else {
        ("SHELL", "/bin/bash")
    };

    std::env::var(var)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

#[cfg_attr(test, mockall::automock)]
pub trait ShellLauncher {
    /// Start the shell and block until it exits
    fn launch(&self, session: &SessionSpec) -> Result<()>;
}

/// Spawns the real interactive shell, inheriting the terminal
pub struct SystemShell;

impl ShellLauncher for SystemShell {
    fn launch(&self, session: &SessionSpec) -> Result<()> {
        tracing::debug!(
            "Starting {} for account '{}' (profile '{}')",
            session.shell,
            session.account_name,
            session.profile_name
        );

        let mut child = session.command().spawn().map_err(|e| {
            KeeError::ExternalCommand(format!("Could not start shell '{}': {}", session.shell, e))
        })?;

        // Ctrl-C typed in the sub-shell reaches us too; it belongs to the shell
        let _guard = InterruptGuard::ignore();
        let status = child.wait()?;
        tracing::debug!("Shell exited with {}", status);
        Ok(())
    }
}

/// Ignores SIGINT in this process until dropped
struct InterruptGuard {
    #[cfg(unix)]
    previous: libc::sighandler_t,
}

impl InterruptGuard {
    #[cfg(unix)]
    fn ignore() -> Self {
        // SAFETY: installing SIG_IGN has no handler code to run; the previous
        // disposition is restored in Drop
        let previous = unsafe { libc::signal(libc::SIGINT, libc::SIG_IGN) };
        Self { previous }
    }

    #[cfg(not(unix))]
    fn ignore() -> Self {
        Self {}
    }
}

#[cfg(unix)]
impl Drop for InterruptGuard {
    fn drop(&mut self) {
        if self.previous != libc::SIG_ERR {
            // SAFETY: restores the disposition returned by `signal` above
            unsafe {
                libc::signal(libc::SIGINT, self.previous);
            }
        }
    }
}

/// Banner shown when a session starts
pub fn banner() -> &'static str {
    r#"
    ██╗  ██╗███████╗███████╗
    ██║ ██╔╝██╔════╝██╔════╝
    █████╔╝ █████╗  █████╗
    ██╔═██╗ ██╔══╝  ██╔══╝
    ██║  ██╗███████╗███████╗
    ╚═╝  ╚═╝╚══════╝╚══════╝

    AWS CLI profile manager"#
}

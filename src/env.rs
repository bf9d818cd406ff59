// Session markers inherited through the process environment

/// Profile selector read by the AWS CLI and SDKs
pub const PROFILE_VAR: &str = "AWS_PROFILE";
/// Friendly account name of the running session
pub const ACCOUNT_VAR: &str = "KEE_CURRENT_ACCOUNT";
/// Set to "1" inside a kee sub-shell
pub const ACTIVE_VAR: &str = "KEE_ACTIVE_PROFILE";
/// Unix prompt string, prefixed with the account name inside a session
pub const PROMPT_VAR: &str = "PS1";

/// What the inherited environment says about an active kee session.
///
/// Read once at startup; nothing in kee keeps this state anywhere else.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionEnv {
    pub active: bool,
    pub account: Option<String>,
    pub prompt: Option<String>,
}

impl SessionEnv {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any variable lookup, so tests do not touch the real environment
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let active = lookup(ACTIVE_VAR).is_some_and(|v| !v.is_empty());
        let account = lookup(ACCOUNT_VAR).filter(|v| !v.is_empty());
        let prompt = lookup(PROMPT_VAR);

        if active {
            tracing::debug!(
                "Inside kee session for '{}'",
                account.as_deref().unwrap_or("unknown")
            );
        }

        Self {
            active,
            account,
            prompt,
        }
    }

    /// Account of the active session, if any
    pub fn active_account(&self) -> Option<&str> {
        if self.active {
            self.account.as_deref()
        } else {
            None
        }
    }
}

use crate::cli::{hlt, Context};
use crate::env::SessionEnv;
use crate::error::Result;

/// Reports the session from the inherited environment only; the registry's
/// `current_account` is never consulted
pub fn execute(ctx: &Context) -> Result<()> {
    println!("{}", render(&ctx.session_env));
    Ok(())
}

pub fn render(session_env: &SessionEnv) -> String {
    if !session_env.active {
        return "no active session".to_string();
    }
    match session_env.account.as_deref() {
        Some(account) => format!("Current account: {}", hlt(account)),
        None => format!("Current account: {} (session active)", hlt("unknown")),
    }
}

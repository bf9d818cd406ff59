use crate::cli::{hlt, Context};
use crate::error::{KeeError, Result};

pub fn execute(ctx: &Context, account_name: &str, force: bool) -> Result<()> {
    let mut registry = ctx.registry.load()?;

    let Some(entry) = registry.get(account_name).cloned() else {
        return Err(KeeError::UnknownAccount(account_name.to_string()));
    };

    if ctx.session_env.active_account() == Some(account_name) && !force {
        return Err(KeeError::AccountInUse(account_name.to_string()));
    }

    let question = format!(
        "Are you sure you want to remove account '{}'?",
        hlt(account_name)
    );
    if !ctx.confirm.confirm(&question)? {
        println!(" Cancelled.");
        return Ok(());
    }

    // AWS config first: if it cannot be rewritten the registry still lists the account
    let snapshot = ctx.aws_config.snapshot()?;
    let session = Some(entry.session_name.as_str()).filter(|s| !s.is_empty());
    if !ctx.aws_config.remove_profile(&entry.profile_name, session)? {
        tracing::warn!(
            "Profile '{}' was not in {}",
            entry.profile_name,
            ctx.aws_config.path().display()
        );
    }

    registry.remove(account_name);
    if let Err(e) = ctx.registry.save(&registry) {
        if let Err(restore) = snapshot.restore() {
            tracing::warn!("Could not restore AWS config after failed remove: {}", restore);
        }
        return Err(e);
    }
    tracing::info!("Removed account '{}'", account_name);

    println!(" [✓] Account '{}' has been removed.", hlt(account_name));
    Ok(())
}

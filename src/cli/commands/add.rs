use crate::auth::AuthManager;
use crate::aws_config::ConfigSnapshot;
use crate::cli::{hlt, Context};
use crate::error::{KeeError, Result};
use crate::models::{is_valid_account_name, AccountEntry, Registry};
use chrono::Utc;

pub fn execute(ctx: &Context, account_name: &str) -> Result<()> {
    if !is_valid_account_name(account_name) {
        return Err(KeeError::InvalidAccountName(account_name.to_string()));
    }

    // Refuse early if the registry is corrupt, before the user sits through SSO setup
    let mut registry = ctx.registry.load()?;

    if registry.contains(account_name) {
        let question = format!(
            "Account '{}' already exists. Overwrite it?",
            hlt(account_name)
        );
        if !ctx.confirm.confirm(&question)? {
            return Err(KeeError::DuplicateAccount(account_name.to_string()));
        }
        tracing::info!("Overwriting account '{}'", account_name);
    }

    // Profile name is the account name
    let profile_name = account_name;
    print_guidance();

    let snapshot = ctx.aws_config.snapshot()?;
    let entry = match configure(ctx, &mut registry, account_name, profile_name) {
        Ok(entry) => entry,
        Err(e) => {
            rollback(&snapshot);
            return Err(e);
        }
    };

    println!(
        "\n {} You can ignore the AWS CLI example above.\n {} will handle profiles for you.",
        hlt("Note:"),
        hlt("Kee")
    );
    println!(
        "\n [✓] Added account '{}' ({} / {})",
        hlt(account_name),
        entry.sso_account_id,
        entry.sso_role_name
    );

    // Informational only, the account is already saved
    let auth = AuthManager::new(ctx.aws);
    match auth.is_valid(profile_name) {
        Ok(true) => println!("\n [✓] The profile was added and it's working!"),
        Ok(false) => {
            println!("\n [X] The profile was created but credentials may need a refresh.");
            println!(" {} aws sso login --profile {}", hlt("Try:"), profile_name);
        }
        Err(e) => tracing::warn!("Could not test profile '{}': {}", profile_name, e),
    }

    Ok(())
}

/// Runs the external SSO setup and records the result; nothing is saved on error
fn configure(
    ctx: &Context,
    registry: &mut Registry,
    account_name: &str,
    profile_name: &str,
) -> Result<AccountEntry> {
    if !ctx.aws.configure_sso(profile_name)? {
        return Err(KeeError::ExternalCommand(format!(
            "'aws configure sso' for profile '{}' did not complete",
            profile_name
        )));
    }

    let details = ctx.aws_config.profile_details(profile_name)?.ok_or_else(|| {
        KeeError::ConfigFormat(format!(
            "profile '{}' not found in {} after SSO setup",
            profile_name,
            ctx.aws_config.path().display()
        ))
    })?;

    let mut entry = details.into_entry(profile_name);
    entry.added_at = Some(Utc::now());

    // Normalizes the stanza the AWS CLI wrote
    ctx.aws_config.write_profile(&entry)?;

    registry.upsert(account_name, entry.clone());
    ctx.registry.save(registry)?;
    tracing::info!("Saved account '{}' to {}", account_name, ctx.registry.path().display());

    Ok(entry)
}

fn rollback(snapshot: &ConfigSnapshot) {
    if let Err(e) = snapshot.restore() {
        tracing::warn!("Could not restore AWS config after failed add: {}", e);
    }
}

fn print_guidance() {
    println!("\n Starting SSO configuration...");
    println!(" (This will open your browser to complete authentication.)");
    println!("\n Follow the prompts:");
    let steps = [
        "Enter your SSO start URL",
        "Enter your SSO region",
        "Authenticate in your browser",
        "Select your AWS account",
        "Select your role",
        "Choose your default region",
        "Choose your output format (recommend: json)",
    ];
    for (i, step) in steps.iter().enumerate() {
        println!("  {} {}", hlt(format!("{}.", i + 1)), step);
    }
    println!(
        "\n  {} A session can be linked to multiple profiles.\n  When prompted for a 'session name', use something generic, like your company name.\n",
        hlt("Tip:")
    );
}

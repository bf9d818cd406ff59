use crate::cli::{hlt, Context, OutputFormat};
use crate::error::Result;
use crate::models::{AccountSummary, Registry};
use colored::Colorize;

pub fn execute(ctx: &Context, format: OutputFormat) -> Result<()> {
    let registry = ctx.registry.load()?;
    // Outside a session, fall back to a session recorded from another terminal
    let active = ctx
        .session_env
        .active_account()
        .or_else(|| registry.current().map(|(name, _)| name));
    print!("{}", render(&registry, active, format)?);
    Ok(())
}

/// Build the `list` output; read-only, recomputed from the registry on every call
pub fn render(registry: &Registry, active: Option<&str>, format: OutputFormat) -> Result<String> {
    let summaries: Vec<AccountSummary> = registry.summaries(active).collect();

    if format == OutputFormat::Json {
        let mut json = serde_json::to_string_pretty(&summaries)?;
        json.push('\n');
        return Ok(json);
    }

    let mut out = String::new();
    if summaries.is_empty() {
        out.push_str("\n No accounts configured.\n");
        out.push_str(&format!(" Run '{}' to add one.\n", hlt("kee add <name>")));
        return Ok(out);
    }

    out.push_str(&format!("\n Configured accounts ({}):\n", registry.len()));
    for summary in &summaries {
        let marker = if summary.active {
            " (active)".green().to_string()
        } else {
            String::new()
        };
        out.push_str(&format!(
            "\n {}{}\n  • {} {}\n  • {} {}\n  • {} {}\n",
            hlt(summary.name),
            marker,
            hlt("Account:"),
            summary.account_id,
            hlt("Role:"),
            summary.role_name,
            hlt("Profile:"),
            summary.profile_name
        ));
    }
    Ok(out)
}

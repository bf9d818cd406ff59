// CLI interface
pub mod commands;
pub mod context;

use crate::aws_cli::SystemAwsCli;
use crate::config::Config;
use crate::env::SessionEnv;
use crate::error::Result;
use crate::prompt::{AssumeYes, Confirm, StdinConfirm};
use crate::session::SystemShell;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use colored::{ColoredString, Colorize};
pub use context::Context;

const EXAMPLES: &str = "\
Examples:
  kee add myaccount          Add a new AWS account
  kee use myaccount          Use an account (starts sub-shell)
  kee list                   List all configured accounts
  kee current                Show current active account
  kee remove myaccount       Remove an account configuration";

#[derive(Parser, Debug)]
#[command(name = "kee")]
#[command(about = "AWS CLI profile manager: switch SSO accounts in isolated sub-shells", long_about = None)]
#[command(version, after_help = EXAMPLES)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose/debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a new AWS account through 'aws configure sso'
    Add {
        /// Name for the account (also used as the AWS profile name)
        account_name: String,

        /// Overwrite an existing account without asking
        #[arg(short, long)]
        yes: bool,
    },

    /// Use an account (starts a sub-shell)
    Use {
        /// Account to use
        account_name: String,
    },

    /// List all configured accounts
    #[command(alias = "ls")]
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show the account of the active session
    Current,

    /// Remove an account and its AWS profile
    #[command(alias = "rm")]
    Remove {
        /// Account to remove
        account_name: String,

        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,

        /// Remove the account even if it backs the active session
        #[arg(long)]
        force: bool,
    },

    /// Manage kee settings
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Generate shell completion scripts
    ///
    /// INSTALLATION:
    ///
    /// Bash:
    ///   eval "$(kee completions bash)"    # Add to ~/.bashrc
    ///
    /// Zsh:
    ///   eval "$(kee completions zsh)"     # Add to ~/.zshrc
    ///
    /// Fish:
    ///   kee completions fish > ~/.config/fish/completions/kee.fish
    ///
    /// PowerShell:
    ///   kee completions powershell | Out-String | Invoke-Expression
    Completions {
        /// Shell type to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Write a commented sample settings file
    Init,
    /// Show settings and data file locations
    Path,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

/// Bold highlight used for names and commands in output
pub(crate) fn hlt<S: AsRef<str>>(text: S) -> ColoredString {
    text.as_ref().bold()
}

pub fn execute(args: Cli) -> Result<()> {
    let Some(command) = args.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    // These two must keep working when the settings file is broken
    match command {
        Commands::Config { command } => return commands::config::execute(command),
        Commands::Completions { shell } => {
            commands::completions::execute(shell);
            return Ok(());
        }
        _ => {}
    }

    let settings = Config::load()?;
    let aws = SystemAwsCli::new(settings.aws.cli.clone(), settings.aws.config_file.clone());
    let shell = SystemShell;
    let assume_yes = matches!(
        command,
        Commands::Add { yes: true, .. } | Commands::Remove { yes: true, .. }
    );
    let confirm: &dyn Confirm = if assume_yes { &AssumeYes } else { &StdinConfirm };

    let ctx = Context::new(settings, SessionEnv::from_env(), &aws, &shell, confirm)?;

    match command {
        Commands::Add { account_name, .. } => commands::add::execute(&ctx, &account_name),
        Commands::Use { account_name } => commands::use_account::execute(&ctx, &account_name),
        Commands::List { format } => commands::list::execute(&ctx, format),
        Commands::Current => commands::current::execute(&ctx),
        Commands::Remove {
            account_name,
            force,
            ..
        } => commands::remove::execute(&ctx, &account_name, force),
        Commands::Config { .. } | Commands::Completions { .. } => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_commands() {
        let cli = Cli::try_parse_from(["kee", "use", "acme-dev"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Use { ref account_name }) if account_name == "acme-dev"));

        let cli = Cli::try_parse_from(["kee", "remove", "acme-dev", "--yes", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Some(Commands::Remove { yes: true, force: false, .. })
        ));

        let cli = Cli::try_parse_from(["kee", "ls", "--format", "json"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::List { format: OutputFormat::Json })
        ));
    }

    #[test]
    fn test_add_requires_name() {
        assert!(Cli::try_parse_from(["kee", "add"]).is_err());
    }
}

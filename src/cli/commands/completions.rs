use crate::cli::{Cli, Shell};
use clap::CommandFactory;
use clap_complete::{generate, Shell as ClapShell};
use std::io::{self, Write};

const BIN_NAME: &str = "kee";

pub fn execute(shell: Shell) {
    eprintln!("Generating completion file for {:?}...", shell);
    write_completions(&shell, &mut io::stdout());
    eprintln!("\n# Installation instructions:");
    for line in install_hint(&shell) {
        eprintln!("#   {}", line);
    }
}

fn write_completions(shell: &Shell, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    let clap_shell = match shell {
        Shell::Bash => ClapShell::Bash,
        Shell::Zsh => ClapShell::Zsh,
        Shell::Fish => ClapShell::Fish,
        Shell::PowerShell => ClapShell::PowerShell,
        Shell::Elvish => ClapShell::Elvish,
    };
    generate(clap_shell, &mut cmd, BIN_NAME, out);
}

fn install_hint(shell: &Shell) -> &'static [&'static str] {
    match shell {
        Shell::Bash => &[
            "Add to ~/.bashrc: eval \"$(kee completions bash)\"",
            "Or save it: kee completions bash > /usr/local/etc/bash_completion.d/kee",
        ],
        Shell::Zsh => &[
            "Add to ~/.zshrc: eval \"$(kee completions zsh)\"",
            "Or save it: kee completions zsh > ~/.zfunc/_kee",
            "Then add to ~/.zshrc: fpath=(~/.zfunc $fpath)",
        ],
        Shell::Fish => &["kee completions fish > ~/.config/fish/completions/kee.fish"],
        Shell::PowerShell => &["kee completions powershell | Out-String | Invoke-Expression"],
        Shell::Elvish => &["eval (kee completions elvish | slurp)"],
    }
}

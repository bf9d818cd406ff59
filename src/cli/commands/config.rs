use crate::cli::{hlt, ConfigCommand};
use crate::config::Config;
use crate::error::Result;

pub fn execute(command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Init => {
            let path = Config::create_sample()?;
            println!(" [✓] Created sample settings file: {}", path.display());
        }
        ConfigCommand::Path => {
            let config_path = Config::config_file_path()?;
            println!("Settings file: {}", config_path.display());

            if !config_path.exists() {
                println!("Status: File does not exist (using defaults)");
                println!("\nTo create a sample settings file, run:");
                println!("  {}", hlt("kee config init"));
            } else {
                println!("Status: File exists");
            }

            // Try to load and show if it's valid
            match Config::load() {
                Ok(config) => {
                    if config_path.exists() {
                        println!("Valid: Yes");
                    }
                    println!("\nResolved paths:");
                    println!("  Registry: {}", config.registry_path()?.display());
                    println!("  AWS config: {}", config.aws_config_path()?.display());
                    println!("  AWS CLI: {}", config.aws.cli);
                }
                Err(e) => {
                    println!("Valid: No");
                    println!("Error: {}", e);
                }
            }
        }
    }

    Ok(())
}

// Configuration management
use crate::error::{KeeError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub aws: AwsSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub registry: RegistrySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AwsSettings {
    /// AWS CLI program to run
    #[serde(default = "default_aws_cli")]
    pub cli: String,
    /// Override for ~/.aws/config
    pub config_file: Option<PathBuf>,
}

fn default_aws_cli() -> String {
    "aws".to_string()
}

impl Default for AwsSettings {
    fn default() -> Self {
        Self {
            cli: default_aws_cli(),
            config_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSettings {
    pub shell: Option<String>,
    #[serde(default = "default_prompt_prefix")]
    pub prompt_prefix: String,
}

fn default_prompt_prefix() -> String {
    "aws".to_string()
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            shell: None,
            prompt_prefix: default_prompt_prefix(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RegistrySettings {
    /// Override for ~/.aws/kee.json
    pub path: Option<PathBuf>,
}

impl Config {
    /// Get the config directory path
    ///
    /// Priority:
    /// 1. XDG_CONFIG_HOME/kee (if env var is set)
    /// 2. ~/.config/kee (if ~/.config exists)
    /// 3. ~/.kee (fallback on Unix, doesn't create ~/.config)
    /// 4. Platform default on Windows
    pub fn config_dir() -> Result<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            if !xdg_config.is_empty() {
                return Ok(PathBuf::from(xdg_config).join("kee"));
            }
        }

        #[cfg(unix)]
        {
            if let Some(home_dir) = dirs::home_dir() {
                let xdg_config = home_dir.join(".config");

                if xdg_config.exists() {
                    return Ok(xdg_config.join("kee"));
                }

                return Ok(home_dir.join(".kee"));
            }
        }

        #[cfg(not(unix))]
        {
            if let Some(config_dir) = dirs::config_dir() {
                return Ok(config_dir.join("kee"));
            }
        }

        Err(KeeError::Settings(
            "Could not determine config directory".to_string(),
        ))
    }

    /// Get the config file path
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, environment variables, and defaults
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file_path()?;

        let mut config = if config_path.exists() {
            tracing::debug!("Loading settings from: {}", config_path.display());
            let contents = fs::read_to_string(&config_path)
                .map_err(|e| KeeError::Settings(format!("Failed to read config file: {}", e)))?;
            Self::from_toml(&contents)?
        } else {
            tracing::debug!(
                "Settings file not found at {}, using defaults",
                config_path.display()
            );
            Config::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| KeeError::Settings(format!("Failed to parse config file: {}", e)))
    }

    fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(cli) = lookup("KEE_AWS_CLI").filter(|v| !v.is_empty()) {
            tracing::debug!("Using KEE_AWS_CLI from environment: {}", cli);
            self.aws.cli = cli;
        }

        if let Some(shell) = lookup("KEE_SHELL").filter(|v| !v.is_empty()) {
            tracing::debug!("Using KEE_SHELL from environment: {}", shell);
            self.session.shell = Some(shell);
        }

        // The AWS CLI itself gives AWS_CONFIG_FILE precedence over its default
        if let Some(file) = lookup("AWS_CONFIG_FILE").filter(|v| !v.is_empty()) {
            tracing::debug!("Using AWS_CONFIG_FILE from environment: {}", file);
            self.aws.config_file = Some(PathBuf::from(file));
        }
    }

    /// Registry path: `[registry] path` or ~/.aws/kee.json
    pub fn registry_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.registry.path {
            return Ok(path.clone());
        }
        dirs::home_dir()
            .map(|home| home.join(".aws").join("kee.json"))
            .ok_or_else(|| KeeError::Settings("Could not determine home directory".to_string()))
    }

    /// AWS config path: explicit override or the AWS CLI default
    pub fn aws_config_path(&self) -> Result<PathBuf> {
        match &self.aws.config_file {
            Some(path) => Ok(path.clone()),
            None => crate::aws_config::default_config_file_path(),
        }
    }

    /// Create a sample config file with comments
    pub fn create_sample() -> Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        let config_path = Self::config_file_path()?;

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir).map_err(|e| {
                KeeError::Settings(format!("Failed to create config directory: {}", e))
            })?;
        }

        // Don't overwrite existing config
        if config_path.exists() {
            return Err(KeeError::Settings(format!(
                "Config file already exists at: {}",
                config_path.display()
            )));
        }

        fs::write(&config_path, SAMPLE_CONFIG)
            .map_err(|e| KeeError::Settings(format!("Failed to write sample config: {}", e)))?;

        tracing::info!("Created sample config: {}", config_path.display());
        Ok(config_path)
    }
}

const SAMPLE_CONFIG: &str = r#"# kee configuration
# Location priority:
#   1. $XDG_CONFIG_HOME/kee/config.toml (if XDG_CONFIG_HOME is set)
#   2. ~/.config/kee/config.toml (if ~/.config exists)
#   3. ~/.kee/config.toml (fallback)
#
# Environment variables take precedence:
#   KEE_AWS_CLI, KEE_SHELL, AWS_CONFIG_FILE

[aws]
# AWS CLI program used for 'configure sso', 'sso login' and identity checks
cli = "aws"

# AWS CLI config file (default: ~/.aws/config)
# config_file = "/home/me/.aws/config"

[session]
# Shell started by 'kee use' (default: $SHELL, or $COMSPEC on Windows)
# shell = "/bin/zsh"

# Prefix shown before the account name in the sub-shell prompt
prompt_prefix = "aws"

[registry]
# Where kee keeps its accounts (default: ~/.aws/kee.json)
# path = "/home/me/.aws/kee.json"
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.aws.cli, "aws");
        assert_eq!(config.session.prompt_prefix, "aws");
        assert!(config.session.shell.is_none());
        assert!(config.registry.path.is_none());
    }

    #[test]
    fn test_sample_config_parses() {
        let config = Config::from_toml(SAMPLE_CONFIG).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = Config::from_toml("[session]\nshell = \"/bin/zsh\"\n").unwrap();
        assert_eq!(config.session.shell.as_deref(), Some("/bin/zsh"));
        assert_eq!(config.session.prompt_prefix, "aws");
        assert_eq!(config.aws.cli, "aws");
    }

    #[test]
    fn test_invalid_config_is_settings_error() {
        let err = Config::from_toml("[aws\ncli = ").unwrap_err();
        assert!(matches!(err, KeeError::Settings(_)));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("KEE_AWS_CLI", "/opt/aws/bin/aws"),
            ("KEE_SHELL", "/bin/fish"),
            ("AWS_CONFIG_FILE", "/tmp/aws-config"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.aws.cli, "/opt/aws/bin/aws");
        assert_eq!(config.session.shell.as_deref(), Some("/bin/fish"));
        assert_eq!(
            config.aws_config_path().unwrap(),
            PathBuf::from("/tmp/aws-config")
        );
    }

    #[test]
    fn test_registry_path_override() {
        let mut config = Config::default();
        config.registry.path = Some(PathBuf::from("/tmp/kee.json"));
        assert_eq!(config.registry_path().unwrap(), PathBuf::from("/tmp/kee.json"));
    }
}

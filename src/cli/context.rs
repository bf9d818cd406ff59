// Everything a command handler needs, gathered once per invocation
use crate::aws_cli::AwsCli;
use crate::aws_config::AwsConfigFile;
use crate::config::Config;
use crate::env::SessionEnv;
use crate::error::Result;
use crate::prompt::Confirm;
use crate::registry::RegistryStore;
use crate::session::ShellLauncher;

pub struct Context<'a> {
    pub settings: Config,
    pub registry: RegistryStore,
    pub aws_config: AwsConfigFile,
    pub session_env: SessionEnv,
    pub aws: &'a dyn AwsCli,
    pub shell: &'a dyn ShellLauncher,
    pub confirm: &'a dyn Confirm,
}

impl<'a> Context<'a> {
    pub fn new(
        settings: Config,
        session_env: SessionEnv,
        aws: &'a dyn AwsCli,
        shell: &'a dyn ShellLauncher,
        confirm: &'a dyn Confirm,
    ) -> Result<Self> {
        let registry = RegistryStore::new(settings.registry_path()?);
        let aws_config = AwsConfigFile::new(settings.aws_config_path()?);
        tracing::debug!(
            "Registry: {}, AWS config: {}",
            registry.path().display(),
            aws_config.path().display()
        );

        Ok(Self {
            settings,
            registry,
            aws_config,
            session_env,
            aws,
            shell,
            confirm,
        })
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::aws_cli::MockAwsCli;
    use crate::prompt::MockConfirm;
    use crate::session::MockShellLauncher;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Mocks plus a scratch home directory for command tests
    pub struct TestEnv {
        pub home: TempDir,
        pub aws: MockAwsCli,
        pub shell: MockShellLauncher,
        pub confirm: MockConfirm,
        pub session_env: SessionEnv,
    }

    impl TestEnv {
        pub fn new() -> Self {
            Self {
                home: tempfile::tempdir().unwrap(),
                aws: MockAwsCli::new(),
                shell: MockShellLauncher::new(),
                confirm: MockConfirm::new(),
                session_env: SessionEnv::default(),
            }
        }

        pub fn registry_path(&self) -> PathBuf {
            self.home.path().join(".aws").join("kee.json")
        }

        pub fn aws_config_path(&self) -> PathBuf {
            self.home.path().join(".aws").join("config")
        }

        pub fn context(&self) -> Context<'_> {
            let mut settings = Config::default();
            settings.registry.path = Some(self.registry_path());
            settings.aws.config_file = Some(self.aws_config_path());
            settings.session.shell = Some("/bin/sh".to_string());

            Context::new(
                settings,
                self.session_env.clone(),
                &self.aws,
                &self.shell,
                &self.confirm,
            )
            .unwrap()
        }
    }
}

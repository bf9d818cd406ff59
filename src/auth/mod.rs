// SSO credential validity check
use crate::aws_cli::AwsCli;
use crate::error::{KeeError, Result};

/// Makes sure a profile has working SSO credentials before a session starts
pub struct AuthManager<'a> {
    cli: &'a dyn AwsCli,
}

impl<'a> AuthManager<'a> {
    pub fn new(cli: &'a dyn AwsCli) -> Self {
        Self { cli }
    }

    /// Whether the cached credentials for `profile` currently work
    pub fn is_valid(&self, profile: &str) -> Result<bool> {
        self.cli.caller_identity(profile)
    }

    /// Check credentials; on failure run the interactive SSO login once and re-check
    pub fn ensure_valid(&self, profile: &str) -> Result<()> {
        if self.is_valid(profile)? {
            tracing::debug!("Credentials for profile '{}' are valid", profile);
            return Ok(());
        }

        println!("\n Credentials expired or not available. Attempting SSO login...");
        tracing::info!("Running SSO login for profile '{}'", profile);

        if !self.cli.sso_login(profile)? {
            tracing::warn!("SSO login for profile '{}' did not succeed", profile);
        }

        if self.is_valid(profile)? {
            Ok(())
        } else {
            Err(KeeError::Authentication(profile.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws_cli::MockAwsCli;
    use mockall::predicate::eq;
    use mockall::Sequence;

    #[test]
    fn test_valid_credentials_skip_login() {
        let mut cli = MockAwsCli::new();
        cli.expect_caller_identity()
            .with(eq("acme-dev"))
            .times(1)
            .returning(|_| Ok(true));
        cli.expect_sso_login().never();

        AuthManager::new(&cli).ensure_valid("acme-dev").unwrap();
    }

    #[test]
    fn test_expired_credentials_login_once_then_recheck() {
        let mut seq = Sequence::new();
        let mut cli = MockAwsCli::new();
        cli.expect_caller_identity()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(false));
        cli.expect_sso_login()
            .with(eq("acme-dev"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(true));
        cli.expect_caller_identity()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(true));

        AuthManager::new(&cli).ensure_valid("acme-dev").unwrap();
    }

    #[test]
    fn test_still_invalid_after_login_is_authentication_error() {
        let mut cli = MockAwsCli::new();
        cli.expect_caller_identity().times(2).returning(|_| Ok(false));
        cli.expect_sso_login().times(1).returning(|_| Ok(false));

        let err = AuthManager::new(&cli).ensure_valid("acme-dev").unwrap_err();
        assert!(matches!(err, KeeError::Authentication(ref p) if p == "acme-dev"));
    }

    #[test]
    fn test_missing_cli_propagates() {
        let mut cli = MockAwsCli::new();
        cli.expect_caller_identity()
            .returning(|_| Err(KeeError::ExternalCommand("not found".to_string())));
        cli.expect_sso_login().never();

        let err = AuthManager::new(&cli).ensure_valid("acme-dev").unwrap_err();
        assert!(matches!(err, KeeError::ExternalCommand(_)));
    }
}

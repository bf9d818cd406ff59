use crate::auth::AuthManager;
use crate::cli::{hlt, Context};
use crate::error::{KeeError, Result};
use crate::session::{banner, resolve_shell, SessionSpec};
use colored::Colorize;

pub fn execute(ctx: &Context, account_name: &str) -> Result<()> {
    // Nested sessions are refused before anything else is looked at
    if ctx.session_env.active {
        let current = ctx.session_env.account.as_deref().unwrap_or("unknown");
        println!(" Exit the current session first by typing '{}'", hlt("exit"));
        return Err(KeeError::SessionAlreadyActive(current.to_string()));
    }

    let mut registry = ctx.registry.load()?;

    let Some(entry) = registry.get(account_name).cloned() else {
        println!("\n Account '{}' not found.", hlt(account_name));
        if !registry.is_empty() {
            println!(" Available accounts:");
            for name in registry.names() {
                println!(" • {}", hlt(name));
            }
        }
        return Err(KeeError::UnknownAccount(account_name.to_string()));
    };

    AuthManager::new(ctx.aws).ensure_valid(&entry.profile_name)?;

    registry.current_account = Some(account_name.to_string());
    ctx.registry.save(&registry)?;

    let spec = SessionSpec::new(
        account_name,
        &entry.profile_name,
        resolve_shell(ctx.settings.session.shell.as_deref()),
        &ctx.settings.session.prompt_prefix,
        ctx.session_env.prompt.as_deref(),
        ctx.settings.aws.config_file.as_deref(),
    );

    println!("{}", banner().cyan());
    println!("\n Starting session for {}", hlt(account_name));
    println!(" • {} {}", hlt("Account:"), entry.sso_account_id);
    println!(" • {} {}", hlt("Role:"), entry.sso_role_name);
    println!(" Type '{}' to leave the session.\n", hlt("exit"));

    let launched = ctx.shell.launch(&spec);

    // Runs whether or not the shell started, so a failed launch leaves no marker
    clear_current(ctx, account_name);
    launched?;

    println!("\n Session ended for {}", hlt(account_name));
    Ok(())
}

/// Reset `current_account` unless another invocation changed it meanwhile
fn clear_current(ctx: &Context, account_name: &str) {
    let result = ctx.registry.load().and_then(|mut registry| {
        if registry.current_account.as_deref() == Some(account_name) {
            registry.current_account = None;
            ctx.registry.save(&registry)?;
        }
        Ok(())
    });

    if let Err(e) = result {
        tracing::warn!("Could not clear current account in registry: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::context::fixtures::TestEnv;
    use crate::env::SessionEnv;
    use crate::models::fixtures::entry;
    use crate::models::Registry;
    use mockall::predicate::eq;
    use mockall::Sequence;

    fn seed(env: &TestEnv) {
        let mut registry = Registry::default();
        registry.upsert("acme-dev", entry("acme-dev"));
        env.context().registry.save(&registry).unwrap();
    }

    #[test]
    fn test_unknown_account_never_spawns() {
        let mut env = TestEnv::new();
        seed(&env);
        env.aws.expect_caller_identity().never();
        env.aws.expect_sso_login().never();
        env.shell.expect_launch().never();

        let err = execute(&env.context(), "missing-co").unwrap_err();
        assert!(matches!(err, KeeError::UnknownAccount(ref name) if name == "missing-co"));
        assert_eq!(err.to_string(), "Account 'missing-co' not found");
    }

    #[test]
    fn test_active_session_fails_before_any_subprocess() {
        let mut env = TestEnv::new();
        seed(&env);
        env.session_env = SessionEnv {
            active: true,
            account: Some("acme-prod".to_string()),
            prompt: None,
        };
        env.aws.expect_caller_identity().never();
        env.aws.expect_sso_login().never();
        env.shell.expect_launch().never();

        let err = execute(&env.context(), "acme-dev").unwrap_err();
        assert!(matches!(err, KeeError::SessionAlreadyActive(ref name) if name == "acme-prod"));
    }

    #[test]
    fn test_active_session_wins_over_unknown_and_corrupt_registry() {
        let mut env = TestEnv::new();
        std::fs::create_dir_all(env.registry_path().parent().unwrap()).unwrap();
        std::fs::write(env.registry_path(), "{not json").unwrap();
        env.session_env = SessionEnv {
            active: true,
            account: Some("acme-dev".to_string()),
            prompt: None,
        };
        env.shell.expect_launch().never();

        let err = execute(&env.context(), "missing-co").unwrap_err();
        assert!(matches!(err, KeeError::SessionAlreadyActive(ref name) if name == "acme-dev"));
    }

    #[test]
    fn test_active_session_without_marker_reports_unknown() {
        let mut env = TestEnv::new();
        seed(&env);
        env.session_env.active = true;

        let err = execute(&env.context(), "acme-dev").unwrap_err();
        assert!(matches!(err, KeeError::SessionAlreadyActive(ref name) if name == "unknown"));
    }

    #[test]
    fn test_launches_shell_with_account_environment() {
        let mut env = TestEnv::new();
        seed(&env);
        env.aws
            .expect_caller_identity()
            .with(eq("acme-dev"))
            .times(1)
            .returning(|_| Ok(true));

        let registry_path = env.registry_path();
        env.shell
            .expect_launch()
            .withf(|spec| {
                spec.account_name == "acme-dev"
                    && spec.shell == "/bin/sh"
                    && spec
                        .vars
                        .contains(&("AWS_PROFILE".to_string(), "acme-dev".to_string()))
            })
            .times(1)
            .returning(move |_| {
                // The marker is recorded while the shell runs
                let during = crate::registry::RegistryStore::new(&registry_path)
                    .load()
                    .unwrap();
                assert_eq!(during.current_account.as_deref(), Some("acme-dev"));
                Ok(())
            });

        let ctx = env.context();
        execute(&ctx, "acme-dev").unwrap();
        assert!(ctx.registry.load().unwrap().current_account.is_none());
    }

    #[test]
    fn test_expired_credentials_login_once_then_fail() {
        let mut env = TestEnv::new();
        seed(&env);
        let mut seq = Sequence::new();
        env.aws
            .expect_caller_identity()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(false));
        env.aws
            .expect_sso_login()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(true));
        env.aws
            .expect_caller_identity()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(false));
        env.shell.expect_launch().never();

        let ctx = env.context();
        let err = execute(&ctx, "acme-dev").unwrap_err();
        assert!(matches!(err, KeeError::Authentication(_)));
        assert!(ctx.registry.load().unwrap().current_account.is_none());
    }

    #[test]
    fn test_failed_launch_clears_marker() {
        let mut env = TestEnv::new();
        seed(&env);
        env.aws.expect_caller_identity().returning(|_| Ok(true));
        env.shell
            .expect_launch()
            .returning(|_| Err(KeeError::ExternalCommand("no shell".to_string())));

        let ctx = env.context();
        let err = execute(&ctx, "acme-dev").unwrap_err();
        assert!(matches!(err, KeeError::ExternalCommand(_)));
        assert!(ctx.registry.load().unwrap().current_account.is_none());
    }

    #[test]
    fn test_marker_changed_elsewhere_is_kept() {
        let mut env = TestEnv::new();
        let mut registry = Registry::default();
        registry.upsert("acme-dev", entry("acme-dev"));
        registry.upsert("acme-prod", entry("acme-prod"));
        env.context().registry.save(&registry).unwrap();

        env.aws.expect_caller_identity().returning(|_| Ok(true));
        let registry_path = env.registry_path();
        env.shell.expect_launch().returning(move |_| {
            let store = crate::registry::RegistryStore::new(&registry_path);
            let mut registry = store.load().unwrap();
            registry.current_account = Some("acme-prod".to_string());
            store.save(&registry).unwrap();
            Ok(())
        });

        let ctx = env.context();
        execute(&ctx, "acme-dev").unwrap();
        assert_eq!(
            ctx.registry.load().unwrap().current_account.as_deref(),
            Some("acme-prod")
        );
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// SSO settings kee keeps for one friendly account name
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountEntry {
    /// AWS CLI profile the account maps to
    pub profile_name: String,
    #[serde(default)]
    pub sso_start_url: String,
    #[serde(default)]
    pub sso_region: String,
    #[serde(default)]
    pub sso_account_id: String,
    #[serde(default)]
    pub sso_role_name: String,
    /// `[sso-session]` name, empty for legacy profiles that inline the SSO settings
    #[serde(default)]
    pub session_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
}

impl AccountEntry {
    pub fn uses_sso_session(&self) -> bool {
        !self.session_name.is_empty()
    }
}

/// Account names double as AWS profile names, so they must survive inside an
/// INI section header (`[profile <name>]`) and a shell prompt
pub fn is_valid_account_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// On-disk registry (`~/.aws/kee.json`)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Registry {
    #[serde(default)]
    pub accounts: BTreeMap<String, AccountEntry>,
    /// Set while a sub-shell is believed to be running
    #[serde(default)]
    pub current_account: Option<String>,
}

impl Registry {
    pub fn get(&self, name: &str) -> Option<&AccountEntry> {
        self.accounts.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.accounts.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.accounts.keys().map(String::as_str)
    }

    /// Insert or replace an entry, returning the previous one
    pub fn upsert(&mut self, name: &str, entry: AccountEntry) -> Option<AccountEntry> {
        self.accounts.insert(name.to_string(), entry)
    }

    /// Remove an entry; clears `current_account` when it pointed at it
    pub fn remove(&mut self, name: &str) -> Option<AccountEntry> {
        let removed = self.accounts.remove(name);
        if removed.is_some() && self.current_account.as_deref() == Some(name) {
            self.current_account = None;
        }
        removed
    }

    /// The recorded current account, ignoring a stale name with no entry behind it
    pub fn current(&self) -> Option<(&str, &AccountEntry)> {
        let name = self.current_account.as_deref()?;
        match self.accounts.get_key_value(name) {
            Some((key, entry)) => Some((key.as_str(), entry)),
            None => {
                tracing::warn!("Registry names '{}' as current but has no such account", name);
                None
            }
        }
    }

    /// Summaries of every account, computed on demand from the current contents
    pub fn summaries<'a>(
        &'a self,
        active: Option<&'a str>,
    ) -> impl Iterator<Item = AccountSummary<'a>> + 'a {
        self.accounts.iter().map(move |(name, entry)| AccountSummary {
            name,
            profile_name: &entry.profile_name,
            account_id: &entry.sso_account_id,
            role_name: &entry.sso_role_name,
            active: active == Some(name.as_str()),
        })
    }
}

/// One line of `kee list`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AccountSummary<'a> {
    pub name: &'a str,
    pub profile_name: &'a str,
    pub account_id: &'a str,
    pub role_name: &'a str,
    pub active: bool,
}


#[cfg(test)]
mod tests {
    use super::fixtures::entry;
    use super::*;

    #[test]
    fn test_account_names() {
        assert!(is_valid_account_name("acme-dev"));
        assert!(is_valid_account_name("acme_prod.eu"));
        assert!(!is_valid_account_name(""));
        assert!(!is_valid_account_name("acme dev"));
        assert!(!is_valid_account_name("acme]"));
        assert!(!is_valid_account_name("a=b"));
    }

    #[test]
    fn test_deserialize_minimal_entry() {
        let json = r#"{
            "accounts": {"test-account": {"profile_name": "test-account"}},
            "current_account": "test-account"
        }"#;
        let registry: Registry = serde_json::from_str(json).unwrap();
        let entry = registry.get("test-account").unwrap();
        assert_eq!(entry.profile_name, "test-account");
        assert_eq!(entry.sso_account_id, "");
        assert!(!entry.uses_sso_session());
        assert_eq!(registry.current_account.as_deref(), Some("test-account"));
    }

    #[test]
    fn test_serialize_keeps_null_current_account() {
        let registry = Registry::default();
        let json = serde_json::to_value(&registry).unwrap();
        assert_eq!(json, serde_json::json!({"accounts": {}, "current_account": null}));
    }

    #[test]
    fn test_remove_clears_current_account() {
        let mut registry = Registry::default();
        registry.upsert("acme-dev", entry("acme-dev"));
        registry.upsert("acme-prod", entry("acme-prod"));
        registry.current_account = Some("acme-dev".to_string());

        assert!(registry.remove("acme-prod").is_some());
        assert_eq!(registry.current_account.as_deref(), Some("acme-dev"));

        assert!(registry.remove("acme-dev").is_some());
        assert_eq!(registry.current_account, None);
        assert!(registry.remove("acme-dev").is_none());
    }

    #[test]
    fn test_current_tolerates_stale_name() {
        let mut registry = Registry::default();
        registry.upsert("acme-dev", entry("acme-dev"));
        registry.current_account = Some("gone".to_string());
        assert!(registry.current().is_none());

        registry.current_account = Some("acme-dev".to_string());
        let (name, current) = registry.current().unwrap();
        assert_eq!(name, "acme-dev");
        assert_eq!(current.profile_name, "acme-dev");
    }

    #[test]
    fn test_summaries_are_sorted_and_mark_active() {
        let mut registry = Registry::default();
        registry.upsert("zeta", entry("zeta"));
        registry.upsert("alpha", entry("alpha-profile"));

        let summaries: Vec<_> = registry.summaries(Some("zeta")).collect();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].name, "alpha");
        assert_eq!(summaries[0].profile_name, "alpha-profile");
        assert!(!summaries[0].active);
        assert_eq!(summaries[1].name, "zeta");
        assert!(summaries[1].active);

        // Recomputed from scratch on every call
        registry.remove("zeta");
        assert_eq!(registry.summaries(None).count(), 1);
    }
}

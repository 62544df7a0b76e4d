//! Test account registry with keyed and feature-based checkout.
//!
//! Accounts come from configuration; a flow checks one out at construction
//! and returns it when the flow ends. Checkout marks the account in use,
//! both in-process and through best-effort marker files, so parallel CI
//! shards running against the same pool collide less often. The marking is
//! collision reduction, not mutual exclusion: acquiring an already-marked
//! account still succeeds (last write wins).

use crate::result::{NavegarError, NavegarResult};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::trace;

/// Configuration record for one pool account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRecord {
    /// Login username
    pub username: String,
    /// Login email, preferred over the username when present
    #[serde(default)]
    pub email: Option<String>,
    /// Login password
    pub password: String,
    /// Per-account login URL override (self-hosted sites log in at their
    /// own origin)
    #[serde(default)]
    pub login_url: Option<String>,
    /// Feature tags used by feature-based checkout
    #[serde(default)]
    pub features: BTreeSet<String>,
    /// Whether this is a special-purpose site-link (connection) account
    #[serde(default)]
    pub site_link: bool,
}

/// What kind of account a flow is holding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKind {
    /// Ordinary test user
    Standard,
    /// Connection account used to link a self-hosted site
    SiteLink,
}

/// A checked-out test account
#[derive(Debug, Clone)]
pub struct Account {
    /// Pool key this account was acquired under; `None` for literal
    /// accounts that never touch the pool
    pub key: Option<String>,
    /// Login username
    pub username: String,
    /// Login email
    pub email: Option<String>,
    /// Login password
    pub password: String,
    /// Login URL override
    pub login_url: Option<String>,
    /// Feature tags
    pub features: BTreeSet<String>,
    /// Account kind
    pub kind: AccountKind,
}

impl Account {
    /// Build a literal account that is not backed by the pool.
    ///
    /// Releasing a literal account is a no-op.
    #[must_use]
    pub fn literal(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            key: None,
            username: username.into(),
            email: None,
            password: password.into(),
            login_url: None,
            features: BTreeSet::new(),
            kind: AccountKind::Standard,
        }
    }

    /// The name presented to the login form (email when present)
    #[must_use]
    pub fn login_name(&self) -> &str {
        self.email.as_deref().unwrap_or(&self.username)
    }

    fn from_record(key: &str, record: &AccountRecord) -> Self {
        Self {
            key: Some(key.to_string()),
            username: record.username.clone(),
            email: record.email.clone(),
            password: record.password.clone(),
            login_url: record.login_url.clone(),
            features: record.features.clone(),
            kind: if record.site_link {
                AccountKind::SiteLink
            } else {
                AccountKind::Standard
            },
        }
    }
}

/// How a flow asks for an account
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountSelector {
    /// Exact configuration key
    ByKey(String),
    /// Any account whose feature tags are a superset of the given set
    ByFeatures(BTreeSet<String>),
}

impl AccountSelector {
    /// Select by configuration key
    #[must_use]
    pub fn by_key(key: impl Into<String>) -> Self {
        Self::ByKey(key.into())
    }

    /// Select by required feature tags
    #[must_use]
    pub fn by_features<I, S>(features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::ByFeatures(features.into_iter().map(Into::into).collect())
    }
}

/// Registry of test credentials supporting keyed or feature-based checkout
pub struct AccountPool {
    records: HashMap<String, AccountRecord>,
    in_use: Mutex<HashSet<String>>,
    marker_dir: Option<PathBuf>,
}

impl std::fmt::Debug for AccountPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountPool")
            .field("records", &self.records.len())
            .field("marker_dir", &self.marker_dir)
            .finish()
    }
}

impl AccountPool {
    /// Create a pool over the given configuration records.
    ///
    /// Cross-process markers default to a directory under the system temp
    /// dir; see [`Self::with_marker_dir`] and [`Self::without_markers`].
    #[must_use]
    pub fn new(records: HashMap<String, AccountRecord>) -> Self {
        Self {
            records,
            in_use: Mutex::new(HashSet::new()),
            marker_dir: Some(std::env::temp_dir().join("navegar-accounts")),
        }
    }

    /// Put marker files in a specific directory
    #[must_use]
    pub fn with_marker_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.marker_dir = Some(dir.into());
        self
    }

    /// Disable cross-process marker files (in-process marking remains)
    #[must_use]
    pub fn without_markers(mut self) -> Self {
        self.marker_dir = None;
        self
    }

    /// Acquire an account for the given selector
    pub fn acquire(&self, selector: &AccountSelector) -> NavegarResult<Account> {
        match selector {
            AccountSelector::ByKey(key) => self.acquire_by_key(key),
            AccountSelector::ByFeatures(features) => self.acquire_by_features(features),
        }
    }

    /// Acquire the account registered under `key`
    pub fn acquire_by_key(&self, key: &str) -> NavegarResult<Account> {
        let record = self.records.get(key).ok_or_else(|| {
            NavegarError::configuration(format!("account key '{key}' not found in configuration"))
        })?;
        self.mark_in_use(key);
        Ok(Account::from_record(key, record))
    }

    /// Acquire a random account whose tags cover `features`.
    ///
    /// Accounts not currently marked in use are preferred; when every match
    /// is marked, one is picked anyway (collision reduction only).
    pub fn acquire_by_features(&self, features: &BTreeSet<String>) -> NavegarResult<Account> {
        let matches: Vec<&String> = self
            .records
            .iter()
            .filter(|(_, record)| record.features.is_superset(features))
            .map(|(key, _)| key)
            .collect();
        if matches.is_empty() {
            return Err(NavegarError::configuration(format!(
                "no account matching features {features:?} found in configuration"
            )));
        }

        let free: Vec<&String> = matches
            .iter()
            .copied()
            .filter(|key| !self.is_marked(key))
            .collect();
        let candidates = if free.is_empty() { &matches } else { &free };
        let key = candidates
            .choose(&mut rand::thread_rng())
            .copied()
            .expect("candidate list is non-empty");

        self.mark_in_use(key);
        let record = &self.records[key.as_str()];
        Ok(Account::from_record(key, record))
    }

    /// Return an account to the pool.
    ///
    /// Idempotent; a no-op for literal accounts.
    pub fn release(&self, account: &Account) {
        let Some(key) = account.key.as_deref() else {
            return;
        };
        if let Ok(mut in_use) = self.in_use.lock() {
            in_use.remove(key);
        }
        if let Some(path) = self.marker_path(key) {
            // Marker removal is best effort, same as creation.
            let _ = std::fs::remove_file(path);
        }
        trace!(key, "account released");
    }

    /// Whether the key is currently marked in use by this process
    #[must_use]
    pub fn is_in_use(&self, key: &str) -> bool {
        self.in_use.lock().map(|s| s.contains(key)).unwrap_or(false)
    }

    /// Number of accounts this process has marked in use
    #[must_use]
    pub fn in_use_count(&self) -> usize {
        self.in_use.lock().map(|s| s.len()).unwrap_or(0)
    }

    fn mark_in_use(&self, key: &str) {
        if let Ok(mut in_use) = self.in_use.lock() {
            in_use.insert(key.to_string());
        }
        if let Some(path) = self.marker_path(key) {
            if let Some(dir) = path.parent() {
                let _ = std::fs::create_dir_all(dir);
            }
            let _ = std::fs::write(path, format!("{}\n", std::process::id()));
        }
        trace!(key, "account marked in use");
    }

    fn is_marked(&self, key: &str) -> bool {
        if self.is_in_use(key) {
            return true;
        }
        self.marker_path(key).is_some_and(|path| path.exists())
    }

    fn marker_path(&self, key: &str) -> Option<PathBuf> {
        self.marker_dir
            .as_ref()
            .map(|dir| dir.join(format!("{key}.lock")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(username: &str, features: &[&str], site_link: bool) -> AccountRecord {
        AccountRecord {
            username: username.to_string(),
            email: Some(format!("{username}@quill.test")),
            password: "secret".to_string(),
            login_url: None,
            features: features.iter().map(ToString::to_string).collect(),
            site_link,
        }
    }

    fn pool() -> AccountPool {
        let mut records = HashMap::new();
        records.insert("defaultUser".to_string(), record("default", &[], false));
        records.insert(
            "commerceUser".to_string(),
            record("shop", &["commerce", "payments"], false),
        );
        records.insert(
            "linkedUserCi".to_string(),
            record("linked-ci", &["linked"], true),
        );
        AccountPool::new(records).without_markers()
    }

    #[test]
    fn test_acquire_by_key_marks_in_use() {
        let pool = pool();
        let account = pool.acquire_by_key("defaultUser").unwrap();
        assert_eq!(account.key.as_deref(), Some("defaultUser"));
        assert_eq!(account.login_name(), "default@quill.test");
        assert!(pool.is_in_use("defaultUser"));
    }

    #[test]
    fn test_acquire_unknown_key_is_configuration_error() {
        let pool = pool();
        let err = pool.acquire_by_key("ghostUser").unwrap_err();
        assert!(matches!(err, NavegarError::Configuration { .. }));
    }

    #[test]
    fn test_release_restores_pool_state() {
        let pool = pool();
        let account = pool.acquire_by_key("defaultUser").unwrap();
        pool.release(&account);
        assert_eq!(pool.in_use_count(), 0);
        // Releasing twice stays a no-op.
        pool.release(&account);
        assert_eq!(pool.in_use_count(), 0);
    }

    #[test]
    fn test_release_of_literal_account_is_noop() {
        let pool = pool();
        let literal = Account::literal("walk-in", "pw");
        pool.release(&literal);
        assert_eq!(pool.in_use_count(), 0);
    }

    #[test]
    fn test_acquire_by_features_requires_superset() {
        let pool = pool();
        let wanted: BTreeSet<String> = ["commerce".to_string()].into();
        let account = pool.acquire_by_features(&wanted).unwrap();
        assert_eq!(account.key.as_deref(), Some("commerceUser"));
    }

    #[test]
    fn test_acquire_by_features_never_partial_match() {
        let pool = pool();
        let wanted: BTreeSet<String> = ["commerce".to_string(), "multisite".to_string()].into();
        let err = pool.acquire_by_features(&wanted).unwrap_err();
        assert!(matches!(err, NavegarError::Configuration { .. }));
    }

    #[test]
    fn test_feature_acquire_prefers_free_accounts() {
        let mut records = HashMap::new();
        records.insert("a".to_string(), record("a", &["shared"], false));
        records.insert("b".to_string(), record("b", &["shared"], false));
        let pool = AccountPool::new(records).without_markers();
        let wanted: BTreeSet<String> = ["shared".to_string()].into();

        let first = pool.acquire_by_features(&wanted).unwrap();
        let second = pool.acquire_by_features(&wanted).unwrap();
        assert_ne!(first.key, second.key);

        // With every match taken, acquisition still succeeds.
        let third = pool.acquire_by_features(&wanted).unwrap();
        assert!(third.key.is_some());
    }

    #[test]
    fn test_acquire_dispatches_on_selector() {
        let pool = pool();
        let by_key = pool
            .acquire(&AccountSelector::by_key("defaultUser"))
            .unwrap();
        assert_eq!(by_key.key.as_deref(), Some("defaultUser"));

        let by_features = pool
            .acquire(&AccountSelector::by_features(["commerce"]))
            .unwrap();
        assert_eq!(by_features.key.as_deref(), Some("commerceUser"));
    }

    #[test]
    fn test_site_link_records_get_site_link_kind() {
        let pool = pool();
        let account = pool.acquire_by_key("linkedUserCi").unwrap();
        assert_eq!(account.kind, AccountKind::SiteLink);
    }

    #[test]
    fn test_marker_files_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut records = HashMap::new();
        records.insert("defaultUser".to_string(), record("default", &[], false));
        let pool = AccountPool::new(records).with_marker_dir(dir.path());

        let account = pool.acquire_by_key("defaultUser").unwrap();
        assert!(dir.path().join("defaultUser.lock").exists());
        pool.release(&account);
        assert!(!dir.path().join("defaultUser.lock").exists());
    }
}

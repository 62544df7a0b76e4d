//! Suite configuration.
//!
//! Configuration loads from a YAML file, then environment variables
//! override the fields CI shards vary per run (environment kind, locale,
//! screen size, headless, lab debug). Flags default to the least surprising
//! value so a bare config file still drives a local run.

use crate::account::{AccountRecord, AccountSelector};
use crate::result::NavegarResult;
use crate::wait::WaitOptions;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Which rendition of the platform the suite is pointed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvKind {
    /// The hosted service itself
    Hosted,
    /// Self-hosted site provisioned inside the CI shard
    Ci,
    /// Long-lived self-hosted staging site
    Staging,
}

impl Default for EnvKind {
    fn default() -> Self {
        Self::Hosted
    }
}

impl EnvKind {
    /// Whether the target is a self-hosted site linked to the service
    #[must_use]
    pub const fn is_self_hosted(self) -> bool {
        !matches!(self, Self::Hosted)
    }

    /// Default pool key for this environment's linked user
    #[must_use]
    pub const fn default_account_key(self) -> &'static str {
        match self {
            Self::Hosted => "defaultUser",
            Self::Ci => "linkedUserCi",
            Self::Staging => "linkedUserStaging",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "hosted" => Some(Self::Hosted),
            "ci" => Some(Self::Ci),
            "staging" => Some(Self::Staging),
            _ => None,
        }
    }
}

/// Viewport preset the browser runs at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenSize {
    /// Phone-sized viewport
    Mobile,
    /// Tablet viewport
    Tablet,
    /// Laptop viewport
    Laptop,
    /// Full desktop viewport
    Desktop,
}

impl Default for ScreenSize {
    fn default() -> Self {
        Self::Desktop
    }
}

impl ScreenSize {
    /// Viewport dimensions (width, height) in CSS pixels
    #[must_use]
    pub const fn dimensions(self) -> (u32, u32) {
        match self {
            Self::Mobile => (400, 1000),
            Self::Tablet => (1024, 1000),
            Self::Laptop => (1400, 790),
            Self::Desktop => (1440, 1000),
        }
    }

    /// Uppercase label used in artifact filenames
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Mobile => "MOBILE",
            Self::Tablet => "TABLET",
            Self::Laptop => "LAPTOP",
            Self::Desktop => "DESKTOP",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "mobile" => Some(Self::Mobile),
            "tablet" => Some(Self::Tablet),
            "laptop" => Some(Self::Laptop),
            "desktop" => Some(Self::Desktop),
            _ => None,
        }
    }
}

/// Full suite configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SuiteConfig {
    /// Environment the suite targets
    pub env: EnvKind,
    /// Root URL of the hosted application
    pub base_url: String,
    /// Default self-hosted test site slug, when the environment has one
    pub test_site: Option<String>,
    /// Locale under test
    pub locale: String,
    /// Viewport preset
    pub screen_size: ScreenSize,
    /// Remote device-lab mode
    pub lab: bool,
    /// Inject a lab breakpoint after failed scenarios (debug aid)
    pub lab_debug: bool,
    /// Capture a screenshot after every scenario, passing included
    pub save_all_screenshots: bool,
    /// Suppress screenshots entirely, failures included
    pub never_save_screenshots: bool,
    /// Quit the browser once the batch finishes
    pub close_browser_on_complete: bool,
    /// Run the browser without a visible display
    pub headless: bool,
    /// Bounded wait applied to each journey step, in milliseconds
    pub explicit_wait_ms: u64,
    /// Budget for each teardown hook, in milliseconds
    pub after_hook_timeout_ms: u64,
    /// Directory screenshots are written under
    pub screenshot_dir: PathBuf,
    /// Directory failure videos are written under
    pub video_dir: PathBuf,
    /// X display number used when a virtual display is needed
    pub display_number: u32,
    /// Account registry
    pub accounts: HashMap<String, AccountRecord>,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            env: EnvKind::default(),
            base_url: "https://app.quill.test".to_string(),
            test_site: None,
            locale: "en".to_string(),
            screen_size: ScreenSize::default(),
            lab: false,
            lab_debug: false,
            save_all_screenshots: false,
            never_save_screenshots: false,
            close_browser_on_complete: true,
            headless: false,
            explicit_wait_ms: 10_000,
            after_hook_timeout_ms: 60_000,
            screenshot_dir: PathBuf::from("screenshots"),
            video_dir: PathBuf::from("screenshots/videos"),
            display_number: 99,
            accounts: HashMap::new(),
        }
    }
}

impl SuiteConfig {
    /// Load from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> NavegarResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&raw)
    }

    /// Parse from a YAML string
    pub fn from_yaml_str(raw: &str) -> NavegarResult<Self> {
        let config: Self = serde_yaml_ng::from_str(raw)?;
        Ok(config)
    }

    /// Apply `NAVEGAR_*` environment-variable overrides
    #[must_use]
    pub fn apply_env_overrides(mut self) -> Self {
        if let Some(env) = std::env::var("NAVEGAR_ENV")
            .ok()
            .as_deref()
            .and_then(EnvKind::parse)
        {
            self.env = env;
        }
        if let Ok(locale) = std::env::var("NAVEGAR_LOCALE") {
            self.locale = locale;
        }
        if let Some(size) = std::env::var("NAVEGAR_SCREEN_SIZE")
            .ok()
            .as_deref()
            .and_then(ScreenSize::parse)
        {
            self.screen_size = size;
        }
        if std::env::var("NAVEGAR_HEADLESS").is_ok() {
            self.headless = true;
        }
        if std::env::var("NAVEGAR_LAB_DEBUG").is_ok() {
            self.lab_debug = true;
        }
        debug!(
            env = ?self.env,
            locale = %self.locale,
            screen = self.screen_size.label(),
            "configuration resolved"
        );
        self
    }

    /// Login page URL
    #[must_use]
    pub fn login_url(&self) -> String {
        format!("{}/log-in", self.base_url.trim_end_matches('/'))
    }

    /// Logout URL, visited to guarantee a clean session
    #[must_use]
    pub fn logout_url(&self) -> String {
        format!("{}/log-out", self.base_url.trim_end_matches('/'))
    }

    /// Locale label used in artifact filenames
    #[must_use]
    pub fn locale_label(&self) -> String {
        self.locale.to_uppercase()
    }

    /// Bounded wait applied to each journey step
    #[must_use]
    pub fn step_wait(&self) -> WaitOptions {
        WaitOptions::new(self.explicit_wait_ms)
    }

    /// Budget for each teardown hook
    #[must_use]
    pub fn after_hook_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.after_hook_timeout_ms)
    }

    /// Account selector used when a flow is built without one
    #[must_use]
    pub fn default_account_selector(&self) -> AccountSelector {
        AccountSelector::by_key(self.env.default_account_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SuiteConfig::default();
        assert_eq!(config.env, EnvKind::Hosted);
        assert!(!config.env.is_self_hosted());
        assert_eq!(config.login_url(), "https://app.quill.test/log-in");
        assert_eq!(config.logout_url(), "https://app.quill.test/log-out");
        assert_eq!(config.screen_size.label(), "DESKTOP");
    }

    #[test]
    fn test_yaml_parse() {
        let yaml = r#"
env: ci
baseUrl: "https://ci.quill.test"
testSite: "ci-fixture-site"
locale: fr
screenSize: tablet
lab: true
saveAllScreenshots: true
explicitWaitMs: 4000
accounts:
  defaultUser:
    username: default
    password: pw
  linkedUserCi:
    username: linked
    password: pw
    loginUrl: "https://ci-fixture-site.test/login"
    siteLink: true
    features: [linked]
"#;
        let config = SuiteConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.env, EnvKind::Ci);
        assert!(config.env.is_self_hosted());
        assert_eq!(config.test_site.as_deref(), Some("ci-fixture-site"));
        assert_eq!(config.screen_size, ScreenSize::Tablet);
        assert!(config.lab);
        assert!(config.save_all_screenshots);
        assert_eq!(config.explicit_wait_ms, 4000);
        assert_eq!(config.accounts.len(), 2);
        assert!(config.accounts["linkedUserCi"].site_link);
    }

    #[test]
    fn test_default_account_key_tracks_env() {
        assert_eq!(EnvKind::Hosted.default_account_key(), "defaultUser");
        assert_eq!(EnvKind::Ci.default_account_key(), "linkedUserCi");
        assert_eq!(EnvKind::Staging.default_account_key(), "linkedUserStaging");
    }

    #[test]
    fn test_env_overrides_apply() {
        std::env::set_var("NAVEGAR_LOCALE", "de");
        std::env::set_var("NAVEGAR_SCREEN_SIZE", "mobile");
        let config = SuiteConfig::default().apply_env_overrides();
        std::env::remove_var("NAVEGAR_LOCALE");
        std::env::remove_var("NAVEGAR_SCREEN_SIZE");
        assert_eq!(config.locale, "de");
        assert_eq!(config.screen_size, ScreenSize::Mobile);
    }

    #[test]
    fn test_screen_size_dimensions() {
        assert_eq!(ScreenSize::Mobile.dimensions(), (400, 1000));
        assert_eq!(ScreenSize::Desktop.dimensions(), (1440, 1000));
    }

    #[test]
    fn test_locale_label_uppercases() {
        let config = SuiteConfig {
            locale: "pt-br".to_string(),
            ..Default::default()
        };
        assert_eq!(config.locale_label(), "PT-BR");
    }

    #[test]
    fn test_step_wait_uses_explicit_wait() {
        let config = SuiteConfig {
            explicit_wait_ms: 2500,
            ..Default::default()
        };
        assert_eq!(config.step_wait().timeout_ms, 2500);
    }
}

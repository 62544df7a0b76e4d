//! Navegar: browser journey test harness for the Quill publishing platform.
//!
//! The harness layers page objects over an abstract automation driver,
//! composes them into user journeys (flows), and wraps the external test
//! runner with lifecycle hooks for artifact capture and reporting.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  test (#[tokio::test])                                       │
//! │    └─ BatchHooks ── start / after_scenario / finish          │
//! │    └─ LoginFlow ── AccountPool checkout                      │
//! │         └─ Page objects (Expect contract)                    │
//! │              └─ wait helpers (bounded)                       │
//! │                   └─ BrowserDriver ── CdpDriver | MockDriver │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

pub mod account;
#[cfg(feature = "browser")]
pub mod browser;
pub mod config;
pub mod display;
pub mod driver;
pub mod flow;
pub mod hooks;
pub mod locator;
pub mod media;
pub mod mock;
pub mod notifier;
pub mod page;
pub mod result;
pub mod tracing_support;
pub mod wait;

pub use account::{Account, AccountKind, AccountPool, AccountRecord, AccountSelector};
#[cfg(feature = "browser")]
pub use browser::{BrowserConfig, CdpDriver};
pub use config::{EnvKind, ScreenSize, SuiteConfig};
pub use driver::{BrowserDriver, ConsoleEntry, ConsoleLevel, ElementHandle, Screenshot};
pub use flow::LoginFlow;
pub use hooks::{BatchHooks, TestOutcome, TestReport};
pub use locator::Selector;
pub use notifier::{NotificationSink, TracingNotifier};
pub use result::{NavegarError, NavegarResult};
pub use wait::WaitOptions;

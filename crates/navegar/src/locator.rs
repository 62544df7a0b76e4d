//! Selector abstraction shared by the driver boundary and page objects.
//!
//! Selectors are the only coupling between a page object and the DOM it
//! wraps. Keeping them as a typed enum (rather than raw strings) lets the
//! mock driver and the CDP driver agree on a single canonical form.

use serde::{Deserialize, Serialize};

/// Selector for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selector {
    /// CSS selector (e.g. "button.editor-publish")
    Css(String),
    /// Test ID selector (data-testid attribute)
    TestId(String),
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a test ID selector
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// Canonical CSS form, as handed to the automation driver
    #[must_use]
    pub fn to_css(&self) -> String {
        match self {
            Self::Css(s) => s.clone(),
            Self::TestId(id) => format!("[data-testid='{id}']"),
        }
    }

    /// JavaScript query expression resolving to the element
    #[must_use]
    pub fn to_query(&self) -> String {
        let css = self.to_css();
        format!("document.querySelector({css:?})")
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_css())
    }
}

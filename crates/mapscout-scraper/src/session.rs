//! The page-session capability consumed by the engine.
//!
//! The engine never drives a browser directly. It reads page state through
//! this narrow interface, which keeps discovery and extraction testable
//! against scripted in-memory pages.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// What the engine can observe about one DOM element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    /// Rendered inner text, trimmed.
    #[serde(default)]
    pub text: String,
    /// The `aria-label` attribute, if present.
    #[serde(default)]
    pub aria_label: Option<String>,
    /// The resolved `href`, if the element is a link.
    #[serde(default)]
    pub href: Option<String>,
}

impl ElementSnapshot {
    /// Accessible label when non-empty, otherwise rendered text.
    #[must_use]
    pub fn label_or_text(&self) -> &str {
        match self.aria_label.as_deref().map(str::trim) {
            Some(label) if !label.is_empty() => label,
            _ => self.text.trim(),
        }
    }
}

/// One interactive page, able to represent a single navigation state.
pub trait PageSession: Send + Sync {
    /// Load `url` in the page.
    fn navigate(&self, url: &str) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Visible text of the whole document body.
    fn read_visible_text(&self) -> impl Future<Output = Result<String, SessionError>> + Send;

    /// Run `script` as the body of a function in the page and return its
    /// result as JSON.
    fn evaluate_script(
        &self,
        script: &str,
    ) -> impl Future<Output = Result<serde_json::Value, SessionError>> + Send;

    /// Snapshots of every element matching a CSS `selector`, in document order.
    fn find_elements(
        &self,
        selector: &str,
    ) -> impl Future<Output = Result<Vec<ElementSnapshot>, SessionError>> + Send;

    /// Return to the previous navigation state.
    fn go_back(&self) -> impl Future<Output = Result<(), SessionError>> + Send;
}

/// Acquires the page session for one run.
///
/// The session is released when the returned value is dropped, so the
/// orchestrator's ownership of it bounds the session lifetime on every exit
/// path.
pub trait SessionLauncher: Sync {
    type Session: PageSession;

    fn launch(&self) -> impl Future<Output = Result<Self::Session, SessionError>> + Send;
}

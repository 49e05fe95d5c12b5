use mapscout_core::ConfigError;
use thiserror::Error;

/// Failures reported by a [`crate::PageSession`] implementation.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to start browser session: {0}")]
    Launch(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("script evaluation failed: {reason}")]
    Script { reason: String },

    #[error("element lookup for \"{selector}\" failed: {reason}")]
    Element { selector: String, reason: String },
}

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error(transparent)]
    InvalidRequest(#[from] ConfigError),

    #[error("could not establish page session: {0}")]
    SessionStart(#[source] SessionError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("geocoding \"{region}\" failed: {reason}")]
    Geocode { region: String, reason: String },

    #[error("failed to write report to {path}: {reason}")]
    Report { path: String, reason: String },
}

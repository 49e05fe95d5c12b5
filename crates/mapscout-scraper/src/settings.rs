use std::time::Duration;

use mapscout_core::AppConfig;

/// Pacing and bounds for driving the map surface.
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub maps_base_url: String,
    /// Upper bound on waiting for the first candidate link after a search.
    pub results_wait: Duration,
    pub results_poll: Duration,
    /// Consecutive scrolls without new links before a zoom level is abandoned.
    pub max_empty_scrolls: u32,
    pub search_settle: Duration,
    pub scroll_settle: Duration,
    pub back_settle: Duration,
    /// Upper bound on waiting for a detail view's heading.
    pub detail_wait: Duration,
    pub detail_settle: Duration,
}

impl CrawlSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            maps_base_url: config.maps_base_url.clone(),
            results_wait: Duration::from_secs(config.results_wait_secs),
            results_poll: Duration::from_millis(config.results_poll_ms),
            max_empty_scrolls: config.max_empty_scrolls,
            search_settle: Duration::from_millis(config.search_settle_ms),
            scroll_settle: Duration::from_millis(config.scroll_settle_ms),
            back_settle: Duration::from_millis(config.back_settle_ms),
            detail_wait: Duration::from_secs(config.detail_wait_secs),
            detail_settle: Duration::from_millis(config.detail_settle_ms),
        }
    }

    /// Settings with every pause removed, for scripted sessions.
    #[must_use]
    pub fn without_pauses(maps_base_url: &str, max_empty_scrolls: u32) -> Self {
        Self {
            maps_base_url: maps_base_url.to_owned(),
            results_wait: Duration::ZERO,
            results_poll: Duration::ZERO,
            max_empty_scrolls,
            search_settle: Duration::ZERO,
            scroll_settle: Duration::ZERO,
            back_settle: Duration::ZERO,
            detail_wait: Duration::ZERO,
            detail_settle: Duration::ZERO,
        }
    }
}

/// Sleep for `pause` unless it is zero.
pub(crate) async fn settle(pause: Duration) {
    if !pause.is_zero() {
        tokio::time::sleep(pause).await;
    }
}

use std::path::PathBuf;

/// Runtime settings for a mapscout process, read from `MAPSCOUT_*` env vars.
///
/// Timing fields mirror the pacing of the interactive map surface: how long
/// to wait for results, how long to let the page settle after each action.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub log_level: String,
    pub maps_base_url: String,
    pub geocoder_url: String,
    pub http_timeout_secs: u64,
    pub geocoder_user_agent: String,
    pub site_user_agent: String,
    pub results_wait_secs: u64,
    pub results_poll_ms: u64,
    pub max_empty_scrolls: u32,
    pub search_settle_ms: u64,
    pub scroll_settle_ms: u64,
    pub back_settle_ms: u64,
    pub detail_wait_secs: u64,
    pub detail_settle_ms: u64,
    pub chrome_path: Option<PathBuf>,
    pub headless: bool,
    pub browser_lang: String,
}

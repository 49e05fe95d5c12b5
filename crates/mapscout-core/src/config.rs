use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let log_level = or_default("MAPSCOUT_LOG_LEVEL", "info");
    let maps_base_url = or_default("MAPSCOUT_MAPS_BASE_URL", "https://www.google.com/maps")
        .trim_end_matches('/')
        .to_string();
    let geocoder_url = or_default(
        "MAPSCOUT_GEOCODER_URL",
        "https://nominatim.openstreetmap.org/search",
    );
    let http_timeout_secs = parse_u64("MAPSCOUT_HTTP_TIMEOUT_SECS", "8")?;
    let geocoder_user_agent = or_default("MAPSCOUT_GEOCODER_USER_AGENT", "mapscout/0.1");
    let site_user_agent = or_default("MAPSCOUT_SITE_USER_AGENT", "Mozilla/5.0");

    let results_wait_secs = parse_u64("MAPSCOUT_RESULTS_WAIT_SECS", "12")?;
    let results_poll_ms = parse_u64("MAPSCOUT_RESULTS_POLL_MS", "800")?;
    let max_empty_scrolls = parse_u32("MAPSCOUT_MAX_EMPTY_SCROLLS", "10")?;
    if max_empty_scrolls == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "MAPSCOUT_MAX_EMPTY_SCROLLS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    let search_settle_ms = parse_u64("MAPSCOUT_SEARCH_SETTLE_MS", "3000")?;
    let scroll_settle_ms = parse_u64("MAPSCOUT_SCROLL_SETTLE_MS", "2000")?;
    let back_settle_ms = parse_u64("MAPSCOUT_BACK_SETTLE_MS", "1500")?;
    let detail_wait_secs = parse_u64("MAPSCOUT_DETAIL_WAIT_SECS", "10")?;
    let detail_settle_ms = parse_u64("MAPSCOUT_DETAIL_SETTLE_MS", "1500")?;

    let chrome_path = lookup("MAPSCOUT_CHROME_PATH")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from);
    let headless = parse_bool("MAPSCOUT_HEADLESS", &or_default("MAPSCOUT_HEADLESS", "true"))?;
    let browser_lang = or_default("MAPSCOUT_BROWSER_LANG", "pt-BR");

    Ok(AppConfig {
        log_level,
        maps_base_url,
        geocoder_url,
        http_timeout_secs,
        geocoder_user_agent,
        site_user_agent,
        results_wait_secs,
        results_poll_ms,
        max_empty_scrolls,
        search_settle_ms,
        scroll_settle_ms,
        back_settle_ms,
        detail_wait_secs,
        detail_settle_ms,
        chrome_path,
        headless,
        browser_lang,
    })
}

/// Parse a boolean flag. Accepts `true/false`, `1/0`, `yes/no` in any case.
fn parse_bool(var: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected a boolean, got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

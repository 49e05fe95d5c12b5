//! Contact enrichment: an email address scraped from the listing's own site
//! and a messaging deep link derived from its phone number.

use std::sync::LazyLock;
use std::time::Duration;

use percent_encoding::percent_decode_str;
use regex::Regex;
use reqwest::Client;

use crate::error::ScraperError;

/// Fewer digits than this cannot be a dialable number.
const MIN_PHONE_DIGITS: usize = 7;

const MESSAGING_BASE: &str = "https://wa.me/";

/// Domain fragments of template/placeholder addresses that site builders
/// leave in their markup.
const EXCLUDED_EMAIL_DOMAINS: &[&str] = &["example", "wix", "wordpress", "seusite", "domain"];

static MAILTO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)href\s*=\s*["']?mailto:([^"'\s>]+)"#).expect("valid mailto regex")
});
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\w.+\-]+@[\w.\-]+\.[a-zA-Z]{2,}").expect("valid email regex")
});
static NON_TEXT_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b.*?</script>|<style\b.*?</style>").expect("valid block regex")
});
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

/// Fetches listing sites looking for a contact email.
pub struct ContactEnricher {
    client: Client,
}

impl ContactEnricher {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// Best-effort email lookup on `site`. Any failure yields `None`.
    pub async fn find_email(&self, site: &str) -> Option<String> {
        if !site.starts_with("http") {
            return None;
        }
        match self.fetch_html(site).await {
            Ok(html) => extract_email(&html),
            Err(e) => {
                tracing::debug!(site, error = %e, "site fetch failed");
                None
            }
        }
    }

    async fn fetch_html(&self, site: &str) -> Result<String, ScraperError> {
        let body = self
            .client
            .get(site)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    }
}

/// First usable email in `html`: a `mailto:` target wins over addresses
/// found in the visible text.
#[must_use]
pub fn extract_email(html: &str) -> Option<String> {
    mailto_target(html).or_else(|| email_in_text(html))
}

fn mailto_target(html: &str) -> Option<String> {
    MAILTO_RE.captures_iter(html).find_map(|caps| {
        let raw = caps.get(1)?.as_str();
        let address = raw.split('?').next().unwrap_or_default();
        let decoded = percent_decode_str(address).decode_utf8().ok()?;
        let decoded = decoded.trim();
        let (local, domain) = decoded.split_once('@')?;
        (!local.is_empty() && domain.contains('.')).then(|| decoded.to_owned())
    })
}

fn email_in_text(html: &str) -> Option<String> {
    let without_blocks = NON_TEXT_BLOCK_RE.replace_all(html, " ");
    let text = TAG_RE.replace_all(&without_blocks, " ");
    EMAIL_RE
        .find_iter(&text)
        .map(|m| m.as_str())
        .find(|email| !is_placeholder(email))
        .map(str::to_owned)
}

fn is_placeholder(email: &str) -> bool {
    let domain = email
        .rsplit_once('@')
        .map_or("", |(_, domain)| domain)
        .to_ascii_lowercase();
    EXCLUDED_EMAIL_DOMAINS
        .iter()
        .any(|excluded| domain.contains(excluded))
}

/// `wa.me` link built from the digits of `phone`, exactly as captured.
///
/// Returns `None` when fewer than seven digits remain.
#[must_use]
pub fn messaging_link(phone: &str) -> Option<String> {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    (digits.len() >= MIN_PHONE_DIGITS).then(|| format!("{MESSAGING_BASE}{digits}"))
}

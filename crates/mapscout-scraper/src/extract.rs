//! Listing detail extraction with ordered fallback strategies.
//!
//! The detail view has no contractually stable markup, so each field is
//! read by a list of strategies tried in order; the first one producing a
//! plausible value wins. Strategies are pure functions over a captured
//! [`DetailPage`], and any field no strategy can read is left unknown
//! (empty string or zero) instead of failing the listing.

use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::Instant;

use regex::Regex;

use crate::session::{ElementSnapshot, PageSession};
use crate::settings::{settle, CrawlSettings};

pub const NAME_SELECTORS: &[&str] = &["h1", "h1.DUwDvf", "h1.fontHeadlineLarge"];
pub const CATEGORY_SELECTORS: &[&str] = &[
    "button.DkEaL",
    "button[jsaction*='category']",
    "span.mgr77e",
    ".fontBodyMedium button",
];
pub const RATING_SELECTORS: &[&str] = &[
    r#"[aria-label*="estrela"]"#,
    r#"[aria-label*="star"]"#,
    r#"[aria-label*="rating"]"#,
    r#"[aria-label*="nota"]"#,
];
pub const REVIEW_SELECTORS: &[&str] = &[
    r#"[aria-label*="avalia"]"#,
    r#"[aria-label*="review"]"#,
    r#"[aria-label*="opini"]"#,
];
pub const ADDRESS_SELECTOR: &str = r#"[data-item-id="address"]"#;
pub const PHONE_SELECTOR: &str = r#"[data-item-id^="phone"]"#;
pub const SITE_SELECTOR: &str = r#"[data-item-id="authority"]"#;
pub const EXTERNAL_LINK_SELECTOR: &str = "a[href^='http']";

const MAX_CATEGORY_LEN: usize = 80;

static RATING_IN_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d[,.]\d|[1-5])").expect("valid rating label regex"));
static RATING_IN_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([1-5][,.]\d)\s*\(").expect("valid rating text regex"));
static REVIEWS_IN_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([0-9][0-9.,]*)\s*(?:avalia|review|opini)").expect("valid reviews label regex")
});
static REVIEWS_AFTER_RATING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[1-5][,.]\d\s*\(([0-9][0-9.,]*)\)").expect("valid reviews paren regex")
});
static REVIEWS_BEFORE_WORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([0-9][0-9.,]*)\s+(?:avalia|reviews?\b|opini)").expect("valid reviews word regex")
});
static ADDRESS_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:endere[çc]o|address)[:\s]*").expect("valid address prefix regex")
});
static ADDRESS_IN_TEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:Rua|Av(?:enida)?|Al(?:ameda)?|R\.|Estrada|Rod(?:ovia)?|Praça)[^\n]{5,80}")
        .expect("valid street regex")
});
static PHONE_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:telefone|phone)[:\s]*").expect("valid phone prefix regex")
});
static PHONE_IN_TEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+\d{1,3}[\s\-]?)?\(?\d{2,3}\)?[\s\-]?\d{4,5}[\s\-]\d{4}")
        .expect("valid phone regex")
});

/// Captured state of one listing's detail view.
#[derive(Debug, Clone, Default)]
pub struct DetailPage {
    elements: HashMap<String, Vec<ElementSnapshot>>,
    text: String,
    /// Host of the map surface the page was opened from.
    map_host: Option<String>,
}

impl DetailPage {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            elements: HashMap::new(),
            text: text.into(),
            map_host: None,
        }
    }

    /// Treat links to the host of `maps_base_url` as internal to the map surface.
    #[must_use]
    pub fn with_map_host(mut self, maps_base_url: &str) -> Self {
        self.map_host = reqwest::Url::parse(maps_base_url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_ascii_lowercase));
        self
    }

    /// Record the elements matched by `selector`.
    #[must_use]
    pub fn with_elements(mut self, selector: &str, elements: Vec<ElementSnapshot>) -> Self {
        self.elements.insert(selector.to_owned(), elements);
        self
    }

    /// Elements matched by `selector` at capture time; empty if none.
    #[must_use]
    pub fn select(&self, selector: &str) -> &[ElementSnapshot] {
        self.elements
            .get(selector)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Read every selector the strategies consult, plus the visible text.
    ///
    /// A selector that fails to evaluate is recorded as matching nothing.
    pub async fn capture<S: PageSession>(session: &S) -> Self {
        let text = match session.read_visible_text().await {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!(error = %e, "could not read detail text");
                String::new()
            }
        };

        let mut page = Self::new(text);
        for selector in all_selectors() {
            let elements = match session.find_elements(selector).await {
                Ok(elements) => elements,
                Err(e) => {
                    tracing::debug!(selector, error = %e, "selector lookup failed");
                    Vec::new()
                }
            };
            page.elements.insert(selector.to_owned(), elements);
        }
        page
    }
}

fn all_selectors() -> impl Iterator<Item = &'static str> {
    NAME_SELECTORS
        .iter()
        .chain(CATEGORY_SELECTORS)
        .chain(RATING_SELECTORS)
        .chain(REVIEW_SELECTORS)
        .copied()
        .chain([
            ADDRESS_SELECTOR,
            PHONE_SELECTOR,
            SITE_SELECTOR,
            EXTERNAL_LINK_SELECTOR,
        ])
}

/// Fields read from a detail view, before filtering and enrichment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedListing {
    pub name: String,
    pub category: String,
    pub address: String,
    pub phone: String,
    pub site: String,
    /// `0.0` when no rating was found.
    pub stars: f64,
    /// `0` when no review count was found.
    pub reviews: u64,
}

type Strategy<T> = fn(&DetailPage) -> Option<T>;

const NAME_STRATEGIES: &[Strategy<String>] = &[name_from_heading];
const CATEGORY_STRATEGIES: &[Strategy<String>] = &[category_near_name];
const RATING_STRATEGIES: &[Strategy<f64>] = &[rating_from_labels, rating_from_text];
const REVIEW_STRATEGIES: &[Strategy<u64>] =
    &[reviews_from_labels, reviews_after_rating, reviews_before_word];
const ADDRESS_STRATEGIES: &[Strategy<String>] = &[address_from_field, address_from_text];
const PHONE_STRATEGIES: &[Strategy<String>] = &[phone_from_field, phone_from_text];
const SITE_STRATEGIES: &[Strategy<String>] = &[site_from_field, site_from_external_link];

fn first_match<T>(page: &DetailPage, strategies: &[Strategy<T>]) -> Option<T> {
    strategies.iter().find_map(|strategy| strategy(page))
}

/// Extract every field of `page`, leaving unreadable fields unknown.
#[must_use]
pub fn extract_listing(page: &DetailPage) -> ExtractedListing {
    ExtractedListing {
        name: first_match(page, NAME_STRATEGIES).unwrap_or_default(),
        category: first_match(page, CATEGORY_STRATEGIES).unwrap_or_default(),
        address: first_match(page, ADDRESS_STRATEGIES).unwrap_or_default(),
        phone: first_match(page, PHONE_STRATEGIES).unwrap_or_default(),
        site: first_match(page, SITE_STRATEGIES).unwrap_or_default(),
        stars: first_match(page, RATING_STRATEGIES).unwrap_or(0.0),
        reviews: first_match(page, REVIEW_STRATEGIES).unwrap_or(0),
    }
}

/// Wait (bounded) for the detail heading, then let the view settle.
pub async fn wait_for_detail<S: PageSession>(session: &S, settings: &CrawlSettings) {
    let started = Instant::now();
    loop {
        let has_heading = session
            .find_elements("h1")
            .await
            .is_ok_and(|els| !els.is_empty());
        if has_heading || started.elapsed() >= settings.detail_wait {
            break;
        }
        settle(settings.results_poll).await;
    }
    settle(settings.detail_settle).await;
}

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn name_from_heading(page: &DetailPage) -> Option<String> {
    NAME_SELECTORS.iter().find_map(|sel| {
        page.select(sel)
            .iter()
            .map(|el| el.text.trim())
            .find(|t| t.chars().count() > 1)
            .map(str::to_owned)
    })
}

fn category_near_name(page: &DetailPage) -> Option<String> {
    CATEGORY_SELECTORS.iter().find_map(|sel| {
        page.select(sel)
            .iter()
            .map(|el| el.text.trim())
            .find(|t| !t.is_empty() && t.chars().count() < MAX_CATEGORY_LEN)
            .map(str::to_owned)
    })
}

fn parse_decimal(raw: &str) -> Option<f64> {
    raw.replace(',', ".").parse::<f64>().ok()
}

fn plausible_rating(value: f64) -> Option<f64> {
    (1.0..=5.0).contains(&value).then_some(value)
}

fn rating_from_labels(page: &DetailPage) -> Option<f64> {
    RATING_SELECTORS.iter().find_map(|sel| {
        page.select(sel).iter().find_map(|el| {
            let label = el.aria_label.as_deref()?;
            let m = RATING_IN_LABEL_RE.captures(label)?.get(1)?;
            parse_decimal(m.as_str()).and_then(plausible_rating)
        })
    })
}

fn rating_from_text(page: &DetailPage) -> Option<f64> {
    let m = RATING_IN_TEXT_RE.captures(page.text())?.get(1)?;
    parse_decimal(m.as_str()).and_then(plausible_rating)
}

/// `"1.234"`/`"1,234"` → `1234`. Zero counts as not found.
fn parse_count(raw: &str) -> Option<u64> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    digits.parse::<u64>().ok().filter(|n| *n > 0)
}

fn reviews_from_labels(page: &DetailPage) -> Option<u64> {
    REVIEW_SELECTORS.iter().find_map(|sel| {
        page.select(sel).iter().find_map(|el| {
            let label = el.aria_label.as_deref()?;
            let m = REVIEWS_IN_LABEL_RE.captures(label)?.get(1)?;
            parse_count(m.as_str())
        })
    })
}

fn reviews_after_rating(page: &DetailPage) -> Option<u64> {
    let m = REVIEWS_AFTER_RATING_RE.captures(page.text())?.get(1)?;
    parse_count(m.as_str())
}

fn reviews_before_word(page: &DetailPage) -> Option<u64> {
    let m = REVIEWS_BEFORE_WORD_RE.captures(page.text())?.get(1)?;
    parse_count(m.as_str())
}

fn tagged_field(page: &DetailPage, selector: &str, prefix: &Regex) -> Option<String> {
    let el = page.select(selector).first()?;
    let value = prefix.replace(el.label_or_text(), "").trim().to_owned();
    (!value.is_empty()).then_some(value)
}

fn address_from_field(page: &DetailPage) -> Option<String> {
    tagged_field(page, ADDRESS_SELECTOR, &ADDRESS_PREFIX_RE)
}

fn address_from_text(page: &DetailPage) -> Option<String> {
    ADDRESS_IN_TEXT_RE
        .find(page.text())
        .map(|m| m.as_str().trim().to_owned())
}

fn phone_from_field(page: &DetailPage) -> Option<String> {
    tagged_field(page, PHONE_SELECTOR, &PHONE_PREFIX_RE)
}

fn phone_from_text(page: &DetailPage) -> Option<String> {
    PHONE_IN_TEXT_RE
        .find(page.text())
        .map(|m| m.as_str().trim().to_owned())
}

fn site_from_field(page: &DetailPage) -> Option<String> {
    page.select(SITE_SELECTOR)
        .first()
        .and_then(|el| el.href.as_deref())
        .map(str::trim)
        .filter(|href| href.starts_with("http"))
        .map(str::to_owned)
}

fn site_from_external_link(page: &DetailPage) -> Option<String> {
    page.select(EXTERNAL_LINK_SELECTOR)
        .iter()
        .filter_map(|el| el.href.as_deref())
        .map(str::trim)
        .find(|href| {
            href.starts_with("http") && !points_at_map_host(href, page.map_host.as_deref())
        })
        .map(str::to_owned)
}

/// Links back into the map/search surface, its share links or asset hosts.
fn points_at_map_host(href: &str, map_host: Option<&str>) -> bool {
    let Ok(url) = reqwest::Url::parse(href) else {
        return true;
    };
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    if map_host.is_some_and(|map| host == map || host.ends_with(&format!(".{map}"))) {
        return true;
    }
    host.contains("google")
        || host.contains("gstatic")
        || host.contains("goo.gl")
        || host.split('.').any(|label| label == "maps")
        || url.path().starts_with("/maps")
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;

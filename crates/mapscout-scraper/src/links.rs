//! Candidate link discovery and canonicalization.

use std::fmt;

use crate::session::PageSession;

/// Path marker shared by every listing detail link.
const PLACE_MARKER: &str = "/maps/place/";
/// Sub-resources of a detail view that are not listings themselves.
const EXCLUDED_MARKERS: &[&str] = &["/photos/", "/reviews/"];

/// Collects the raw `href` of every listing anchor currently in the DOM.
///
/// Deliberately selector-free apart from the URL shape, which is the one
/// marker the map surface has kept stable.
pub const DISCOVER_LINKS_SCRIPT: &str = r#"
var anchors = document.querySelectorAll('a[href*="/maps/place/"]');
var hrefs = [];
anchors.forEach(function (a) { if (a.href) { hrefs.push(a.href); } });
return hrefs;
"#;

/// A listing's detail-view link with tracking parameters removed.
///
/// Two links that differ only in their query string or fragment compare
/// equal, which makes this the dedup key for the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CandidateLink(String);

impl CandidateLink {
    /// Canonicalizes `href` if it points at a listing detail view.
    ///
    /// Returns `None` for non-listing links and for photo/review sub-pages.
    #[must_use]
    pub fn parse(href: &str) -> Option<Self> {
        let canonical = canonicalize(href);
        if canonical.is_empty()
            || !canonical.contains(PLACE_MARKER)
            || EXCLUDED_MARKERS.iter().any(|m| canonical.contains(m))
        {
            return None;
        }
        Some(Self(canonical.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CandidateLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strips the query string and fragment. Idempotent.
#[must_use]
pub fn canonicalize(href: &str) -> &str {
    let end = href.find(['?', '#']).unwrap_or(href.len());
    href[..end].trim()
}

/// Turns raw hrefs into unique candidate links, preserving first-seen order.
#[must_use]
pub fn collect_candidates<'a, I>(hrefs: I) -> Vec<CandidateLink>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = std::collections::HashSet::new();
    hrefs
        .into_iter()
        .filter_map(CandidateLink::parse)
        .filter(|link| seen.insert(link.clone()))
        .collect()
}

/// Returns the candidate links visible on the current page.
///
/// A failed script or an unexpected result shape yields an empty list:
/// the page may be mid-render, and the caller polls again anyway.
pub async fn discover_links<S: PageSession>(session: &S) -> Vec<CandidateLink> {
    let value = match session.evaluate_script(DISCOVER_LINKS_SCRIPT).await {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(error = %e, "link discovery script failed");
            return Vec::new();
        }
    };

    match value.as_array() {
        Some(items) => collect_candidates(items.iter().filter_map(serde_json::Value::as_str)),
        None => Vec::new(),
    }
}

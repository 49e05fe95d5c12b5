//! Scroll/zoom pagination over the map-search results feed.
//!
//! For one keyword the controller walks the zoom plan from most to least
//! specific. At each zoom it opens the search, waits for the first listing
//! link, then alternates "discover new links → hand each to the processor →
//! scroll" until the target is reached, the feed signals its end, or too
//! many scrolls in a row surface nothing new.

use std::collections::HashSet;
use std::future::Future;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::events::EventSink;
use crate::links::{discover_links, CandidateLink};
use crate::search_url::zoom_label;
use crate::session::PageSession;
use crate::settings::{settle, CrawlSettings};

/// Scrolls the results feed, falling back to the window when no feed
/// container overflows. Returns which element was scrolled.
pub const SCROLL_RESULTS_SCRIPT: &str = r#"
var selectors = [
  'div[role="feed"]',
  'div[aria-label*="resultado"]',
  'div[aria-label*="result"]',
  'div.m6QErb[aria-label]',
  'div.m6QErb'
];
for (var i = 0; i < selectors.length; i++) {
  var el = document.querySelector(selectors[i]);
  if (el && el.scrollHeight > el.clientHeight) {
    el.scrollBy(0, 3000);
    return "feed:" + selectors[i];
  }
}
window.scrollBy(0, 3000);
return "window";
"#;

/// Phrases the map surface shows once the feed has no more results.
const END_OF_RESULTS_MARKERS: &[&str] = &[
    "chegou ao final",
    "you've reached the end",
    "fim da lista",
    "no more results",
    "nenhum resultado",
    "no results found",
    "não foram encontrados",
    "we couldn't find",
];

/// Whether the page text carries an end-of-results signal.
#[must_use]
pub fn is_end_of_results(page_text: &str) -> bool {
    let lowered = page_text.to_lowercase();
    END_OF_RESULTS_MARKERS.iter().any(|m| lowered.contains(m))
}

/// Pagination states for one keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Searching(u8),
    Scrolling(u8),
    ExhaustedZoom(u8),
    TargetReached,
    ZoomsExhausted,
    Cancelled,
}

/// How a keyword's pagination ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordOutcome {
    TargetReached,
    /// Every zoom level ran dry before the target was met.
    ZoomsExhausted,
    Cancelled,
}

/// Receives each newly discovered link for evaluation.
pub trait LinkProcessor: Send {
    /// Links accepted earlier in the run; never handed out again.
    fn already_accepted(&self, link: &CandidateLink) -> bool;

    /// Whether the current keyword has enough accepted listings.
    fn target_reached(&self) -> bool;

    /// Evaluate one listing. The page must be back on the results feed
    /// when the returned future completes.
    fn process(&mut self, link: CandidateLink) -> impl Future<Output = ()> + Send;
}

/// Pagination controller for a single keyword.
pub struct KeywordSearch<'a, S> {
    session: &'a S,
    settings: &'a CrawlSettings,
    cancel: &'a CancellationToken,
    events: &'a EventSink,
    /// Links already handed to the processor for this keyword, accepted or not.
    keyword_seen: HashSet<CandidateLink>,
}

impl<'a, S: PageSession> KeywordSearch<'a, S> {
    pub fn new(
        session: &'a S,
        settings: &'a CrawlSettings,
        cancel: &'a CancellationToken,
        events: &'a EventSink,
    ) -> Self {
        Self {
            session,
            settings,
            cancel,
            events,
            keyword_seen: HashSet::new(),
        }
    }

    /// Links this keyword has already evaluated.
    #[must_use]
    pub fn evaluated(&self) -> &HashSet<CandidateLink> {
        &self.keyword_seen
    }

    /// Drive the zoom plan until the target is reached, zooms run out, or
    /// the run is cancelled.
    pub async fn run<P, F>(&mut self, zooms: &[u8], url_for_zoom: F, processor: &mut P) -> KeywordOutcome
    where
        P: LinkProcessor,
        F: Fn(u8) -> String,
    {
        let mut zoom_index = 0;
        let mut state = zooms
            .first()
            .map_or(SearchState::ZoomsExhausted, |z| SearchState::Searching(*z));

        loop {
            tracing::trace!(?state, "pagination state");
            state = match state {
                SearchState::Searching(zoom) => {
                    if self.cancel.is_cancelled() {
                        SearchState::Cancelled
                    } else if processor.target_reached() {
                        SearchState::TargetReached
                    } else {
                        self.open_results(zoom, &url_for_zoom(zoom)).await
                    }
                }
                SearchState::Scrolling(zoom) => self.scroll_results(zoom, processor).await,
                SearchState::ExhaustedZoom(_) => {
                    zoom_index += 1;
                    zooms
                        .get(zoom_index)
                        .map_or(SearchState::ZoomsExhausted, |z| SearchState::Searching(*z))
                }
                SearchState::TargetReached => return KeywordOutcome::TargetReached,
                SearchState::ZoomsExhausted => return KeywordOutcome::ZoomsExhausted,
                SearchState::Cancelled => return KeywordOutcome::Cancelled,
            };
        }
    }

    /// Open the search for `zoom` and wait for the first listing link.
    async fn open_results(&mut self, zoom: u8, url: &str) -> SearchState {
        let label = zoom_label(zoom);
        self.events.detail(format!("Zoom: {label} | {}", truncate(url, 80)));

        if let Err(e) = self.session.navigate(url).await {
            self.events
                .warning(format!("Could not open search at zoom {label}: {e}"));
            return SearchState::ExhaustedZoom(zoom);
        }
        settle(self.settings.search_settle).await;

        if self.wait_for_results().await {
            SearchState::Scrolling(zoom)
        } else if self.cancel.is_cancelled() {
            SearchState::Cancelled
        } else {
            self.events.warning(format!(
                "No results loaded (zoom {label}). Trying next zoom..."
            ));
            SearchState::ExhaustedZoom(zoom)
        }
    }

    /// Poll for at least one listing link, bounded by `results_wait`.
    /// Always polls at least once.
    async fn wait_for_results(&self) -> bool {
        let started = Instant::now();
        loop {
            if !discover_links(self.session).await.is_empty() {
                return true;
            }
            if self.cancel.is_cancelled() || started.elapsed() >= self.settings.results_wait {
                return false;
            }
            settle(self.settings.results_poll).await;
        }
    }

    async fn scroll_results<P: LinkProcessor>(&mut self, zoom: u8, processor: &mut P) -> SearchState {
        let mut page_seen: HashSet<CandidateLink> = HashSet::new();
        let mut empty_scrolls: u32 = 0;

        loop {
            if self.cancel.is_cancelled() {
                return SearchState::Cancelled;
            }
            if processor.target_reached() {
                return SearchState::TargetReached;
            }
            if empty_scrolls >= self.settings.max_empty_scrolls {
                tracing::debug!(zoom, empty_scrolls, "no new links after repeated scrolling");
                return SearchState::ExhaustedZoom(zoom);
            }

            let fresh: Vec<CandidateLink> = discover_links(self.session)
                .await
                .into_iter()
                .filter(|link| {
                    !page_seen.contains(link)
                        && !self.keyword_seen.contains(link)
                        && !processor.already_accepted(link)
                })
                .collect();

            if fresh.is_empty() {
                empty_scrolls += 1;
            } else {
                empty_scrolls = 0;
                page_seen.extend(fresh.iter().cloned());
                self.events.detail(format!(
                    "+{} links | total on page: {}",
                    fresh.len(),
                    page_seen.len()
                ));

                for link in fresh {
                    if self.cancel.is_cancelled() {
                        return SearchState::Cancelled;
                    }
                    if processor.target_reached() {
                        return SearchState::TargetReached;
                    }
                    self.keyword_seen.insert(link.clone());
                    processor.process(link).await;
                }
            }

            if processor.target_reached() {
                return SearchState::TargetReached;
            }

            let page_text = self.session.read_visible_text().await.unwrap_or_default();
            if is_end_of_results(&page_text) {
                self.events.detail(format!(
                    "End of results (zoom {}). Trying a wider zoom...",
                    zoom_label(zoom)
                ));
                return SearchState::ExhaustedZoom(zoom);
            }

            match self.session.evaluate_script(SCROLL_RESULTS_SCRIPT).await {
                Ok(method) => tracing::trace!(%method, "scrolled results"),
                Err(e) => tracing::debug!(error = %e, "scroll script failed"),
            }
            settle(self.settings.scroll_settle).await;
        }
    }
}

/// Truncate to at most `max` characters for log lines.
pub(crate) fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

//! Scripted in-memory page session shared by the integration tests.
//!
//! A [`ScriptedSite`] maps search URLs to result feeds (batches of listing
//! hrefs revealed one scroll at a time) and listing links to detail pages.
//! [`ScriptedSession`] plays that site back through [`PageSession`] and
//! records every navigation into a [`BrowserLog`] the test can inspect after
//! the run has dropped the session.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::future::{ready, Future};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio_util::sync::CancellationToken;

use mapscout_core::{ListingRecord, SearchRequest};
use mapscout_scraper::extract::{
    ADDRESS_SELECTOR, PHONE_SELECTOR, RATING_SELECTORS, REVIEW_SELECTORS, SITE_SELECTOR,
};
use mapscout_scraper::{
    DetailPage, ElementSnapshot, EventSink, PageSession, ReportWriter, RunEvent, ScraperError,
    SessionError, SessionLauncher, DISCOVER_LINKS_SCRIPT, SCROLL_RESULTS_SCRIPT,
};

pub const MAPS_BASE: &str = "https://maps.test/maps";

/// Canonical detail link for a listing slug.
pub fn place(slug: &str) -> String {
    format!("{MAPS_BASE}/place/{slug}/data=!4m2!3d-23.1")
}

/// The same link as the feed renders it, with tracking parameters.
pub fn tracked(slug: &str) -> String {
    format!("{}?authuser=0&hl=pt-BR&entry=ttu", place(slug))
}

/// Detail fields used to build a synthetic listing page.
pub struct Listing<'a> {
    pub name: &'a str,
    pub stars: &'a str,
    pub reviews: &'a str,
    pub address: &'a str,
    pub phone: &'a str,
    pub site: &'a str,
}

impl Default for Listing<'_> {
    fn default() -> Self {
        Self {
            name: "Padaria",
            stars: "4,5",
            reviews: "120",
            address: "Rua Capitão Carlos de Moura, 100 - Centro, Caçapava - SP",
            phone: "(12) 3652-1234",
            site: "",
        }
    }
}

fn labelled(label: String) -> ElementSnapshot {
    ElementSnapshot {
        aria_label: Some(label),
        ..ElementSnapshot::default()
    }
}

pub fn detail_page(listing: &Listing<'_>) -> DetailPage {
    let mut page = DetailPage::new(format!("{}\n{}", listing.name, listing.address))
        .with_elements(
            "h1",
            vec![ElementSnapshot {
                text: listing.name.to_string(),
                ..ElementSnapshot::default()
            }],
        )
        .with_elements(
            RATING_SELECTORS[0],
            vec![labelled(format!("{} estrelas", listing.stars))],
        )
        .with_elements(
            REVIEW_SELECTORS[0],
            vec![labelled(format!("{} avaliações", listing.reviews))],
        )
        .with_elements(
            ADDRESS_SELECTOR,
            vec![labelled(format!("Endereço: {}", listing.address))],
        )
        .with_elements(
            PHONE_SELECTOR,
            vec![labelled(format!("Telefone: {}", listing.phone))],
        );
    if !listing.site.is_empty() {
        page = page.with_elements(
            SITE_SELECTOR,
            vec![ElementSnapshot {
                href: Some(listing.site.to_string()),
                ..ElementSnapshot::default()
            }],
        );
    }
    page
}

struct Feed {
    /// `batches[i]` becomes visible after `i` scrolls.
    batches: Vec<Vec<String>>,
    /// Whether the end-of-list marker shows once every batch is visible.
    ends: bool,
}

#[derive(Default)]
pub struct ScriptedSite {
    feeds: HashMap<String, Feed>,
    details: HashMap<String, DetailPage>,
    broken: HashSet<String>,
    cancel_on: HashMap<String, CancellationToken>,
}

impl ScriptedSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(mut self, url: impl Into<String>, batches: Vec<Vec<String>>, ends: bool) -> Self {
        self.feeds.insert(url.into(), Feed { batches, ends });
        self
    }

    pub fn listing(mut self, slug: &str, listing: &Listing<'_>) -> Self {
        self.details.insert(place(slug), detail_page(listing));
        self
    }

    /// Navigating to this listing fails.
    pub fn broken(mut self, slug: &str) -> Self {
        self.broken.insert(place(slug));
        self
    }

    /// Cancel `token` the moment this listing is opened.
    pub fn cancel_when_opening(self, slug: &str, token: CancellationToken) -> Self {
        self.cancel_when_visiting(place(slug), token)
    }

    /// Cancel `token` the moment `url` is navigated to.
    pub fn cancel_when_visiting(
        mut self,
        url: impl Into<String>,
        token: CancellationToken,
    ) -> Self {
        self.cancel_on.insert(url.into(), token);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Page {
    Blank,
    Feed { url: String, scrolls: usize },
    Detail(String),
    Unknown(String),
}

#[derive(Debug, Default)]
pub struct BrowserLog {
    pub launches: usize,
    pub navigations: Vec<String>,
    pub backs: usize,
    pub released: bool,
}

impl BrowserLog {
    pub fn visits(&self, url: &str) -> usize {
        self.navigations.iter().filter(|n| *n == url).count()
    }
}

struct Navigation {
    current: Page,
    history: Vec<Page>,
}

pub struct ScriptedSession {
    site: Arc<ScriptedSite>,
    nav: Mutex<Navigation>,
    log: Arc<Mutex<BrowserLog>>,
}

impl ScriptedSession {
    fn open(&self, url: &str) -> Result<(), SessionError> {
        self.log.lock().unwrap().navigations.push(url.to_string());
        if let Some(token) = self.site.cancel_on.get(url) {
            token.cancel();
        }
        let broken = self.site.broken.contains(url);

        // A failed load still leaves an error page in the history.
        let next = if broken {
            Page::Unknown(url.to_string())
        } else if self.site.feeds.contains_key(url) {
            Page::Feed {
                url: url.to_string(),
                scrolls: 0,
            }
        } else if self.site.details.contains_key(url) {
            Page::Detail(url.to_string())
        } else {
            Page::Unknown(url.to_string())
        };
        let mut nav = self.nav.lock().unwrap();
        let previous = std::mem::replace(&mut nav.current, next);
        nav.history.push(previous);
        if broken {
            return Err(SessionError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_CONNECTION_RESET".to_string(),
            });
        }
        Ok(())
    }

    fn visible_hrefs(&self) -> Vec<String> {
        let nav = self.nav.lock().unwrap();
        match &nav.current {
            Page::Feed { url, scrolls } => self.site.feeds[url]
                .batches
                .iter()
                .take(scrolls + 1)
                .flatten()
                .cloned()
                .collect(),
            _ => Vec::new(),
        }
    }

    fn evaluate(&self, script: &str) -> Value {
        if script == DISCOVER_LINKS_SCRIPT {
            return json!(self.visible_hrefs());
        }
        if script == SCROLL_RESULTS_SCRIPT {
            let mut nav = self.nav.lock().unwrap();
            if let Page::Feed { url, scrolls } = &mut nav.current {
                let last = self.site.feeds[url.as_str()].batches.len().saturating_sub(1);
                *scrolls = (*scrolls + 1).min(last);
                return json!("feed:div[role=\"feed\"]");
            }
            return json!("window");
        }
        Value::Null
    }

    fn text(&self) -> String {
        let nav = self.nav.lock().unwrap();
        match &nav.current {
            Page::Feed { url, scrolls } => {
                let feed = &self.site.feeds[url];
                if feed.ends && *scrolls + 1 >= feed.batches.len() {
                    "Resultados\nVocê chegou ao final da lista.".to_string()
                } else {
                    "Resultados".to_string()
                }
            }
            Page::Detail(link) => self.site.details[link].text().to_string(),
            Page::Blank | Page::Unknown(_) => String::new(),
        }
    }

    fn elements(&self, selector: &str) -> Vec<ElementSnapshot> {
        let nav = self.nav.lock().unwrap();
        match &nav.current {
            Page::Detail(link) => self.site.details[link].select(selector).to_vec(),
            _ => Vec::new(),
        }
    }

    fn back(&self) {
        self.log.lock().unwrap().backs += 1;
        let mut nav = self.nav.lock().unwrap();
        nav.current = nav.history.pop().unwrap_or(Page::Blank);
    }
}

impl PageSession for ScriptedSession {
    fn navigate(&self, url: &str) -> impl Future<Output = Result<(), SessionError>> + Send {
        ready(self.open(url))
    }

    fn read_visible_text(&self) -> impl Future<Output = Result<String, SessionError>> + Send {
        ready(Ok(self.text()))
    }

    fn evaluate_script(
        &self,
        script: &str,
    ) -> impl Future<Output = Result<Value, SessionError>> + Send {
        ready(Ok(self.evaluate(script)))
    }

    fn find_elements(
        &self,
        selector: &str,
    ) -> impl Future<Output = Result<Vec<ElementSnapshot>, SessionError>> + Send {
        ready(Ok(self.elements(selector)))
    }

    fn go_back(&self) -> impl Future<Output = Result<(), SessionError>> + Send {
        self.back();
        ready(Ok(()))
    }
}

impl Drop for ScriptedSession {
    fn drop(&mut self) {
        if let Ok(mut log) = self.log.lock() {
            log.released = true;
        }
    }
}

pub struct ScriptedLauncher {
    site: Arc<ScriptedSite>,
    log: Arc<Mutex<BrowserLog>>,
    fail: bool,
}

impl ScriptedLauncher {
    pub fn new(site: ScriptedSite) -> Self {
        Self {
            site: Arc::new(site),
            log: Arc::new(Mutex::new(BrowserLog::default())),
            fail: false,
        }
    }

    /// A launcher whose browser never starts.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(ScriptedSite::new())
        }
    }

    pub fn log(&self) -> Arc<Mutex<BrowserLog>> {
        Arc::clone(&self.log)
    }
}

impl SessionLauncher for ScriptedLauncher {
    type Session = ScriptedSession;

    fn launch(&self) -> impl Future<Output = Result<ScriptedSession, SessionError>> + Send {
        self.log.lock().unwrap().launches += 1;
        let result = if self.fail {
            Err(SessionError::Launch("chrome binary not found".to_string()))
        } else {
            Ok(ScriptedSession {
                site: Arc::clone(&self.site),
                nav: Mutex::new(Navigation {
                    current: Page::Blank,
                    history: Vec::new(),
                }),
                log: Arc::clone(&self.log),
            })
        };
        ready(result)
    }
}

/// Report writer that keeps what it was given.
#[derive(Clone, Default)]
pub struct RecordingWriter {
    pub calls: Arc<Mutex<Vec<(Vec<ListingRecord>, PathBuf)>>>,
}

impl ReportWriter for RecordingWriter {
    fn write(&self, records: &[ListingRecord], destination: &Path) -> Result<(), ScraperError> {
        self.calls
            .lock()
            .unwrap()
            .push((records.to_vec(), destination.to_path_buf()));
        Ok(())
    }
}

pub fn event_channel() -> (EventSink, UnboundedReceiver<RunEvent>) {
    let (tx, rx) = unbounded_channel();
    (EventSink::new(tx), rx)
}

pub fn drain(rx: &mut UnboundedReceiver<RunEvent>) -> Vec<RunEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn request(keywords: &[&str], region: &str, target: u32) -> SearchRequest {
    SearchRequest {
        keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
        region: region.to_string(),
        min_stars: 4.0,
        min_reviews: 10,
        target_per_keyword: target,
        output: Some(PathBuf::from("leads.csv")),
    }
}

//! Top-level run loop: keywords × zoom levels × discovered listings.
//!
//! A run validates the request, acquires one page session, resolves the
//! region once, then drives a [`KeywordSearch`] per keyword. Each link the
//! pagination controller hands over is opened, extracted, filtered and, if
//! accepted, enriched and appended to the result set. The session is owned
//! by [`Orchestrator::run_search`] and dropped before the report is written.

use std::collections::HashSet;
use std::future::Future;
use std::path::{Path, PathBuf};

use mapscout_core::{AppConfig, ListingRecord, SearchRequest};
use tokio_util::sync::CancellationToken;

use crate::enrich::{messaging_link, ContactEnricher};
use crate::error::ScraperError;
use crate::events::EventSink;
use crate::extract::{extract_listing, wait_for_detail, DetailPage, ExtractedListing};
use crate::filters::{assess_quality, region_matches};
use crate::geocode::{GeoPoint, Geocoder};
use crate::links::CandidateLink;
use crate::pagination::{truncate, KeywordOutcome, KeywordSearch, LinkProcessor};
use crate::report::ReportWriter;
use crate::search_url::{build_search_url, zoom_sequence};
use crate::session::{PageSession, SessionLauncher};
use crate::settings::{settle, CrawlSettings};

/// Progress stays below this until the run has fully completed.
const MAX_RUNNING_PROGRESS: f64 = 99.0;

/// Result of one run, complete or cancelled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOutcome {
    /// Accepted listings in acceptance order.
    pub records: Vec<ListingRecord>,
    pub cancelled: bool,
    /// Where the report was written, if it was.
    pub report_path: Option<PathBuf>,
}

/// Mutable bookkeeping for a single run. Created fresh by every
/// [`Orchestrator::run_search`] call.
#[derive(Debug, Default)]
struct SessionState {
    /// Links accepted under any keyword.
    global_seen: HashSet<CandidateLink>,
    records: Vec<ListingRecord>,
    /// Keywords whose pagination has finished.
    keywords_done: usize,
}

pub struct Orchestrator<L, W> {
    launcher: L,
    geocoder: Geocoder,
    enricher: ContactEnricher,
    writer: W,
    settings: CrawlSettings,
    events: EventSink,
}

impl<L: SessionLauncher, W: ReportWriter> Orchestrator<L, W> {
    pub fn new(
        launcher: L,
        geocoder: Geocoder,
        enricher: ContactEnricher,
        writer: W,
        settings: CrawlSettings,
        events: EventSink,
    ) -> Self {
        Self {
            launcher,
            geocoder,
            enricher,
            writer,
            settings,
            events,
        }
    }

    /// Build the HTTP collaborators and pacing from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if an HTTP client cannot be constructed.
    pub fn from_config(
        config: &AppConfig,
        launcher: L,
        writer: W,
        events: EventSink,
    ) -> Result<Self, ScraperError> {
        let geocoder = Geocoder::new(
            &config.geocoder_url,
            config.http_timeout_secs,
            &config.geocoder_user_agent,
        )?;
        let enricher = ContactEnricher::new(config.http_timeout_secs, &config.site_user_agent)?;
        Ok(Self::new(
            launcher,
            geocoder,
            enricher,
            writer,
            CrawlSettings::from_config(config),
            events,
        ))
    }

    /// Execute one search run.
    ///
    /// Cancellation is cooperative: `cancel` is checked before each keyword,
    /// zoom, scroll and listing, and whatever was accepted up to that point
    /// is returned (and reported) as a normal outcome.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::InvalidRequest`] if `request` fails validation; no
    ///   session is started.
    /// - [`ScraperError::SessionStart`] if the page session cannot be
    ///   launched.
    pub async fn run_search(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, ScraperError> {
        request.validate()?;

        self.events.info("Starting browser session...");
        let session = match self.launcher.launch().await {
            Ok(session) => session,
            Err(e) => {
                self.events.error(format!("Could not start browser: {e}"));
                return Err(ScraperError::SessionStart(e));
            }
        };

        self.events.info(format!(
            "{} keyword(s) | up to {} listings",
            request.keywords.len(),
            request.overall_target()
        ));
        let mut state = SessionState::default();
        let cancelled = {
            let session = session;
            let coords = self.resolve_region(&request.region).await;
            self.search_keywords(&session, request, coords, cancel, &mut state)
                .await
        };

        let report_path = self.write_report(&state.records, request.output.as_deref());
        let total = state.records.len();
        if cancelled {
            self.events
                .warning(format!("Stopped by user. {total} listings kept."));
        }
        self.events
            .progress(100.0, format!("Done! {total} listings accepted"));
        tracing::info!(accepted = total, cancelled, "search run finished");

        Ok(RunOutcome {
            records: state.records,
            cancelled,
            report_path,
        })
    }

    /// Geocode once per run. Failure means text-only search URLs.
    async fn resolve_region(&self, region: &str) -> Option<GeoPoint> {
        self.events.info(format!("Locating \"{region}\"..."));
        match self.geocoder.lookup(region).await {
            Ok(Some(found)) => {
                self.events.success(format!(
                    "Coordinates: {:.4}, {:.4} ({})",
                    found.point.lat,
                    found.point.lng,
                    truncate(&found.display_name, 70)
                ));
                Some(found.point)
            }
            Ok(None) => {
                self.events
                    .warning("Region not found by the geocoder. Using text search.");
                None
            }
            Err(e) => {
                self.events
                    .warning(format!("Geocoding failed ({e}). Using text search."));
                None
            }
        }
    }

    /// Returns `true` when the run was cancelled.
    async fn search_keywords<S: PageSession>(
        &self,
        session: &S,
        request: &SearchRequest,
        coords: Option<GeoPoint>,
        cancel: &CancellationToken,
        state: &mut SessionState,
    ) -> bool {
        let keyword_count = request.keywords.len();
        let target = request.target_per_keyword;
        let zooms = zoom_sequence(&request.region);

        for (index, keyword) in request.keywords.iter().enumerate() {
            if cancel.is_cancelled() {
                return true;
            }
            self.events.info(format!(
                "[{}/{keyword_count}] Searching \"{keyword}\" in {}",
                index + 1,
                request.region
            ));
            self.events.detail(format!(
                "Target: {target} listings | min {:.1} stars | min {} reviews",
                request.min_stars, request.min_reviews
            ));

            let url_for_zoom = |zoom: u8| {
                build_search_url(
                    &self.settings.maps_base_url,
                    keyword,
                    &request.region,
                    coords,
                    zoom,
                )
            };
            let mut processor = ListingEvaluator {
                session,
                settings: &self.settings,
                enricher: &self.enricher,
                events: &self.events,
                request,
                keyword,
                state: &mut *state,
                accepted: 0,
            };
            let mut search = KeywordSearch::new(session, &self.settings, cancel, &self.events);
            let outcome = search.run(zooms, url_for_zoom, &mut processor).await;
            let accepted = processor.accepted;
            tracing::debug!(
                keyword = %keyword,
                evaluated = search.evaluated().len(),
                accepted,
                ?outcome,
                "keyword finished"
            );

            match outcome {
                KeywordOutcome::TargetReached => self
                    .events
                    .success(format!("\"{keyword}\": target reached ({accepted}/{target})")),
                KeywordOutcome::ZoomsExhausted => self
                    .events
                    .warning(format!("\"{keyword}\": exhausted: {accepted}/{target}")),
                KeywordOutcome::Cancelled => return true,
            }
            state.keywords_done += 1;
        }
        cancel.is_cancelled()
    }

    fn write_report(&self, records: &[ListingRecord], output: Option<&Path>) -> Option<PathBuf> {
        let destination = output?;
        if records.is_empty() {
            self.events.warning("No listings accepted. Report not written.");
            return None;
        }
        match self.writer.write(records, destination) {
            Ok(()) => {
                self.events
                    .success(format!("Report saved: {}", destination.display()));
                Some(destination.to_path_buf())
            }
            Err(e) => {
                self.events.error(format!("Could not write report: {e}"));
                None
            }
        }
    }
}

/// Evaluates the links of one keyword against the run's filters.
struct ListingEvaluator<'a, S> {
    session: &'a S,
    settings: &'a CrawlSettings,
    enricher: &'a ContactEnricher,
    events: &'a EventSink,
    request: &'a SearchRequest,
    keyword: &'a str,
    state: &'a mut SessionState,
    accepted: u32,
}

impl<S: PageSession> ListingEvaluator<'_, S> {
    async fn evaluate(&mut self, link: CandidateLink) {
        if let Err(e) = self.session.navigate(link.as_str()).await {
            self.events.warning(format!("Could not open listing: {e}"));
            self.return_to_results().await;
            return;
        }
        wait_for_detail(self.session, self.settings).await;
        let page = DetailPage::capture(self.session)
            .await
            .with_map_host(&self.settings.maps_base_url);
        let listing = extract_listing(&page);
        self.decide(link, listing).await;
        self.return_to_results().await;
    }

    /// Region first, then quality; accept whatever passes both.
    async fn decide(&mut self, link: CandidateLink, listing: ExtractedListing) {
        let shown = display_name(&listing.name);

        if !region_matches(&listing.address, &self.request.region) {
            self.events.warning(format!(
                "Outside region: {shown} ({})",
                truncate(&listing.address, 60)
            ));
            return;
        }
        if let Err(rejection) = assess_quality(
            listing.stars,
            listing.reviews,
            self.request.min_stars,
            self.request.min_reviews,
        ) {
            self.events.detail(format!("Skipped {shown}: {rejection}"));
            return;
        }

        self.state.global_seen.insert(link.clone());
        self.accepted += 1;

        let email = if listing.site.is_empty() {
            String::new()
        } else {
            self.enricher
                .find_email(&listing.site)
                .await
                .unwrap_or_default()
        };
        let messaging_link = messaging_link(&listing.phone).unwrap_or_default();

        self.events.success(format!(
            "[{}/{}] {shown} | {:.1} stars ({} reviews){}",
            self.accepted,
            self.request.target_per_keyword,
            listing.stars,
            listing.reviews,
            if email.is_empty() { "" } else { " | email" }
        ));
        tracing::debug!(link = %link, keyword = %self.keyword, "listing accepted");

        self.state.records.push(ListingRecord {
            name: listing.name,
            category: listing.category,
            address: listing.address,
            phone: listing.phone,
            site: listing.site,
            stars: listing.stars,
            reviews: listing.reviews,
            source_link: link.as_str().to_owned(),
            keyword: self.keyword.to_owned(),
            email,
            messaging_link,
        });
        self.report_progress();
    }

    fn report_progress(&self) {
        let target = f64::from(self.request.target_per_keyword);
        #[allow(clippy::cast_precision_loss)]
        let (done, keywords) = (
            self.state.keywords_done as f64,
            self.request.keywords.len() as f64,
        );
        let percent = ((done * target + f64::from(self.accepted)) / (keywords * target) * 100.0)
            .min(MAX_RUNNING_PROGRESS);
        self.events.progress(
            percent,
            format!(
                "{} accepted ({}/{} in this keyword)",
                self.state.records.len(),
                self.accepted,
                self.request.target_per_keyword
            ),
        );
    }

    async fn return_to_results(&self) {
        if let Err(e) = self.session.go_back().await {
            tracing::debug!(error = %e, "could not return to results");
        }
        settle(self.settings.back_settle).await;
    }
}

impl<S: PageSession> LinkProcessor for ListingEvaluator<'_, S> {
    fn already_accepted(&self, link: &CandidateLink) -> bool {
        self.state.global_seen.contains(link)
    }

    fn target_reached(&self) -> bool {
        self.accepted >= self.request.target_per_keyword
    }

    fn process(&mut self, link: CandidateLink) -> impl Future<Output = ()> + Send {
        self.evaluate(link)
    }
}

fn display_name(name: &str) -> &str {
    if name.is_empty() {
        "(unnamed)"
    } else {
        name
    }
}

pub mod enrich;
pub mod error;
pub mod events;
pub mod extract;
pub mod filters;
pub mod geocode;
pub mod links;
pub mod normalize;
pub mod orchestrator;
pub mod pagination;
pub mod report;
pub mod search_url;
pub mod session;
pub mod settings;

pub use enrich::{extract_email, messaging_link, ContactEnricher};
pub use error::{ScraperError, SessionError};
pub use events::{EventSink, LogLevel, RunEvent};
pub use extract::{extract_listing, DetailPage, ExtractedListing};
pub use filters::{assess_quality, region_matches, QualityRejection};
pub use geocode::{GeoPoint, GeocodeMatch, Geocoder};
pub use links::{CandidateLink, DISCOVER_LINKS_SCRIPT};
pub use orchestrator::{Orchestrator, RunOutcome};
pub use pagination::{KeywordOutcome, KeywordSearch, LinkProcessor, SearchState, SCROLL_RESULTS_SCRIPT};
pub use report::ReportWriter;
pub use search_url::{build_search_url, zoom_sequence};
pub use session::{ElementSnapshot, PageSession, SessionLauncher};
pub use settings::CrawlSettings;

use std::path::Path;

use mapscout_core::ListingRecord;

use crate::error::ScraperError;

/// Persists the accepted listings of a run.
///
/// Called once at the end of a run that accepted at least one listing and
/// has an output destination.
pub trait ReportWriter: Sync {
    /// # Errors
    ///
    /// Returns [`ScraperError::Report`] when the destination cannot be written.
    fn write(&self, records: &[ListingRecord], destination: &Path) -> Result<(), ScraperError>;
}

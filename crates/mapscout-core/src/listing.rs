use serde::{Deserialize, Serialize};

/// One accepted business listing, as handed to the report writer.
///
/// Empty strings mean "not found"; `stars == 0.0` means no rating was shown
/// and `reviews == 0` means no review count was shown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub name: String,
    pub category: String,
    pub address: String,
    pub phone: String,
    pub site: String,
    pub stars: f64,
    pub reviews: u64,
    /// Canonical detail-view link the listing was read from.
    pub source_link: String,
    /// Keyword whose search surfaced this listing.
    pub keyword: String,
    pub email: String,
    pub messaging_link: String,
}

impl ListingRecord {
    #[must_use]
    pub fn has_email(&self) -> bool {
        self.email.contains('@')
    }

    #[must_use]
    pub fn has_messaging_link(&self) -> bool {
        self.messaging_link.starts_with("http")
    }

    #[must_use]
    pub fn is_rated(&self) -> bool {
        self.stars > 0.0
    }
}

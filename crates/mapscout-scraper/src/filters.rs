//! Accept/reject predicates applied to an extracted listing.
//!
//! Both filters give missing data the benefit of the doubt: an empty address
//! is never out of region, and a zero rating or review count never fails a
//! minimum.

use std::fmt;

use crate::normalize::{fold_text, significant_words};

/// Region words of this many characters or fewer (state codes, "de", "do")
/// are ignored when matching.
const MIN_REGION_WORD_LEN: usize = 2;

/// `true` when `address` plausibly lies inside `region`.
///
/// Every comma-separated component of `region` must have all of its
/// significant words present in the address, compared accent- and
/// case-insensitively.
#[must_use]
pub fn region_matches(address: &str, region: &str) -> bool {
    if address.trim().is_empty() {
        return true;
    }
    let address = fold_text(address);
    region.split(',').all(|component| {
        significant_words(component.trim(), MIN_REGION_WORD_LEN)
            .iter()
            .all(|word| address.contains(word.as_str()))
    })
}

/// A zero rating is unknown and passes.
#[must_use]
pub fn rating_passes(stars: f64, min_stars: f64) -> bool {
    stars <= 0.0 || stars >= min_stars
}

/// A zero review count is unknown and passes.
#[must_use]
pub fn review_count_passes(reviews: u64, min_reviews: u64) -> bool {
    reviews == 0 || reviews >= min_reviews
}

/// Why a listing failed the quality thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QualityRejection {
    LowRating { stars: f64, min: f64 },
    FewReviews { reviews: u64, min: u64 },
}

impl fmt::Display for QualityRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LowRating { stars, min } => write!(f, "rating {stars:.1} < {min:.1}"),
            Self::FewReviews { reviews, min } => write!(f, "{reviews} reviews < {min}"),
        }
    }
}

/// Check rating first, then review count.
///
/// # Errors
///
/// Returns the first threshold the listing misses.
pub fn assess_quality(
    stars: f64,
    reviews: u64,
    min_stars: f64,
    min_reviews: u64,
) -> Result<(), QualityRejection> {
    if !rating_passes(stars, min_stars) {
        return Err(QualityRejection::LowRating {
            stars,
            min: min_stars,
        });
    }
    if !review_count_passes(reviews, min_reviews) {
        return Err(QualityRejection::FewReviews {
            reviews,
            min: min_reviews,
        });
    }
    Ok(())
}

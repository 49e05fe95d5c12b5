//! Map-search URL construction and zoom planning.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::geocode::GeoPoint;

/// Path-segment encoding: everything except unreserved characters and `/`.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// Zooms for a locality-level region: city → region → state → country.
const LOCALITY_ZOOMS: &[u8] = &[14, 12, 10, 8];
/// Zooms for a broad region: state → country → continent.
const BROAD_ZOOMS: &[u8] = &[10, 8, 6];

/// Zoom levels to try for `region`, most specific first.
///
/// A region with a comma or at least three words ("Caçapava, SP",
/// "New York USA") is treated as a locality; anything else ("Ceará",
/// "Japan") starts wider.
#[must_use]
pub fn zoom_sequence(region: &str) -> &'static [u8] {
    if region.contains(',') || region.split_whitespace().count() >= 3 {
        LOCALITY_ZOOMS
    } else {
        BROAD_ZOOMS
    }
}

/// Human label for a zoom level, used in logs.
#[must_use]
pub fn zoom_label(zoom: u8) -> String {
    match zoom {
        14 => "neighbourhood/city".to_string(),
        12 => "region".to_string(),
        10 => "state".to_string(),
        8 => "country".to_string(),
        6 => "continental".to_string(),
        other => other.to_string(),
    }
}

/// Builds the search URL for one keyword at one zoom level.
///
/// With coordinates the query is anchored on the map position; without
/// them the region is folded into the text query instead.
#[must_use]
pub fn build_search_url(
    base_url: &str,
    keyword: &str,
    region: &str,
    coords: Option<GeoPoint>,
    zoom: u8,
) -> String {
    let base = base_url.trim_end_matches('/');
    match coords {
        Some(GeoPoint { lat, lng }) => {
            let kw = utf8_percent_encode(keyword, SEGMENT);
            format!("{base}/search/{kw}/@{lat},{lng},{zoom}z")
        }
        None => {
            let query = format!("{keyword}, {region}");
            let q = utf8_percent_encode(&query, SEGMENT);
            format!("{base}/search/{q}")
        }
    }
}

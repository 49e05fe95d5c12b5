//! Region geocoding against a Nominatim-compatible search endpoint.
//!
//! Resolution happens once per run. Every failure mode (network, empty
//! result, malformed body) is reported as an error to the caller, which
//! treats it as "no coordinates" and falls back to text-only search URLs.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::error::ScraperError;

/// A resolved map position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Best match returned by the geocoding service.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeMatch {
    pub point: GeoPoint,
    /// Human-readable resolved place name, used for logging only.
    pub display_name: String,
}

/// HTTP client for the geocoding service.
pub struct Geocoder {
    client: Client,
    endpoint: String,
}

impl Geocoder {
    /// Creates a `Geocoder` with a bounded request timeout and `User-Agent`.
    ///
    /// Nominatim's usage policy requires an identifying user agent.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(endpoint: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_owned(),
        })
    }

    /// Looks up `region` and returns the single best match, or `None` when
    /// the service has no result for it.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Http`] on network failure or a non-2xx status.
    /// - [`ScraperError::Geocode`] when the body is not the expected shape.
    pub async fn lookup(&self, region: &str) -> Result<Option<GeocodeMatch>, ScraperError> {
        let body: Value = self
            .client
            .get(&self.endpoint)
            .query(&[("q", region), ("format", "json"), ("limit", "1")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        parse_first_match(&body).map_err(|reason| ScraperError::Geocode {
            region: region.to_owned(),
            reason,
        })
    }
}

/// Extracts the first place from a Nominatim JSON array.
///
/// `lat`/`lon` arrive as strings from Nominatim but are accepted as numbers
/// too, since some compatible services emit them that way.
fn parse_first_match(body: &Value) -> Result<Option<GeocodeMatch>, String> {
    let places = body
        .as_array()
        .ok_or_else(|| "response is not a JSON array".to_string())?;

    let Some(first) = places.first() else {
        return Ok(None);
    };

    let lat = coordinate(first, "lat")?;
    let lng = coordinate(first, "lon")?;
    let display_name = first
        .get("display_name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();

    Ok(Some(GeocodeMatch {
        point: GeoPoint { lat, lng },
        display_name,
    }))
}

fn coordinate(place: &Value, key: &str) -> Result<f64, String> {
    let raw = place
        .get(key)
        .ok_or_else(|| format!("missing \"{key}\""))?;
    let value = match raw {
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("\"{key}\" is not a number: {e}"))?,
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| format!("\"{key}\" is out of range"))?,
        _ => return Err(format!("\"{key}\" has unexpected type")),
    };
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("\"{key}\" is not finite"))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_string_coordinates() {
        let body = json!([{
            "lat": "-23.1007",
            "lon": "-45.7076",
            "display_name": "Caçapava, Região Metropolitana do Vale do Paraíba, São Paulo, Brasil"
        }]);
        let found = parse_first_match(&body).unwrap().unwrap();
        assert!((found.point.lat - (-23.1007)).abs() < 1e-9);
        assert!((found.point.lng - (-45.7076)).abs() < 1e-9);
        assert!(found.display_name.starts_with("Caçapava"));
    }

    #[test]
    fn parses_numeric_coordinates() {
        let body = json!([{ "lat": 35.68, "lon": 139.69 }]);
        let found = parse_first_match(&body).unwrap().unwrap();
        assert!((found.point.lng - 139.69).abs() < 1e-9);
        assert_eq!(found.display_name, "");
    }

    #[test]
    fn empty_array_is_no_match() {
        assert_eq!(parse_first_match(&json!([])).unwrap(), None);
    }

    #[test]
    fn object_body_is_rejected() {
        assert!(parse_first_match(&json!({"error": "nope"})).is_err());
    }

    #[test]
    fn garbage_latitude_is_rejected() {
        let body = json!([{ "lat": "north", "lon": "1.0" }]);
        let err = parse_first_match(&body).unwrap_err();
        assert!(err.contains("lat"), "got: {err}");
    }

    #[test]
    fn missing_longitude_is_rejected() {
        let body = json!([{ "lat": "1.0" }]);
        assert!(parse_first_match(&body).is_err());
    }
}

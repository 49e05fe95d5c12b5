use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Per-run search configuration: which keywords to look up, where, and how
/// strict to be about the listings that come back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Ordered, unique search keywords.
    pub keywords: Vec<String>,
    /// Free-text region ("Caçapava, SP", "Tokyo Japan").
    pub region: String,
    /// Minimum star rating in `[0, 5]`. Unrated listings always pass.
    #[serde(default)]
    pub min_stars: f64,
    /// Minimum review count. Listings without a count always pass.
    #[serde(default)]
    pub min_reviews: u64,
    /// Accepted listings wanted per keyword.
    #[serde(default = "default_target")]
    pub target_per_keyword: u32,
    /// Where the report is written. `None` skips the report.
    #[serde(default)]
    pub output: Option<PathBuf>,
}

fn default_target() -> u32 {
    20
}

impl SearchRequest {
    /// Validate thresholds and keywords before any resource is acquired.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] describing the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.keywords.is_empty() {
            return Err(ConfigError::Validation(
                "at least one keyword is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for keyword in &self.keywords {
            let trimmed = keyword.trim();
            if trimmed.is_empty() {
                return Err(ConfigError::Validation(
                    "keywords must be non-empty".to_string(),
                ));
            }
            if !seen.insert(trimmed.to_lowercase()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate keyword: '{trimmed}'"
                )));
            }
        }

        if self.region.trim().is_empty() {
            return Err(ConfigError::Validation(
                "region must be non-empty".to_string(),
            ));
        }

        if !self.min_stars.is_finite() || !(0.0..=5.0).contains(&self.min_stars) {
            return Err(ConfigError::Validation(format!(
                "min_stars must be between 0 and 5, got {}",
                self.min_stars
            )));
        }

        if self.target_per_keyword == 0 {
            return Err(ConfigError::Validation(
                "target_per_keyword must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Total accepted listings the run aims for across every keyword.
    #[must_use]
    pub fn overall_target(&self) -> u64 {
        self.keywords.len() as u64 * u64::from(self.target_per_keyword)
    }
}

/// Load and validate a search request from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_request(path: &Path) -> Result<SearchRequest, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::RequestFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let mut request: SearchRequest = serde_yaml::from_str(&content)?;
    request.keywords = request
        .keywords
        .into_iter()
        .map(|k| k.trim().to_string())
        .collect();
    request.region = request.region.trim().to_string();

    request.validate()?;

    Ok(request)
}

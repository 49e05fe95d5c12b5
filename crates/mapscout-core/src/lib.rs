pub mod app_config;
pub mod config;
pub mod listing;
pub mod request;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use listing::ListingRecord;
pub use request::{load_request, SearchRequest};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read request file {path}: {source}")]
    RequestFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse request file: {0}")]
    RequestFileParse(#[from] serde_yaml::Error),

    #[error("invalid search request: {0}")]
    Validation(String),
}

//! Error types for wpvulndb-report

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during a vulnerability report run
///
/// Per-item HTTP and parsing failures are not errors here: they are captured
/// on the item's [`VulnResponse`](crate::VulnResponse) and reported as unknown.
#[derive(Debug, Error)]
pub enum Error {
    /// No API token could be resolved from any source
    #[error(
        "no api token could be found for access to the wpvulndb.\n\
         Please either pass it on the command line with -t or --token\n\
         or set environment variable {env}, or set it in either\n\
         {}",
        .files.join(", or ")
    )]
    MissingToken {
        /// Environment variable that was consulted
        env: &'static str,
        /// Settings files that were consulted, in lookup order
        files: Vec<String>,
    },

    /// Settings file exists but could not be parsed
    #[error("failed to read settings file {path}: {message}")]
    Settings {
        /// Path of the offending file
        path: String,
        /// Parser message
        message: String,
    },

    /// Invalid API base URL
    #[error("invalid API base URL: {0}")]
    InvalidUrl(String),

    /// Failed to create HTTP client
    #[error("failed to create HTTP client: {0}")]
    HttpClient(String),

    /// The wp-cli inventory command failed
    #[error("inventory command failed: {0}")]
    Inventory(String),

    /// Output operation failed
    #[error("output failed: {0}")]
    OutputFailed(#[source] std::io::Error),
}

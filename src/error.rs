//! Error taxonomy for the inventory pipeline.
//!
//! Every failure an invocation can hit has its own variant so the host tool
//! can render a precise message. All errors are terminal: nothing here is
//! retried, and the facade never catches and continues.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("unsupported auth_method '{0}' (expected none, basic or gitlab)")]
    UnsupportedAuthMethod(String),

    #[error("missing credential: environment variable {0} is not set")]
    MissingCredential(&'static str),

    #[error("server returned status {status} for {url}")]
    FetchStatus { url: String, status: u16 },

    #[error("request to {url} failed: {source}")]
    FetchTransport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("TLS verification failed for {url}: {reason}")]
    Tls { url: String, reason: String },

    #[error("schema violation at `{path}`: {reason}")]
    Schema { path: String, reason: String },

    #[error("cycle detected in group children: {}", path.join(" -> "))]
    Cycle { path: Vec<String> },

    #[error("invalid inventory source: {0}")]
    Config(String),
}

impl InventoryError {
    /// Pipeline stage the error belongs to, for user-facing context.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::UnsupportedAuthMethod(_) | Self::MissingCredential(_) => "auth",
            Self::FetchStatus { .. } | Self::FetchTransport { .. } | Self::Tls { .. } => "fetch",
            Self::Schema { .. } => "validate",
            Self::Cycle { .. } => "build",
            Self::Config(_) => "config",
        }
    }
}

//! HTTP retrieval of the inventory document.
//!
//! Exactly one GET per invocation, no retries; retry policy belongs to the
//! host tool's own run semantics. TLS verification failures get their own
//! error variant so callers can message them specifically.

use crate::Result;
use crate::auth::Credentials;
use crate::error::InventoryError;
use std::time::Duration;
use tracing::debug;

/// Fetch `url` with the given credentials and return the raw body bytes.
pub fn fetch(
    url: &str,
    credentials: &Credentials,
    validate_certs: bool,
    timeout: Duration,
) -> Result<Vec<u8>> {
    let client = reqwest::blocking::Client::builder()
        .danger_accept_invalid_certs(!validate_certs)
        .timeout(timeout)
        .build()
        .map_err(|source| InventoryError::FetchTransport {
            url: url.to_string(),
            source,
        })?;

    let mut request = client.get(url);
    for (name, value) in &credentials.headers {
        request = request.header(*name, value.as_str());
    }
    if let Some((username, password)) = &credentials.basic {
        request = request.basic_auth(username, Some(password.as_str()));
    }

    let response = request.send().map_err(|e| classify(url, e))?;
    let status = response.status();
    debug!(
        status = status.as_u16(),
        content_type = ?response.headers().get(reqwest::header::CONTENT_TYPE),
        "inventory endpoint responded"
    );

    if !status.is_success() {
        return Err(InventoryError::FetchStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.bytes().map_err(|e| classify(url, e))?;
    Ok(body.to_vec())
}

/// Split TLS verification failures out of generic transport errors.
///
/// reqwest folds certificate errors into its connect error, so the source
/// chain is inspected for a TLS-shaped cause.
fn classify(url: &str, source: reqwest::Error) -> InventoryError {
    if let Some(reason) = tls_failure(&source) {
        return InventoryError::Tls {
            url: url.to_string(),
            reason,
        };
    }
    InventoryError::FetchTransport {
        url: url.to_string(),
        source,
    }
}

fn tls_failure(err: &reqwest::Error) -> Option<String> {
    let mut cause: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = cause {
        let msg = e.to_string();
        let lower = msg.to_lowercase();
        if lower.contains("certificate")
            || lower.contains("handshake")
            || lower.contains("tls")
            || lower.contains("fatal alert")
        {
            return Some(msg);
        }
        cause = e.source();
    }
    None
}

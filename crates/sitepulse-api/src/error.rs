use thiserror::Error;

/// Top-level error type for the `sitepulse-api` crate.
///
/// Covers authentication, transport, status validation and decoding.
/// `sitepulse-core` maps these into domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Token exchange rejected (bad client id/secret, unknown tenant, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Status ──────────────────────────────────────────────────────
    /// The upstream answered with a non-success HTTP status.
    #[error("HTTP {status} from {endpoint}: {preview}")]
    Http {
        status: u16,
        endpoint: String,
        /// First 200 bytes of the response body.
        preview: String,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the request may succeed when simply repeated.
    ///
    /// Every non-success status and every transport failure qualifies;
    /// malformed bodies and bad URLs do not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Http { .. })
    }

    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Truncate a response body for inclusion in error messages.
pub(crate) fn preview(body: &str) -> String {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    body[..end].to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_errors_are_retryable() {
        let err = Error::Http {
            status: 404,
            endpoint: "/x".into(),
            preview: String::new(),
        };
        assert!(err.is_retryable());
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn deserialization_is_permanent() {
        let err = Error::Deserialization {
            message: "expected value".into(),
            body: "<html>".into(),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let body = "é".repeat(150);
        let p = preview(&body);
        assert!(p.len() <= 200);
        assert!(p.chars().all(|c| c == 'é'));
    }
}

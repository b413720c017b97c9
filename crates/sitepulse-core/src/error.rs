// ── Core error types ──
//
// Domain errors for the collection pipeline. Callers never match on HTTP
// details directly; `From<sitepulse_api::Error>` translates transport
// failures into the variants below.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request timed out")]
    Timeout,

    // ── Upstream errors ──────────────────────────────────────────────
    #[error("Upstream returned HTTP {status} for {endpoint}")]
    Upstream { status: u16, endpoint: String },

    #[error("Unexpected response: {message}")]
    InvalidResponse { message: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error(transparent)]
    Reduce(#[from] ReduceError),

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Failures while flattening a metrics response into a row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReduceError {
    #[error("metric {metric} has no datapoints")]
    EmptySeries { metric: String },

    #[error("no series returned for metric {metric}")]
    MissingSeries { metric: String },

    #[error("metric {metric} has no data block")]
    MissingData { metric: String },

    #[error("metric {metric} contains a null datapoint")]
    NullDatapoint { metric: String },
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<sitepulse_api::Error> for CoreError {
    fn from(err: sitepulse_api::Error) -> Self {
        match err {
            sitepulse_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            sitepulse_api::Error::Http {
                status: 401,
                endpoint,
                ..
            } => CoreError::AuthenticationFailed {
                message: format!("token rejected by {endpoint}"),
            },
            sitepulse_api::Error::Http {
                status, endpoint, ..
            } => CoreError::Upstream { status, endpoint },
            sitepulse_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(ToString::to_string)
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                }
            }
            sitepulse_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            sitepulse_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            sitepulse_api::Error::Deserialization { message, body: _ } => {
                CoreError::InvalidResponse { message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_status_becomes_auth_failure() {
        let err = CoreError::from(sitepulse_api::Error::Http {
            status: 401,
            endpoint: "/sdwan/v3.1/api/elements".into(),
            preview: String::new(),
        });
        assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
    }

    #[test]
    fn other_status_is_upstream() {
        let err = CoreError::from(sitepulse_api::Error::Http {
            status: 502,
            endpoint: "/x".into(),
            preview: "bad gateway".into(),
        });
        assert_eq!(err.to_string(), "Upstream returned HTTP 502 for /x");
    }
}

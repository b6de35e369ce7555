use crate::session::SessionError;
use thiserror::Error;

/// Errors surfaced by the dashboard API client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not signed in; run `insights login` first")]
    NotAuthenticated,

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("cannot connect to {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-success status; `message` is the server's own message when it
    /// sent one.
    #[error("{message} (HTTP {status})")]
    Http { status: u16, message: String },

    #[error("invalid response: {0}")]
    Decode(String),

    #[error("invalid API URL: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ApiError {
    /// Whether the server rejected the session token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::NotAuthenticated)
            || matches!(self, ApiError::Http { status: 401 | 403, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_detection() {
        assert!(ApiError::NotAuthenticated.is_unauthorized());
        assert!(ApiError::Http {
            status: 401,
            message: "jwt expired".to_string()
        }
        .is_unauthorized());
        assert!(!ApiError::Http {
            status: 500,
            message: "boom".to_string()
        }
        .is_unauthorized());
    }

    #[test]
    fn test_http_display_keeps_server_message() {
        let err = ApiError::Http {
            status: 400,
            message: "Email already registered".to_string(),
        };
        assert_eq!(err.to_string(), "Email already registered (HTTP 400)");
    }
}

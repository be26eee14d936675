//! Error types for gist API operations.
//!
//! The taxonomy mirrors how callers recover: transport errors may fall
//! back to the offline cache, authentication errors re-enter the login
//! flow, and everything else is surfaced as a dismissible notice.

use reqwest::StatusCode;

/// Errors that can occur during gist API operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request never produced a usable response (connectivity, DNS,
    /// TLS, or a malformed request).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was empty, unparseable, or carried a
    /// service-reported error message.
    #[error("{message}")]
    Data {
        /// What went wrong, in the service's words where available.
        message: String,
    },

    /// The service answered 401. The stored token has already been
    /// cleared when this error is returned.
    #[error("not logged in, please re-enter your GitHub credentials")]
    AuthenticationRequired,

    /// The service answered with a status the operation does not accept.
    #[error("unexpected status: {0}")]
    UnexpectedStatus(StatusCode),

    /// A request could not be constructed from the given inputs.
    #[error("invalid request: {0}")]
    Validation(String),

    /// An OAuth login flow is already in progress.
    #[error("an OAuth login is already in progress")]
    LoginInProgress,

    /// The secret store rejected a token operation.
    #[error(transparent)]
    Keystore(#[from] gisto_keystore::KeystoreError),
}

impl Error {
    /// Creates a data error with the given message.
    pub(crate) fn data(message: impl Into<String>) -> Self {
        Self::Data {
            message: message.into(),
        }
    }

    /// Returns `true` if this error means the network was unreachable.
    ///
    /// The offline cache fallback applies exactly to these errors; auth
    /// and data errors must never be answered with stale snapshots.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_connect() || e.is_timeout())
    }
}

/// A specialized Result type for gist API operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_error_displays_service_message() {
        let err = Error::data("API rate limit exceeded");
        assert_eq!(err.to_string(), "API rate limit exceeded");
    }

    #[test]
    fn auth_error_is_not_connectivity() {
        assert!(!Error::AuthenticationRequired.is_connectivity());
        assert!(!Error::data("oops").is_connectivity());
        assert!(!Error::UnexpectedStatus(StatusCode::INTERNAL_SERVER_ERROR).is_connectivity());
    }
}

//! Error types for `doorman-core`.
//!
//! Three families of failure reach the operator: transport failures (the
//! request never produced a response), API failures (a non-2xx response,
//! carrying the backend's `error_message` when it sent one), and local
//! failures that short-circuit before any request is made.

/// All errors produced by the console core.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// The request could not be sent or the response could not be read.
    #[error("network error: unable to reach the management API ({0})")]
    Network(#[from] reqwest::Error),

    /// The management API answered with a non-success status.
    #[error("{message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// `error_message` from the response body, or a generic fallback.
        message: String,
    },

    /// The management API rejected the credential (401/403).
    #[error("not authorized: {0}")]
    Unauthorized(String),

    /// No credential is held; the operator has to log in first.
    #[error("not logged in — run `doorman login` first")]
    NotAuthenticated,

    /// A local validation check failed before any request was sent.
    #[error("{0}")]
    Validation(String),

    /// The typed delete confirmation does not equal the entity's primary name.
    #[error("confirmation does not match \"{expected}\"")]
    ConfirmationMismatch {
        /// The primary name the operator has to type.
        expected: String,
    },

    /// The password did not reach the required strength score.
    #[error("password does not meet security requirements ({score}/5): {verdict}")]
    WeakPassword {
        /// Score out of five.
        score: u8,
        /// Human-readable verdict message.
        verdict: String,
    },

    /// A view operation was attempted in a state that does not allow it.
    #[error("cannot {action} while {state}")]
    InvalidState {
        /// The attempted operation.
        action: &'static str,
        /// The state the view was in.
        state: &'static str,
    },

    /// The response body did not have the expected shape.
    #[error("unexpected response from the management API: {0}")]
    Decode(String),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A client-side store could not be read or written.
    #[error("store error: {0}")]
    Store(String),

    /// Invalid or unreadable configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl ConsoleError {
    /// Whether the error was raised locally, before any request was sent.
    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::ConfirmationMismatch { .. }
                | Self::WeakPassword { .. }
                | Self::InvalidState { .. }
                | Self::NotAuthenticated
        )
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = ConsoleError> = std::result::Result<T, E>;

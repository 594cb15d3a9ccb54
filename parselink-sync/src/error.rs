//! Error types for the sync layer.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
///
/// Precondition variants are returned synchronously, before any request is
/// built. Everything else surfaces from the pending request.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Signup was attempted on a user that already has an identifier.
    #[error("cannot sign up an existing user")]
    AlreadyExists,

    /// Login was attempted without the named credential.
    #[error("login requires a {0}")]
    MissingCredential(&'static str),

    /// An authenticated operation was attempted without a session token.
    #[error("operation requires a session token")]
    MissingSession,

    /// A read, update or delete was addressed at an entity the server has
    /// not assigned an identifier yet.
    #[error("operation requires an object id")]
    MissingId,

    /// A local entity has no REST root to sync against.
    #[error("a url root must be specified for entities without a class name")]
    MissingUrl,

    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("remote error (HTTP {status}): {message}")]
    Remote {
        status: u16,
        /// Store-specific error code, when the body carried one.
        code: Option<i64>,
        message: String,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("model error: {0}")]
    Model(#[from] parselink_model::ModelError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SyncError {
    /// Returns true for errors raised before any network attempt.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            SyncError::AlreadyExists
                | SyncError::MissingCredential(_)
                | SyncError::MissingSession
                | SyncError::MissingId
                | SyncError::MissingUrl
        )
    }

    /// Builds a [`SyncError::Remote`] from a status and response body.
    ///
    /// Bodies of the form `{"code": 101, "error": "..."}` are unpacked;
    /// anything else is kept verbatim as the message.
    pub fn remote(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
        let code = parsed.as_ref().and_then(|v| v["code"].as_i64());
        let message = parsed
            .as_ref()
            .and_then(|v| v["error"].as_str())
            .map(str::to_owned)
            .unwrap_or_else(|| body.to_string());
        SyncError::Remote {
            status,
            code,
            message,
        }
    }
}

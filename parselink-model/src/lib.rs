//! Entity model for parselink.
//!
//! Defines the local side of the synchronization contract:
//! - [`Entity`]: a shared handle to an identified bag of JSON attributes
//! - [`SessionEntity`]: the session-bearing user entity
//! - [`Collection`]: an ordered set of entities sharing a protocol
//! - [`SyncProtocol`]: declares how an entity is persisted remotely
//! - [`EntityEvent`]: lifecycle and change notifications
//!
//! Response normalization (timestamp stripping, `results` unwrapping) lives
//! in [`normalize`]. The dispatchers that talk to the server are in
//! `parselink-sync`; nothing in this crate performs I/O.

mod collection;
mod entity;
mod event;
pub mod normalize;
mod protocol;
mod session;

pub use collection::Collection;
pub use entity::{Attributes, Entity, ID_ATTRIBUTE, SESSION_TOKEN_ATTRIBUTE};
pub use event::EntityEvent;
pub use protocol::SyncProtocol;
pub use session::{PASSWORD_ATTRIBUTE, SessionEntity, USER_CLASS, USERNAME_ATTRIBUTE};

use serde_json::Value;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors raised when building entities from server payloads.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("expected a JSON object of attributes, got {0}")]
    NotAnObject(&'static str),

    #[error("expected a JSON array of attribute objects, got {0}")]
    NotACollection(&'static str),
}

/// Short name of a JSON value's kind, used in error messages.
pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

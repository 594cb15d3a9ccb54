//! Notifications emitted by entities.

/// An event observed through [`Entity::subscribe`](crate::Entity::subscribe).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityEvent {
    /// An attribute was added, changed or removed.
    Change { attribute: String },
    /// A save, fetch or destroy round-trip completed.
    Sync,
    /// The entity was destroyed.
    Destroy,
    /// A request against the entity failed.
    Error { message: String },
    /// The user signed up; carries the session token the server returned.
    Signup { session_token: Option<String> },
    /// The user logged in; carries the session token the server returned.
    Login { session_token: Option<String> },
    /// The user's profile was updated.
    Update,
    /// The user's profile was refreshed from the server.
    Retrieve,
    /// The session ended and every attribute was cleared.
    Logout,
}

impl EntityEvent {
    /// The event's name as used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Change { .. } => "change",
            Self::Sync => "sync",
            Self::Destroy => "destroy",
            Self::Error { .. } => "error",
            Self::Signup { .. } => "signup",
            Self::Login { .. } => "login",
            Self::Update => "update",
            Self::Retrieve => "retrieve",
            Self::Logout => "logout",
        }
    }
}

use crate::entity::{Attributes, Entity, SESSION_TOKEN_ATTRIBUTE};
use crate::protocol::SyncProtocol;
use std::ops::Deref;

/// Remote class holding user records.
pub const USER_CLASS: &str = "_User";
pub const USERNAME_ATTRIBUTE: &str = "username";
pub const PASSWORD_ATTRIBUTE: &str = "password";

/// The "current user": an entity that carries a session token.
///
/// Dereferences to [`Entity`] for attribute access and subscriptions.
/// The session token is only ever written from a login or signup response
/// and only ever read to fill the session header.
#[derive(Debug, Clone)]
pub struct SessionEntity {
    entity: Entity,
}

impl SessionEntity {
    pub fn new() -> Self {
        Self::with_attributes(Attributes::new())
    }

    pub fn with_attributes(attributes: Attributes) -> Self {
        Self {
            entity: Entity::with_attributes(SyncProtocol::class(USER_CLASS), attributes),
        }
    }

    /// The underlying entity handle.
    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    /// The session token, if one is held. Empty strings count as absent.
    pub fn session_token(&self) -> Option<String> {
        self.non_empty(SESSION_TOKEN_ATTRIBUTE)
    }

    pub fn has_session(&self) -> bool {
        self.session_token().is_some()
    }

    pub fn username(&self) -> Option<String> {
        self.non_empty(USERNAME_ATTRIBUTE)
    }

    pub fn password(&self) -> Option<String> {
        self.non_empty(PASSWORD_ATTRIBUTE)
    }

    /// Body for authenticated profile writes: [`Entity::to_json`] without
    /// the password.
    pub fn to_profile_json(&self) -> Attributes {
        let mut data = self.entity.to_json();
        data.remove(PASSWORD_ATTRIBUTE);
        data
    }

    fn non_empty(&self, key: &str) -> Option<String> {
        self.entity.get_str(key).filter(|s| !s.is_empty())
    }
}

impl Default for SessionEntity {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for SessionEntity {
    type Target = Entity;

    fn deref(&self) -> &Entity {
        &self.entity
    }
}

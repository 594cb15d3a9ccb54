//! Session dispatcher for the current user.
//!
//! The user entity does not go through `/classes`. Each verb has its own
//! endpoint, encoding and header rules:
//!
//! | verb     | request                     | needs          | on success                  |
//! |----------|-----------------------------|----------------|-----------------------------|
//! | signup   | `POST /users` (JSON)        | new entity     | set response, `Signup`      |
//! | login    | `GET /login` (form)         | username, pwd  | set response, `Login`       |
//! | update   | `PUT /users/{id}` (JSON)    | session token  | set response, `Update`      |
//! | retrieve | `GET /users/me`             | session token  | set response, `Retrieve`    |
//! | logout   | `POST /logout`              | session token  | clear everything, `Logout`  |
//!
//! Preconditions are checked when the verb is called; a failing check
//! returns an error and no request exists. The session token only ever
//! travels in the `X-Parse-Session-Token` header.

use crate::config::ParseConfig;
use crate::error::{SyncError, SyncResult};
use crate::lifecycle::{apply_parsed, settle};
use crate::request::{HttpMethod, RequestDescriptor, SESSION_TOKEN_HEADER};
use crate::strategy::SyncOptions;
use crate::transport::{PendingRequest, Transport, dispatch};
use parselink_model::{Entity, EntityEvent, SESSION_TOKEN_ATTRIBUTE, SessionEntity};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Builds and issues session-lifecycle requests.
pub struct SessionSync {
    config: Arc<ParseConfig>,
    transport: Arc<dyn Transport>,
}

impl SessionSync {
    pub fn new(config: Arc<ParseConfig>, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ParseConfig {
        &self.config
    }

    // ── Request builders ─────────────────────────────────────────

    pub fn signup_request(&self, user: &SessionEntity) -> SyncResult<RequestDescriptor> {
        if !user.is_new() {
            return Err(SyncError::AlreadyExists);
        }
        Ok(self
            .config
            .request(HttpMethod::Post, "/users")
            .json(Value::Object(user.to_json())))
    }

    pub fn login_request(&self, user: &SessionEntity) -> SyncResult<RequestDescriptor> {
        let username = user.username().ok_or(SyncError::MissingCredential("username"))?;
        let password = user.password().ok_or(SyncError::MissingCredential("password"))?;
        Ok(self.config.request(HttpMethod::Get, "/login").form(vec![
            ("username".to_string(), username),
            ("password".to_string(), password),
        ]))
    }

    pub fn update_request(&self, user: &SessionEntity) -> SyncResult<RequestDescriptor> {
        let id = user.id().unwrap_or_default();
        Ok(self
            .authenticated(user, HttpMethod::Put, &format!("/users/{}", urlencoding::encode(&id)))?
            .json(Value::Object(user.to_profile_json())))
    }

    pub fn retrieve_request(&self, user: &SessionEntity) -> SyncResult<RequestDescriptor> {
        self.authenticated(user, HttpMethod::Get, "/users/me")
    }

    pub fn logout_request(&self, user: &SessionEntity) -> SyncResult<RequestDescriptor> {
        self.authenticated(user, HttpMethod::Post, "/logout")
    }

    fn authenticated(
        &self,
        user: &SessionEntity,
        method: HttpMethod,
        path: &str,
    ) -> SyncResult<RequestDescriptor> {
        let token = user.session_token().ok_or(SyncError::MissingSession)?;
        Ok(self
            .config
            .request(method, path)
            .header(SESSION_TOKEN_HEADER, token))
    }

    // ── Verbs ────────────────────────────────────────────────────

    /// Registers a new user. Resolves to the normalized response.
    pub fn signup(&self, user: &SessionEntity, options: SyncOptions) -> SyncResult<PendingRequest> {
        let request = self.signup_request(user)?;
        debug!("signing up user");
        Ok(self.issue(user, request, options, |entity, raw| {
            let parsed = apply_parsed(entity, raw);
            info!(id = ?entity.id(), "user signed up");
            let session_token = entity.get_str(SESSION_TOKEN_ATTRIBUTE);
            (parsed, vec![EntityEvent::Signup { session_token }])
        }))
    }

    /// Logs in with the entity's username and password.
    pub fn login(&self, user: &SessionEntity, options: SyncOptions) -> SyncResult<PendingRequest> {
        let request = self.login_request(user)?;
        debug!("logging in");
        Ok(self.issue(user, request, options, |entity, raw| {
            let parsed = apply_parsed(entity, raw);
            info!(id = ?entity.id(), "user logged in");
            let session_token = entity.get_str(SESSION_TOKEN_ATTRIBUTE);
            (parsed, vec![EntityEvent::Login { session_token }])
        }))
    }

    /// Writes the profile attributes back to the server.
    pub fn update(&self, user: &SessionEntity, options: SyncOptions) -> SyncResult<PendingRequest> {
        let request = self.update_request(user)?;
        Ok(self.issue(user, request, options, |entity, raw| {
            (apply_parsed(entity, raw), vec![EntityEvent::Update])
        }))
    }

    /// Refreshes the user from `/users/me`.
    pub fn retrieve(&self, user: &SessionEntity, options: SyncOptions) -> SyncResult<PendingRequest> {
        let request = self.retrieve_request(user)?;
        Ok(self.issue(user, request, options, |entity, raw| {
            (apply_parsed(entity, raw), vec![EntityEvent::Retrieve])
        }))
    }

    /// Ends the session. Every attribute is cleared once the server
    /// confirms; on failure the entity is left as it was.
    pub fn logout(&self, user: &SessionEntity, options: SyncOptions) -> SyncResult<PendingRequest> {
        let request = self.logout_request(user)?;
        Ok(self.issue(user, request, options, |entity, raw| {
            entity.clear();
            info!("user logged out");
            (raw, vec![EntityEvent::Logout])
        }))
    }

    fn issue<F>(
        &self,
        user: &SessionEntity,
        request: RequestDescriptor,
        options: SyncOptions,
        apply: F,
    ) -> PendingRequest
    where
        F: FnOnce(&Entity, Value) -> (Value, Vec<EntityEvent>) + Send + 'static,
    {
        settle(user.entity(), options, dispatch(&self.transport, request), apply)
    }
}

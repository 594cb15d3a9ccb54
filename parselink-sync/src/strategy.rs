//! Sync strategies.
//!
//! A [`SyncStrategy`] turns a (verb, target) pair into a request and a
//! pending result. Strategies are plain objects composed by the caller:
//! [`ClassSync`](crate::ClassSync) handles class-backed targets and wraps a
//! fallback for local ones, [`Lifecycle`](crate::Lifecycle) wraps any
//! strategy with the save/fetch/destroy completion rules.

use crate::error::{SyncError, SyncResult};
use crate::request::{RequestDescriptor, Verb};
use crate::transport::{PendingRequest, Transport, dispatch};
use parselink_model::{Attributes, Collection, Entity, SyncProtocol};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Called with `(entity, response, options)` once a request succeeds,
/// before the lifecycle event is emitted.
pub type SuccessCallback = Arc<dyn Fn(&Entity, &Value, &SyncOptions) + Send + Sync>;

/// Called with `(entity, error, options)` once a request fails, before the
/// `error` event is emitted.
pub type ErrorCallback = Arc<dyn Fn(&Entity, &SyncError, &SyncOptions) + Send + Sync>;

/// Per-call options.
#[derive(Clone, Default)]
pub struct SyncOptions {
    /// Replaces the serialized attributes as the body of create/update.
    pub body: Option<Value>,
    /// Filter sent as `where` on reads.
    pub query: Option<Value>,
    success: Option<SuccessCallback>,
    error: Option<ErrorCallback>,
}

impl SyncOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, query: Value) -> Self {
        self.query = Some(query);
        self
    }

    pub fn on_success<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Entity, &Value, &SyncOptions) + Send + Sync + 'static,
    {
        self.success = Some(Arc::new(callback));
        self
    }

    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Entity, &SyncError, &SyncOptions) + Send + Sync + 'static,
    {
        self.error = Some(Arc::new(callback));
        self
    }

    pub fn success(&self) -> Option<&SuccessCallback> {
        self.success.as_ref()
    }

    pub fn error(&self) -> Option<&ErrorCallback> {
        self.error.as_ref()
    }
}

impl fmt::Debug for SyncOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncOptions")
            .field("body", &self.body.is_some())
            .field("query", &self.query)
            .field("success", &self.success.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}

/// What a verb is applied to.
#[derive(Debug, Clone, Copy)]
pub enum SyncTarget<'a> {
    Entity(&'a Entity),
    Collection(&'a Collection),
}

impl SyncTarget<'_> {
    pub fn protocol(&self) -> &SyncProtocol {
        match self {
            SyncTarget::Entity(e) => e.protocol(),
            SyncTarget::Collection(c) => c.protocol(),
        }
    }

    /// The entity's identifier. Collections have none.
    pub fn id(&self) -> Option<String> {
        match self {
            SyncTarget::Entity(e) => e.id(),
            SyncTarget::Collection(_) => None,
        }
    }

    /// The serialized attributes sent on create/update.
    pub fn attributes(&self) -> Option<Attributes> {
        match self {
            SyncTarget::Entity(e) => Some(e.to_json()),
            SyncTarget::Collection(_) => None,
        }
    }

    /// The JSON body for `verb`: the explicit body if one was given,
    /// otherwise the serialized attributes for create/update.
    pub(crate) fn body_for(&self, verb: Verb, options: &SyncOptions) -> Option<Value> {
        if !verb.sends_attributes() {
            return None;
        }
        options
            .body
            .clone()
            .or_else(|| self.attributes().map(Value::Object))
    }
}

impl<'a> From<&'a Entity> for SyncTarget<'a> {
    fn from(entity: &'a Entity) -> Self {
        SyncTarget::Entity(entity)
    }
}

impl<'a> From<&'a Collection> for SyncTarget<'a> {
    fn from(collection: &'a Collection) -> Self {
        SyncTarget::Collection(collection)
    }
}

/// Routes a verb against a target to a transport.
pub trait SyncStrategy: Send + Sync {
    /// Builds the request without issuing it. Precondition failures are
    /// returned here.
    fn request(
        &self,
        verb: Verb,
        target: SyncTarget<'_>,
        options: &SyncOptions,
    ) -> SyncResult<RequestDescriptor>;

    /// The transport requests are sent through.
    fn transport(&self) -> &Arc<dyn Transport>;

    /// Builds and issues the request. The pending result is the raw,
    /// unnormalized response.
    fn sync(
        &self,
        verb: Verb,
        target: SyncTarget<'_>,
        options: &SyncOptions,
    ) -> SyncResult<PendingRequest> {
        let request = self.request(verb, target, options)?;
        Ok(dispatch(self.transport(), request))
    }
}

//! Save/fetch/destroy completion.
//!
//! Strategies return the raw response. The lifecycle normalizes it, writes
//! it onto the entity, runs the caller's callback and then emits events, in
//! that order, for every verb. Failures run the error callback and emit
//! [`EntityEvent::Error`].

use crate::error::SyncResult;
use crate::request::Verb;
use crate::strategy::{SyncOptions, SyncStrategy, SyncTarget};
use crate::transport::PendingRequest;
use parselink_model::{Collection, Entity, EntityEvent};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Completes `pending` against `entity`.
///
/// `apply` receives the raw response, mutates the entity and returns the
/// value handed to the success callback together with the events to emit.
pub(crate) fn settle<F>(
    entity: &Entity,
    options: SyncOptions,
    pending: PendingRequest,
    apply: F,
) -> PendingRequest
where
    F: FnOnce(&Entity, Value) -> (Value, Vec<EntityEvent>) + Send + 'static,
{
    let entity = entity.clone();
    Box::pin(async move {
        match pending.await {
            Ok(raw) => {
                let (response, events) = apply(&entity, raw);
                if let Some(callback) = options.success() {
                    callback(&entity, &response, &options);
                }
                for event in events {
                    debug!(event = event.name(), "entity event");
                    entity.emit(event);
                }
                Ok(response)
            }
            Err(err) => {
                warn!(error = %err, "sync failed");
                if let Some(callback) = options.error() {
                    callback(&entity, &err, &options);
                }
                entity.emit(EntityEvent::Error {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    })
}

/// Parses the response, sets it on the entity and yields the parsed value.
pub(crate) fn apply_parsed(entity: &Entity, raw: Value) -> Value {
    let parsed = entity.parse(raw);
    entity.apply(&parsed);
    parsed
}

/// The host-side save/fetch/destroy cycle over any strategy.
#[derive(Clone)]
pub struct Lifecycle {
    strategy: Arc<dyn SyncStrategy>,
}

impl Lifecycle {
    pub fn new(strategy: Arc<dyn SyncStrategy>) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> &Arc<dyn SyncStrategy> {
        &self.strategy
    }

    /// Creates the entity if it is new, updates it otherwise.
    pub fn save(&self, entity: &Entity, options: SyncOptions) -> SyncResult<PendingRequest> {
        let verb = if entity.is_new() {
            Verb::Create
        } else {
            Verb::Update
        };
        let pending = self.strategy.sync(verb, entity.into(), &options)?;
        Ok(settle(entity, options, pending, |entity, raw| {
            (apply_parsed(entity, raw), vec![EntityEvent::Sync])
        }))
    }

    /// Reads the entity's server state into it.
    pub fn fetch(&self, entity: &Entity, options: SyncOptions) -> SyncResult<PendingRequest> {
        let pending = self.strategy.sync(Verb::Read, entity.into(), &options)?;
        Ok(settle(entity, options, pending, |entity, raw| {
            (apply_parsed(entity, raw), vec![EntityEvent::Sync])
        }))
    }

    /// Deletes the entity remotely. A new entity never reached the server,
    /// so it is destroyed locally without a request.
    pub fn destroy(&self, entity: &Entity, options: SyncOptions) -> SyncResult<PendingRequest> {
        if entity.is_new() {
            let done: PendingRequest = Box::pin(async { Ok(Value::Null) });
            return Ok(settle(entity, options, done, |_, raw| {
                (raw, vec![EntityEvent::Destroy])
            }));
        }
        let pending = self.strategy.sync(Verb::Delete, entity.into(), &options)?;
        Ok(settle(entity, options, pending, |_, raw| {
            (raw, vec![EntityEvent::Destroy, EntityEvent::Sync])
        }))
    }

    /// Reads a whole collection and resets its models from the response.
    ///
    /// Resolves to the parsed rows. Entity callbacks in `options` are not
    /// used: there is no single entity to hand them.
    pub fn fetch_collection(
        &self,
        collection: &Collection,
        options: SyncOptions,
    ) -> SyncResult<PendingRequest> {
        let pending = self
            .strategy
            .sync(Verb::Read, SyncTarget::Collection(collection), &options)?;
        let collection = collection.clone();
        Ok(Box::pin(async move {
            let parsed = collection.parse(pending.await?);
            collection.reset(parsed.clone())?;
            Ok(parsed)
        }))
    }
}

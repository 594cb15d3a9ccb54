use crate::entity::Entity;
use crate::normalize;
use crate::protocol::SyncProtocol;
use crate::{ModelError, kind_of};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// An ordered set of entities sharing one [`SyncProtocol`].
///
/// Like [`Entity`], a `Collection` is a shared handle.
#[derive(Clone)]
pub struct Collection {
    inner: Arc<Inner>,
}

struct Inner {
    protocol: SyncProtocol,
    models: RwLock<Vec<Entity>>,
}

impl Collection {
    pub fn new(protocol: SyncProtocol) -> Self {
        Self {
            inner: Arc::new(Inner {
                protocol,
                models: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Creates a collection over the named remote class.
    pub fn of_class(name: impl Into<String>) -> Self {
        Self::new(SyncProtocol::class(name))
    }

    pub fn protocol(&self) -> &SyncProtocol {
        &self.inner.protocol
    }

    pub fn class_name(&self) -> Option<&str> {
        self.inner.protocol.class_name()
    }

    /// Collection parse rule: a class-backed collection unwraps the
    /// `results` envelope; anything else gets the raw value back.
    pub fn parse(&self, raw: Value) -> Value {
        if self.class_name().is_some() {
            normalize::unwrap_results(raw)
        } else {
            raw
        }
    }

    /// Replaces the models with entities built from a parsed array.
    ///
    /// Each row goes through the entity parse rule. Returns the new length.
    pub fn reset(&self, parsed: Value) -> crate::Result<usize> {
        let rows = match parsed {
            Value::Array(rows) => rows,
            other => return Err(ModelError::NotACollection(kind_of(&other))),
        };

        let models = rows
            .into_iter()
            .map(|row| Entity::from_value(self.protocol().clone(), normalize::strip_timestamps(row)))
            .collect::<crate::Result<Vec<_>>>()?;

        let len = models.len();
        *self.write() = models;
        debug!(class = ?self.class_name(), len, "collection reset");
        Ok(len)
    }

    /// Appends an entity.
    pub fn add(&self, entity: Entity) {
        self.write().push(entity);
    }

    /// A snapshot of the current models, in order.
    pub fn models(&self) -> Vec<Entity> {
        self.read().clone()
    }

    /// Looks a model up by identifier.
    pub fn get(&self, id: &str) -> Option<Entity> {
        self.read()
            .iter()
            .find(|e| e.id().as_deref() == Some(id))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<Entity>> {
        self.inner.models.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Entity>> {
        self.inner.models.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("protocol", &self.inner.protocol)
            .field("len", &self.len())
            .finish()
    }
}

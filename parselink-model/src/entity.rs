use crate::event::EntityEvent;
use crate::normalize;
use crate::protocol::SyncProtocol;
use crate::{ModelError, kind_of};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;

/// The attribute bag of an entity.
pub type Attributes = Map<String, Value>;

/// Name of the identifier attribute assigned by the document store.
pub const ID_ATTRIBUTE: &str = "objectId";

/// Name of the session credential attribute. Never serialized into a body.
pub const SESSION_TOKEN_ATTRIBUTE: &str = "sessionToken";

const EVENT_CAPACITY: usize = 64;

/// A local representation of one remote record.
///
/// `Entity` is a handle: clones share the same attributes and event
/// channel, so a clone moved into a pending request updates the same
/// record the caller holds. Concurrent writers are not serialized beyond
/// the per-call lock; the last write wins.
#[derive(Clone)]
pub struct Entity {
    inner: Arc<Inner>,
}

struct Inner {
    protocol: SyncProtocol,
    attributes: RwLock<Attributes>,
    events: broadcast::Sender<EntityEvent>,
}

impl Entity {
    /// Creates an empty entity with the given protocol.
    pub fn new(protocol: SyncProtocol) -> Self {
        Self::with_attributes(protocol, Attributes::new())
    }

    /// Creates an entity pre-populated with attributes.
    pub fn with_attributes(protocol: SyncProtocol, attributes: Attributes) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                protocol,
                attributes: RwLock::new(attributes),
                events,
            }),
        }
    }

    /// Creates an entity stored in the named remote class.
    pub fn of_class(name: impl Into<String>) -> Self {
        Self::new(SyncProtocol::class(name))
    }

    /// Creates an entity from a JSON object.
    pub fn from_value(protocol: SyncProtocol, value: Value) -> crate::Result<Self> {
        match value {
            Value::Object(map) => Ok(Self::with_attributes(protocol, map)),
            other => Err(ModelError::NotAnObject(kind_of(&other))),
        }
    }

    pub fn protocol(&self) -> &SyncProtocol {
        &self.inner.protocol
    }

    pub fn class_name(&self) -> Option<&str> {
        self.inner.protocol.class_name()
    }

    /// The identifier assigned by the server, rendered as a string.
    pub fn id(&self) -> Option<String> {
        match self.read().get(ID_ATTRIBUTE)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// True until the server has assigned an identifier.
    pub fn is_new(&self) -> bool {
        self.id().is_none()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.read().get(key).cloned()
    }

    /// Reads a string attribute. Other kinds read as `None`.
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.read().get(key).and_then(Value::as_str).map(str::to_owned)
    }

    /// True when the attribute is present and not null.
    pub fn has(&self, key: &str) -> bool {
        self.read().get(key).is_some_and(|v| !v.is_null())
    }

    /// Sets one attribute, emitting a change event if the value differs.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        let changed = {
            let mut attributes = self.write();
            let changed = attributes.get(&key) != Some(&value);
            attributes.insert(key.clone(), value);
            changed
        };
        if changed {
            self.emit(EntityEvent::Change { attribute: key });
        }
    }

    /// Sets every attribute in the map.
    pub fn set_all(&self, attributes: Attributes) {
        for (key, value) in attributes {
            self.set(key, value);
        }
    }

    /// Removes an attribute and returns its previous value.
    pub fn unset(&self, key: &str) -> Option<Value> {
        let removed = self.write().remove(key);
        if removed.is_some() {
            self.emit(EntityEvent::Change {
                attribute: key.to_string(),
            });
        }
        removed
    }

    /// Removes every attribute, identifier included.
    pub fn clear(&self) {
        let removed = std::mem::take(&mut *self.write());
        for key in removed.into_iter().map(|(k, _)| k) {
            self.emit(EntityEvent::Change { attribute: key });
        }
    }

    /// A snapshot of all attributes.
    pub fn attributes(&self) -> Attributes {
        self.read().clone()
    }

    /// The body sent to the server: attributes without server-managed
    /// timestamps and without the session token.
    pub fn to_json(&self) -> Attributes {
        let mut data = self.attributes();
        normalize::strip_timestamps_in_place(&mut data);
        data.remove(SESSION_TOKEN_ATTRIBUTE);
        data
    }

    /// Entity parse rule applied to server responses.
    pub fn parse(&self, response: Value) -> Value {
        normalize::strip_timestamps(response)
    }

    /// Sets the fields of an already parsed response. Non-object responses
    /// leave the entity untouched.
    pub fn apply(&self, parsed: &Value) {
        if let Value::Object(map) = parsed {
            self.set_all(map.clone());
        }
    }

    /// Subscribes to this entity's events.
    ///
    /// Events sent before the call are not replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<EntityEvent> {
        self.inner.events.subscribe()
    }

    /// Emits an event to every current subscriber.
    pub fn emit(&self, event: EntityEvent) {
        // No subscribers is not an error.
        let _ = self.inner.events.send(event);
    }

    /// True when both handles point at the same record.
    pub fn ptr_eq(&self, other: &Entity) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn read(&self) -> RwLockReadGuard<'_, Attributes> {
        self.inner
            .attributes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Attributes> {
        self.inner
            .attributes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut attributes = self.attributes();
        if attributes.contains_key(SESSION_TOKEN_ATTRIBUTE) {
            attributes.insert(SESSION_TOKEN_ATTRIBUTE.into(), Value::from("<redacted>"));
        }
        f.debug_struct("Entity")
            .field("protocol", &self.inner.protocol)
            .field("attributes", &attributes)
            .finish()
    }
}

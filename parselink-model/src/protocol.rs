/// How an entity or collection is persisted.
///
/// Chosen once at construction. The dispatchers route on this tag; they
/// never inspect attributes to decide where a request goes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SyncProtocol {
    /// Not backed by the document store. Requests fall through to the
    /// default REST strategy, addressed at `url_root` when one is set.
    Local { url_root: Option<String> },
    /// Stored in the remote class with this name.
    Class(String),
}

impl SyncProtocol {
    /// Shorthand for a class-backed protocol.
    pub fn class(name: impl Into<String>) -> Self {
        Self::Class(name.into())
    }

    /// Shorthand for a local protocol with a REST root.
    pub fn local_at(url_root: impl Into<String>) -> Self {
        Self::Local {
            url_root: Some(url_root.into()),
        }
    }

    /// The remote class name, if any.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            Self::Class(name) => Some(name),
            Self::Local { .. } => None,
        }
    }

    /// The REST root for local entities.
    pub fn url_root(&self) -> Option<&str> {
        match self {
            Self::Local { url_root } => url_root.as_deref(),
            Self::Class(_) => None,
        }
    }

    /// Returns true when requests go to the document store's class endpoints.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Class(_))
    }
}

impl Default for SyncProtocol {
    fn default() -> Self {
        Self::Local { url_root: None }
    }
}

//! Generic entity dispatcher for the store's `/classes` endpoints.

use crate::config::ParseConfig;
use crate::error::{SyncError, SyncResult};
use crate::request::{RequestDescriptor, Verb};
use crate::rest_sync::RestSync;
use crate::strategy::{SyncOptions, SyncStrategy, SyncTarget};
use crate::transport::{PendingRequest, Transport};
use parselink_model::SyncProtocol;
use std::sync::Arc;
use tracing::debug;

/// Routes class-backed entities and collections to
/// `{server}/classes/{class}[/{id}]`.
///
/// Targets declared [`SyncProtocol::Local`] are handed, unchanged, to the
/// fallback strategy ([`RestSync`] unless replaced).
pub struct ClassSync {
    config: Arc<ParseConfig>,
    transport: Arc<dyn Transport>,
    fallback: Arc<dyn SyncStrategy>,
}

impl ClassSync {
    pub fn new(config: Arc<ParseConfig>, transport: Arc<dyn Transport>) -> Self {
        let fallback = Arc::new(RestSync::new(Arc::clone(&transport)));
        Self {
            config,
            transport,
            fallback,
        }
    }

    /// Replaces the strategy used for local targets.
    pub fn with_fallback(mut self, fallback: Arc<dyn SyncStrategy>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn config(&self) -> &ParseConfig {
        &self.config
    }

    fn class_request(
        &self,
        class_name: &str,
        verb: Verb,
        target: SyncTarget<'_>,
        options: &SyncOptions,
    ) -> SyncResult<RequestDescriptor> {
        let mut path = format!("/classes/{}", urlencoding::encode(class_name));
        // Only collections read the bare class endpoint.
        if verb != Verb::Create && matches!(target, SyncTarget::Entity(_)) {
            let id = target
                .id()
                .filter(|id| !id.is_empty())
                .ok_or(SyncError::MissingId)?;
            path.push('/');
            path.push_str(&urlencoding::encode(&id));
        }

        let request = self.config.request(verb.method(), &path);

        if let Some(body) = target.body_for(verb, options) {
            return Ok(request.json(body));
        }
        if verb == Verb::Read {
            if let Some(query) = &options.query {
                let filter = serde_json::to_string(query)?;
                return Ok(request.query(format!("where={}", urlencoding::encode(&filter))));
            }
        }
        Ok(request)
    }
}

impl SyncStrategy for ClassSync {
    fn request(
        &self,
        verb: Verb,
        target: SyncTarget<'_>,
        options: &SyncOptions,
    ) -> SyncResult<RequestDescriptor> {
        match target.protocol() {
            SyncProtocol::Class(name) => self.class_request(name, verb, target, options),
            SyncProtocol::Local { .. } => self.fallback.request(verb, target, options),
        }
    }

    fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    fn sync(
        &self,
        verb: Verb,
        target: SyncTarget<'_>,
        options: &SyncOptions,
    ) -> SyncResult<PendingRequest> {
        match target.protocol() {
            SyncProtocol::Class(class) => {
                debug!(?verb, %class, "class sync");
                let request = self.class_request(class, verb, target, options)?;
                Ok(crate::transport::dispatch(&self.transport, request))
            }
            SyncProtocol::Local { .. } => self.fallback.sync(verb, target, options),
        }
    }
}

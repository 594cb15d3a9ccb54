//! Default REST strategy for entities outside the document store.

use crate::error::{SyncError, SyncResult};
use crate::request::{RequestDescriptor, Verb};
use crate::strategy::{SyncOptions, SyncStrategy, SyncTarget};
use crate::transport::Transport;
use std::sync::Arc;

/// Plain JSON-over-REST sync addressed at the protocol's `url_root`.
///
/// Sends no store headers. Entities map to `{url_root}/{id}`, collections
/// and new entities to `{url_root}`.
pub struct RestSync {
    transport: Arc<dyn Transport>,
}

impl RestSync {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

impl SyncStrategy for RestSync {
    fn request(
        &self,
        verb: Verb,
        target: SyncTarget<'_>,
        options: &SyncOptions,
    ) -> SyncResult<RequestDescriptor> {
        let root = target
            .protocol()
            .url_root()
            .ok_or(SyncError::MissingUrl)?
            .trim_end_matches('/');

        let url = match target.id() {
            Some(id) if verb != Verb::Create => format!("{root}/{}", urlencoding::encode(&id)),
            _ => root.to_string(),
        };

        let request = RequestDescriptor::new(verb.method(), url);
        Ok(match target.body_for(verb, options) {
            Some(body) => request.json(body),
            None => request,
        })
    }

    fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }
}

//! Transport layer abstraction.
//!
//! Dispatchers only shape [`RequestDescriptor`]s; a [`Transport`] executes
//! them. [`HttpTransport`](crate::HttpTransport) talks to a real server,
//! [`mock::MockTransport`] records calls for tests.

use crate::error::SyncResult;
use crate::request::RequestDescriptor;
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use std::sync::Arc;

/// The eventual outcome of a dispatched request.
pub type PendingRequest = BoxFuture<'static, SyncResult<Value>>;

/// Executes request descriptors.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issues the request and returns the decoded JSON response.
    /// An empty response body decodes to `Value::Null`.
    async fn execute(&self, request: RequestDescriptor) -> SyncResult<Value>;
}

/// Wraps a transport call into a `'static` pending request.
pub fn dispatch(transport: &Arc<dyn Transport>, request: RequestDescriptor) -> PendingRequest {
    let transport = Arc::clone(transport);
    Box::pin(async move { transport.execute(request).await })
}

/// A mock transport for testing.
pub mod mock {
    use super::*;
    use crate::error::SyncError;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Records every request and answers from a queue.
    ///
    /// When the queue is empty the default response is returned
    /// (an empty JSON object unless set with [`MockTransport::responding`]).
    #[derive(Debug)]
    pub struct MockTransport {
        requests: Mutex<Vec<RequestDescriptor>>,
        queued: Mutex<VecDeque<SyncResult<Value>>>,
        default_response: Value,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::responding(Value::Object(Default::default()))
        }

        /// Answers every unqueued request with `response`.
        pub fn responding(response: Value) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                queued: Mutex::new(VecDeque::new()),
                default_response: response,
            }
        }

        /// Queues a successful response.
        pub fn push_response(&self, response: Value) {
            self.queued.lock().unwrap().push_back(Ok(response));
        }

        /// Queues a failure.
        pub fn push_error(&self, error: SyncError) {
            self.queued.lock().unwrap().push_back(Err(error));
        }

        /// All requests received so far, in order.
        pub fn requests(&self) -> Vec<RequestDescriptor> {
            self.requests.lock().unwrap().clone()
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        pub fn last_request(&self) -> Option<RequestDescriptor> {
            self.requests.lock().unwrap().last().cloned()
        }
    }

    impl Default for MockTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn execute(&self, request: RequestDescriptor) -> SyncResult<Value> {
            self.requests.lock().unwrap().push(request);
            self.queued
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(self.default_response.clone()))
        }
    }
}

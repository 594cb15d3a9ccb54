//! Sync dispatchers binding parselink entities to a Parse-style REST
//! document store.
//!
//! # Architecture
//!
//! Entities declare how they persist through their
//! [`SyncProtocol`](parselink_model::SyncProtocol). A dispatcher turns a
//! verb against an entity or collection into a [`RequestDescriptor`] and
//! hands it to a [`Transport`]:
//!
//! - **ClassSync**: class-backed entities, `{server}/classes/{class}[/{id}]`
//! - **RestSync**: the fallback for local entities, `{url_root}[/{id}]`
//! - **SessionSync**: the current user's signup/login/update/retrieve/logout
//! - **Lifecycle**: save/fetch/destroy completion over any strategy
//!
//! Precondition failures (missing credentials, missing session, signing up
//! an existing user) are returned when the verb is called. Everything after
//! that resolves through the returned [`PendingRequest`].
//!
//! # Example
//!
//! ```
//! use parselink_model::Entity;
//! use parselink_sync::transport::mock::MockTransport;
//! use parselink_sync::{ClassSync, ParseConfig, SyncStrategy, SyncOptions, Verb};
//! use std::sync::Arc;
//!
//! let config = Arc::new(ParseConfig::new("http://localhost:1337/parse", "myApp").unwrap());
//! let sync = ClassSync::new(config, Arc::new(MockTransport::new()));
//!
//! let post = Entity::of_class("Post");
//! let request = sync.request(Verb::Create, (&post).into(), &SyncOptions::new()).unwrap();
//! assert_eq!(request.url, "http://localhost:1337/parse/classes/Post");
//! ```

mod class_sync;
mod config;
mod error;
mod http;
mod lifecycle;
mod request;
mod rest_sync;
mod session;
mod strategy;
pub mod transport;

pub use class_sync::ClassSync;
pub use config::{
    APP_ID_ENV, DEFAULT_APP_ID, DEFAULT_SERVER_URL, DEFAULT_TIMEOUT, ParseConfig,
    REST_API_KEY_ENV, SERVER_URL_ENV,
};
pub use error::{SyncError, SyncResult};
pub use http::HttpTransport;
pub use lifecycle::Lifecycle;
pub use request::{
    APPLICATION_ID_HEADER, ContentType, HttpMethod, REST_API_KEY_HEADER, RequestBody,
    RequestDescriptor, SESSION_TOKEN_HEADER, Verb,
};
pub use rest_sync::RestSync;
pub use session::SessionSync;
pub use strategy::{ErrorCallback, SuccessCallback, SyncOptions, SyncStrategy, SyncTarget};
pub use transport::{PendingRequest, Transport, dispatch};

//! HTTP transport backed by reqwest.

use crate::config::ParseConfig;
use crate::error::{SyncError, SyncResult};
use crate::request::{HttpMethod, RequestBody, RequestDescriptor};
use crate::transport::Transport;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::{debug, warn};

/// Executes request descriptors over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Builds a client honoring the configured timeout.
    pub fn new(config: &ParseConfig) -> SyncResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| SyncError::Config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Uses an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: RequestDescriptor) -> SyncResult<Value> {
        let RequestDescriptor {
            method,
            mut url,
            headers,
            body,
            content_type,
            process_data,
        } = request;

        if let Some(RequestBody::Query(encoded)) = &body {
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(encoded);
        }

        debug!(%method, %url, "dispatching request");

        let mut builder = self.client.request(method.into(), &url);
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match body {
            Some(RequestBody::Json(value)) => builder
                .header(CONTENT_TYPE, content_type.as_str())
                .body(serde_json::to_vec(&value)?),
            Some(RequestBody::Form(pairs)) if process_data && method == HttpMethod::Get => {
                builder.query(&pairs)
            }
            Some(RequestBody::Form(pairs)) if process_data => builder.form(&pairs),
            Some(RequestBody::Form(pairs)) => {
                let raw = pairs
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect::<Vec<_>>()
                    .join("&");
                builder.header(CONTENT_TYPE, content_type.as_str()).body(raw)
            }
            Some(RequestBody::Query(_)) | None => builder,
        };

        let response = builder
            .send()
            .await
            // reqwest errors print the final URL, which holds login
            // credentials when a form was encoded into the query.
            .map_err(|e| SyncError::Network(format!("{method} {url} failed: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(%method, %url, status = status.as_u16(), "request rejected");
            return Err(SyncError::remote(status.as_u16(), &text));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SyncError::Network(format!("failed to read response body: {}", e.without_url())))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

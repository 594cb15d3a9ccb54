//! Request descriptors.
//!
//! A [`RequestDescriptor`] is everything a transport needs to issue one
//! HTTP call. Dispatchers build one per verb and hand it off; nothing keeps
//! it afterwards.

use serde_json::Value;
use std::fmt;

pub const APPLICATION_ID_HEADER: &str = "X-Parse-Application-Id";
pub const SESSION_TOKEN_HEADER: &str = "X-Parse-Session-Token";
pub const REST_API_KEY_HEADER: &str = "X-Parse-REST-API-Key";

/// CRUD intent against an entity or collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Create,
    Read,
    Update,
    Delete,
}

impl Verb {
    pub fn method(self) -> HttpMethod {
        match self {
            Verb::Create => HttpMethod::Post,
            Verb::Read => HttpMethod::Get,
            Verb::Update => HttpMethod::Put,
            Verb::Delete => HttpMethod::Delete,
        }
    }

    /// Verbs that carry the entity's attributes as the body.
    pub fn sends_attributes(self) -> bool {
        matches!(self, Verb::Create | Verb::Update)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Json,
    FormUrlEncoded,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Json => "application/json",
            ContentType::FormUrlEncoded => "application/x-www-form-urlencoded",
        }
    }
}

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Serialized as the JSON request body.
    Json(Value),
    /// Key/value pairs. URL-encoded by the transport: into the query
    /// string for GET, into the body otherwise.
    Form(Vec<(String, String)>),
    /// An already encoded query string, appended to the URL verbatim.
    Query(String),
}

/// One HTTP call, fully described.
#[derive(Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    pub content_type: ContentType,
    /// When true the transport encodes [`RequestBody::Form`] pairs itself;
    /// when false the body is sent as prepared.
    pub process_data: bool,
}

impl RequestDescriptor {
    /// A JSON request with no headers and no body.
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            content_type: ContentType::Json,
            process_data: false,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self.content_type = ContentType::Json;
        self.process_data = false;
        self
    }

    pub fn form(mut self, pairs: Vec<(String, String)>) -> Self {
        self.body = Some(RequestBody::Form(pairs));
        self.content_type = ContentType::FormUrlEncoded;
        self.process_data = true;
        self
    }

    pub fn query(mut self, encoded: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Query(encoded.into()));
        self.process_data = false;
        self
    }

    /// Looks a header up, ignoring case.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The JSON body, if that is what this request carries.
    pub fn json_body(&self) -> Option<&Value> {
        match &self.body {
            Some(RequestBody::Json(v)) => Some(v),
            _ => None,
        }
    }

    /// A form field, if this request carries form data.
    pub fn form_value(&self, name: &str) -> Option<&str> {
        match &self.body {
            Some(RequestBody::Form(pairs)) => pairs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }
}

// Header values and form data may hold credentials, so only names are shown.
impl fmt::Debug for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header_names: Vec<&str> = self.headers.iter().map(|(k, _)| k.as_str()).collect();
        let body = match &self.body {
            None => "none",
            Some(RequestBody::Json(_)) => "json",
            Some(RequestBody::Form(_)) => "form",
            Some(RequestBody::Query(_)) => "query",
        };
        f.debug_struct("RequestDescriptor")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &header_names)
            .field("body", &body)
            .field("content_type", &self.content_type)
            .field("process_data", &self.process_data)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn verb_method_map() {
        assert_eq!(Verb::Create.method(), HttpMethod::Post);
        assert_eq!(Verb::Read.method(), HttpMethod::Get);
        assert_eq!(Verb::Update.method(), HttpMethod::Put);
        assert_eq!(Verb::Delete.method(), HttpMethod::Delete);
    }

    #[test]
    fn form_switches_encoding_mode() {
        let req = RequestDescriptor::new(HttpMethod::Get, "http://x/login")
            .form(vec![("username".into(), "u".into())]);
        assert_eq!(req.content_type, ContentType::FormUrlEncoded);
        assert!(req.process_data);
        assert_eq!(req.form_value("username"), Some("u"));
        assert_eq!(req.json_body(), None);
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = RequestDescriptor::new(HttpMethod::Get, "http://x").header("X-Parse-Session-Token", "r:1");
        assert_eq!(req.header_value("x-parse-session-token"), Some("r:1"));
    }

    #[test]
    fn debug_hides_secrets() {
        let req = RequestDescriptor::new(HttpMethod::Put, "http://x/users/1")
            .header(SESSION_TOKEN_HEADER, "r:secret")
            .json(json!({"password": "Zorro"}));
        let debug = format!("{req:?}");
        assert!(debug.contains(SESSION_TOKEN_HEADER));
        assert!(!debug.contains("r:secret"));
        assert!(!debug.contains("Zorro"));
    }
}

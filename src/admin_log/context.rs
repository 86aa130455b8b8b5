use std::{collections::HashMap, convert::Infallible, future::Future, net::SocketAddr};

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{header::HOST, request::Parts, Extensions, HeaderMap, Method, Uri},
};
use serde_json::Value;

use super::error::AdminLogError;

pub const USER_ID: &str = "userId";
pub const EMAIL: &str = "email";
pub const USER_ROLE: &str = "userRole";

const REQUEST_ID_HEADER: &str = "x-request-id";
const FORWARDED_PROTO_HEADER: &str = "x-forwarded-proto";

/// Request id assigned once per request and stored in its extensions, so
/// every context built for that request agrees on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    /// Takes `x-request-id` when the caller sent one, else a fresh UUID.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let id = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        Self(id)
    }
}

tokio::task_local! {
    static CURRENT: RequestContext;
}

/// String-keyed request attributes, attached as a request extension by
/// whatever authenticated the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestAttributes(HashMap<String, Value>);

impl RequestAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Everything the interceptor knows about the request being served.
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: Method,
    url: String,
    client_addr: Option<SocketAddr>,
    request_id: String,
    attributes: RequestAttributes,
}

impl RequestContext {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            client_addr: None,
            request_id: uuid::Uuid::new_v4().to_string(),
            attributes: RequestAttributes::default(),
        }
    }

    pub fn with_client_addr(mut self, addr: SocketAddr) -> Self {
        self.client_addr = Some(addr);
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    pub fn with_attributes(mut self, attributes: RequestAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key, value);
        self
    }

    /// Builds the context from the pieces of an incoming request.
    pub fn from_http(
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        extensions: &Extensions,
    ) -> Self {
        let RequestId(request_id) = extensions
            .get::<RequestId>()
            .cloned()
            .unwrap_or_else(|| RequestId::from_headers(headers));

        Self {
            method: method.clone(),
            url: request_url(uri, headers),
            client_addr: extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| *addr),
            request_id,
            attributes: extensions
                .get::<RequestAttributes>()
                .cloned()
                .unwrap_or_default(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn client_addr(&self) -> Option<SocketAddr> {
        self.client_addr
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Returns the context bound to the current task, if any.
    pub fn current() -> Result<Self, AdminLogError> {
        CURRENT
            .try_with(|ctx| ctx.clone())
            .map_err(|_| AdminLogError::MissingContext)
    }

    /// Runs `fut` with this context bound as the task's current request.
    pub async fn scope<F>(self, fut: F) -> F::Output
    where
        F: Future,
    {
        CURRENT.scope(self, fut).await
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_http(
            &parts.method,
            &parts.uri,
            &parts.headers,
            &parts.extensions,
        ))
    }
}

// Scheme, host and path; the query string is left out.
fn request_url(uri: &Uri, headers: &HeaderMap) -> String {
    if let (Some(scheme), Some(authority)) = (uri.scheme_str(), uri.authority()) {
        return format!("{}://{}{}", scheme, authority, uri.path());
    }

    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    match header(HOST.as_str()) {
        Some(host) => {
            let scheme = header(FORWARDED_PROTO_HEADER).unwrap_or("http");
            format!("{}://{}{}", scheme, host, uri.path())
        }
        None => uri.path().to_string(),
    }
}

/// Identity of the caller as far as the attributes tell it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerAttributes {
    pub user_id: Option<i64>,
    pub email: Option<String>,
    pub user_role: Option<String>,
}

impl CallerAttributes {
    /// Attributes that are absent or of the wrong type are treated as unknown.
    pub fn from_context(ctx: &RequestContext) -> Self {
        Self {
            user_id: ctx.attribute(USER_ID).and_then(Value::as_i64),
            email: ctx
                .attribute(EMAIL)
                .and_then(Value::as_str)
                .map(str::to_string),
            user_role: ctx
                .attribute(USER_ROLE)
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }
}

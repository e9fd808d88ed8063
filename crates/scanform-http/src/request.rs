//! The request type handed to handlers and middleware.

use bytes::Bytes;
use http::request::Parts;
use http::{Extensions, HeaderMap, Method, Uri, Version};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// An HTTP request with its body fully buffered.
///
/// Carries the parsed head of the request, the buffered body, the shared
/// application state, and the path parameters captured by the router.
/// Middleware communicates with handlers through the per-request
/// [`extensions`](Request::extensions).
pub struct Request {
    parts: Parts,
    body: Bytes,
    state: Arc<Extensions>,
    path_params: HashMap<String, String>,
    endpoint: Option<Arc<str>>,
}

impl Request {
    /// Create a request from its parsed parts and a buffered body.
    pub fn new(
        parts: Parts,
        body: Bytes,
        state: Arc<Extensions>,
        path_params: HashMap<String, String>,
    ) -> Self {
        Self {
            parts,
            body,
            state,
            path_params,
            endpoint: None,
        }
    }

    /// Attach the endpoint name the router resolved for this request.
    pub fn with_endpoint(mut self, endpoint: Arc<str>) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// The HTTP method.
    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    /// The full request URI.
    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    /// The HTTP version.
    pub fn version(&self) -> Version {
        self.parts.version
    }

    /// The request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// Mutable access to the request headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.parts.headers
    }

    /// Per-request extensions, used by middleware to pass values inward.
    pub fn extensions(&self) -> &Extensions {
        &self.parts.extensions
    }

    /// Mutable access to the per-request extensions.
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.parts.extensions
    }

    /// The path component of the URI.
    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    /// The raw query string, if any.
    pub fn query_string(&self) -> Option<&str> {
        self.parts.uri.query()
    }

    /// The buffered request body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Take the body out of the request, leaving it empty.
    pub fn take_body(&mut self) -> Bytes {
        std::mem::take(&mut self.body)
    }

    /// All path parameters captured by the router.
    pub fn path_params(&self) -> &HashMap<String, String> {
        &self.path_params
    }

    /// A single path parameter by name.
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    /// Application state registered on the app at build time.
    pub fn state(&self) -> &Extensions {
        &self.state
    }

    /// The endpoint name of the matched route, if the request was routed.
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.parts.method)
            .field("uri", &self.parts.uri)
            .field("version", &self.parts.version)
            .field("endpoint", &self.endpoint)
            .field("path_params", &self.path_params)
            .field("body_len", &self.body.len())
            .finish()
    }
}

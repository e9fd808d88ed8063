//! In-process test client.

use crate::app::App;
use crate::response::Response;
use bytes::Bytes;
use http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use http::{HeaderMap, Method, StatusCode};
use http_body_util::BodyExt;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Drives an [`App`] without binding a socket.
///
/// Cookies from responses are remembered and replayed on later requests,
/// so session flows can be exercised the way a browser would run them.
pub struct TestClient {
    app: Arc<App>,
    cookies: Mutex<HashMap<String, String>>,
}

impl TestClient {
    /// Wrap a built application.
    pub fn new(app: App) -> Self {
        Self {
            app: Arc::new(app),
            cookies: Mutex::new(HashMap::new()),
        }
    }

    /// Send a GET request.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(TestRequest::get(path)).await
    }

    /// Send a POST request.
    pub async fn post(&self, path: &str) -> TestResponse {
        self.request(TestRequest::post(path)).await
    }

    /// Send an arbitrary request.
    pub async fn request(&self, req: TestRequest) -> TestResponse {
        let mut builder = http::Request::builder().method(req.method).uri(&req.path);

        let has_explicit_cookie = req
            .headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case("cookie"));
        for (name, value) in &req.headers {
            builder = builder.header(name, value);
        }
        if !has_explicit_cookie {
            let jar = self.lock_jar();
            if !jar.is_empty() {
                let header = jar
                    .iter()
                    .map(|(name, value)| format!("{name}={value}"))
                    .collect::<Vec<_>>()
                    .join("; ");
                builder = builder.header(COOKIE, header);
            }
        }

        let request = builder.body(req.body).expect("invalid test request");
        let response = self.app.handle(request).await;
        self.remember_cookies(&response);
        TestResponse::from_response(response).await
    }

    /// Forget all remembered cookies.
    pub fn clear_cookies(&self) {
        self.lock_jar().clear();
    }

    fn remember_cookies(&self, response: &Response) {
        let mut jar = self.lock_jar();
        for value in response.headers().get_all(SET_COOKIE) {
            let Ok(raw) = value.to_str() else { continue };
            let Ok(parsed) = cookie::Cookie::parse(raw.to_string()) else {
                continue;
            };
            let expired = parsed
                .max_age()
                .map(|age| !age.is_positive())
                .unwrap_or(false);
            if expired || parsed.value().is_empty() {
                jar.remove(parsed.name());
            } else {
                jar.insert(parsed.name().to_string(), parsed.value().to_string());
            }
        }
    }

    fn lock_jar(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.cookies.lock().unwrap_or_else(|err| err.into_inner())
    }
}

/// A request under construction.
#[derive(Debug, Clone)]
pub struct TestRequest {
    method: Method,
    path: String,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl TestRequest {
    /// Start a request with an arbitrary method.
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// Start a GET request.
    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    /// Start a POST request.
    pub fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    /// Start a DELETE request.
    pub fn delete(path: &str) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Add a header.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Set the content type.
    pub fn content_type(self, value: &str) -> Self {
        self.header(CONTENT_TYPE.as_str(), value)
    }

    /// Set a raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Set a urlencoded form body.
    pub fn form<T: Serialize>(self, form: &T) -> Self {
        let encoded = serde_urlencoded::to_string(form).expect("form serialization");
        self.content_type("application/x-www-form-urlencoded")
            .body(encoded)
    }
}

/// A buffered response with assertion helpers.
#[derive(Debug)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    async fn from_response(response: Response) -> Self {
        let (parts, body) = response.into_parts();
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(never) => match never {},
        };
        Self {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }

    /// The response status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A single header value as text.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// The raw response body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The response body as text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Assert the response status.
    #[track_caller]
    pub fn assert_status(self, expected: StatusCode) -> Self {
        assert_eq!(
            self.status, expected,
            "unexpected status, body: {}",
            self.text()
        );
        self
    }

    /// Assert the body contains a substring.
    #[track_caller]
    pub fn assert_body_contains(self, needle: &str) -> Self {
        assert!(
            self.text().contains(needle),
            "body does not contain {needle:?}: {}",
            self.text()
        );
        self
    }
}

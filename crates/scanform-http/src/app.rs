//! Application builder wiring routes, layers, and shared state.

use crate::error::Error;
use crate::middleware::{LayerStack, MiddlewareLayer};
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::router::{MethodRouter, RouteMatch, Router};
use crate::server::Server;
use bytes::Bytes;
use http::header::ALLOW;
use http::{Extensions, HeaderValue, Method};
use std::sync::Arc;

/// Default request body cap: 1 MiB.
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// The application: a router, a middleware chain, and shared state.
///
/// Built once at startup, then driven by the server loop, the test
/// client, or another front-end via [`handle`](App::handle).
pub struct App {
    router: Router,
    layers: LayerStack,
    state: Arc<Extensions>,
    body_limit: usize,
}

impl App {
    /// Create an empty application and install the tracing subscriber.
    ///
    /// Subscriber installation is best-effort so embedders keep their own.
    pub fn new() -> Self {
        init_tracing();
        Self {
            router: Router::new(),
            layers: LayerStack::new(),
            state: Arc::new(Extensions::new()),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Register a route.
    pub fn route(mut self, path: &str, method_router: MethodRouter) -> Self {
        self.router = self.router.route(path, method_router);
        self
    }

    /// Append a middleware layer. Layers run in the order they are added.
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: MiddlewareLayer,
    {
        self.layers.push(Box::new(layer));
        self
    }

    /// Register a shared state value, retrievable with the `State` extractor.
    pub fn state<T>(mut self, value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        Arc::make_mut(&mut self.state).insert(value);
        self
    }

    /// Cap accepted request bodies at `limit` bytes.
    pub fn body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    pub(crate) fn body_limit_bytes(&self) -> usize {
        self.body_limit
    }

    /// Dispatch one buffered request through the router and middleware.
    ///
    /// Unrouted requests answer 404 or 405 without entering the
    /// middleware chain; bodies over the cap answer 413.
    pub async fn handle(&self, req: http::Request<Bytes>) -> Response {
        let (parts, body) = req.into_parts();

        if body.len() > self.body_limit {
            return Error::payload_too_large(self.body_limit).into_response();
        }

        match self.router.find(parts.uri.path(), &parts.method) {
            RouteMatch::Found {
                handler,
                params,
                endpoint,
            } => {
                let request =
                    Request::new(parts, body, self.state.clone(), params).with_endpoint(endpoint);
                self.layers.execute(request, handler).await
            }
            RouteMatch::MethodNotAllowed { allowed } => {
                let mut res = Error::method_not_allowed().into_response();
                let value = allowed
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                if let Ok(value) = HeaderValue::from_str(&value) {
                    res.headers_mut().insert(ALLOW, value);
                }
                res
            }
            RouteMatch::NotFound => Error::not_found().into_response(),
        }
    }

    /// Bind `addr` and serve until the process exits.
    pub async fn run(self, addr: &str) -> std::io::Result<()> {
        Server::new(self).run(addr).await
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

fn init_tracing() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,scanform_http=debug,scanform_guard=debug,scanform_web=debug")
        }))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::{get, post};
    use http::StatusCode;

    async fn handler() -> &'static str {
        "ok"
    }

    fn build_request(method: Method, uri: &str, body: &'static [u8]) -> http::Request<Bytes> {
        http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Bytes::from_static(body))
            .unwrap()
    }

    #[tokio::test]
    async fn routes_dispatch_to_handlers() {
        let app = App::new().route("/scan", get(handler));
        let res = app.handle(build_request(Method::GET, "/scan", b"")).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_paths_answer_not_found() {
        let app = App::new().route("/scan", get(handler));
        let res = app.handle(build_request(Method::GET, "/missing", b"")).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn wrong_method_answers_with_allow_header() {
        let app = App::new().route("/scan", get(handler).post(handler));
        let res = app.handle(build_request(Method::DELETE, "/scan", b"")).await;
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.headers().get(ALLOW).unwrap(), "GET, POST");
    }

    #[tokio::test]
    async fn oversized_bodies_answer_payload_too_large() {
        let app = App::new().route("/scan", post(handler)).body_limit(8);
        let res = app
            .handle(build_request(Method::POST, "/scan", b"p=none&sp=none"))
            .await;
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}

//! Radix-tree router with per-route method dispatch.

use crate::handler::{boxed, BoxedHandler, Handler};
use http::Method;
use std::collections::HashMap;
use std::sync::Arc;

/// Handlers for one path, keyed by HTTP method.
///
/// The endpoint name identifies the route to middleware. It defaults to
/// the registered path pattern and can be overridden with
/// [`name`](MethodRouter::name).
#[derive(Clone, Default)]
pub struct MethodRouter {
    handlers: HashMap<Method, BoxedHandler>,
    name: Option<Arc<str>>,
}

impl MethodRouter {
    /// Create an empty method router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for an arbitrary method.
    pub fn on<H, T>(mut self, method: Method, handler: H) -> Self
    where
        H: Handler<T>,
    {
        self.handlers.insert(method, boxed(handler));
        self
    }

    /// Register a GET handler.
    pub fn get<H, T>(self, handler: H) -> Self
    where
        H: Handler<T>,
    {
        self.on(Method::GET, handler)
    }

    /// Register a POST handler.
    pub fn post<H, T>(self, handler: H) -> Self
    where
        H: Handler<T>,
    {
        self.on(Method::POST, handler)
    }

    /// Register a PUT handler.
    pub fn put<H, T>(self, handler: H) -> Self
    where
        H: Handler<T>,
    {
        self.on(Method::PUT, handler)
    }

    /// Register a DELETE handler.
    pub fn delete<H, T>(self, handler: H) -> Self
    where
        H: Handler<T>,
    {
        self.on(Method::DELETE, handler)
    }

    /// Register a PATCH handler.
    pub fn patch<H, T>(self, handler: H) -> Self
    where
        H: Handler<T>,
    {
        self.on(Method::PATCH, handler)
    }

    /// Override the endpoint name for this route.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(Arc::from(name.into()));
        self
    }

    fn allowed(&self) -> Vec<Method> {
        let mut methods: Vec<Method> = self.handlers.keys().cloned().collect();
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        methods
    }
}

/// Route a GET handler.
pub fn get<H, T>(handler: H) -> MethodRouter
where
    H: Handler<T>,
{
    MethodRouter::new().get(handler)
}

/// Route a POST handler.
pub fn post<H, T>(handler: H) -> MethodRouter
where
    H: Handler<T>,
{
    MethodRouter::new().post(handler)
}

/// Route a PUT handler.
pub fn put<H, T>(handler: H) -> MethodRouter
where
    H: Handler<T>,
{
    MethodRouter::new().put(handler)
}

/// Route a DELETE handler.
pub fn delete<H, T>(handler: H) -> MethodRouter
where
    H: Handler<T>,
{
    MethodRouter::new().delete(handler)
}

/// Route a PATCH handler.
pub fn patch<H, T>(handler: H) -> MethodRouter
where
    H: Handler<T>,
{
    MethodRouter::new().patch(handler)
}

/// Result of matching a request against the router.
pub(crate) enum RouteMatch {
    Found {
        handler: BoxedHandler,
        params: HashMap<String, String>,
        endpoint: Arc<str>,
    },
    MethodNotAllowed {
        allowed: Vec<Method>,
    },
    NotFound,
}

/// Radix-tree path router.
///
/// Paths use `{param}` placeholders for single-segment captures.
#[derive(Default)]
pub struct Router {
    inner: matchit::Router<MethodRouter>,
}

impl Router {
    /// Create an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a path and its method router.
    ///
    /// Panics when the path pattern conflicts with an existing route;
    /// route tables are static configuration, so this fails at startup.
    pub fn route(mut self, path: &str, method_router: MethodRouter) -> Self {
        let mut method_router = method_router;
        if method_router.name.is_none() {
            method_router.name = Some(Arc::from(path));
        }
        let pattern = convert_path_params(path);
        if let Err(err) = self.inner.insert(pattern, method_router) {
            panic!("invalid route `{path}`: {err}");
        }
        self
    }

    pub(crate) fn find(&self, path: &str, method: &Method) -> RouteMatch {
        match self.inner.at(path) {
            Ok(matched) => {
                let method_router = matched.value;
                match method_router.handlers.get(method) {
                    Some(handler) => {
                        let params = matched
                            .params
                            .iter()
                            .map(|(name, value)| (name.to_string(), value.to_string()))
                            .collect();
                        let endpoint = method_router
                            .name
                            .clone()
                            .unwrap_or_else(|| Arc::from(path));
                        RouteMatch::Found {
                            handler: handler.clone(),
                            params,
                            endpoint,
                        }
                    }
                    None => RouteMatch::MethodNotAllowed {
                        allowed: method_router.allowed(),
                    },
                }
            }
            Err(_) => RouteMatch::NotFound,
        }
    }
}

/// Convert `{param}` segments to the `:param` form matchit expects.
fn convert_path_params(path: &str) -> String {
    path.replace('{', ":").replace('}', "")
}

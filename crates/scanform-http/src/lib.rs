//! # scanform-http
//!
//! HTTP kernel for the Scanform service: the hyper-based server, a
//! radix-tree router with named endpoints, request extraction, and the
//! middleware chain the service crates hang their layers on.
//!
//! Request bodies are buffered up front under a configurable cap, so
//! handlers and middleware always see a complete body.

mod app;
mod error;
mod extract;
mod handler;
mod middleware;
mod request;
mod response;
mod router;
mod server;
#[cfg(any(test, feature = "test-utils"))]
mod test_client;

// Public API
pub use app::{App, DEFAULT_BODY_LIMIT};
pub use error::{Error, Result};
pub use extract::{Form, FormData, FromRequest, FromRequestParts, Path, Query, State};
pub use handler::Handler;
pub use middleware::{BoxedNext, LayerStack, MiddlewareLayer};
pub use request::Request;
pub use response::{Html, IntoResponse, Response};
pub use router::{delete, get, patch, post, put, MethodRouter, Router};
#[cfg(any(test, feature = "test-utils"))]
pub use test_client::{TestClient, TestRequest, TestResponse};

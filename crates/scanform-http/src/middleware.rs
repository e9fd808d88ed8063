//! Middleware traits and the layer stack.

use crate::request::Request;
use crate::response::Response;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// The continuation a layer invokes to run the rest of the chain.
pub type BoxedNext = Arc<
    dyn Fn(Request) -> Pin<Box<dyn Future<Output = Response> + Send + 'static>>
        + Send
        + Sync
        + 'static,
>;

/// A middleware layer wrapping request handling.
///
/// Layers may inspect or modify the request, short-circuit with their own
/// response, or call `next` to continue the chain and post-process the
/// response on the way out.
pub trait MiddlewareLayer: Send + Sync + 'static {
    /// Process the request, optionally delegating to `next`.
    fn call(
        &self,
        req: Request,
        next: BoxedNext,
    ) -> Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

    /// Box a clone of this layer.
    fn clone_box(&self) -> Box<dyn MiddlewareLayer>;
}

impl Clone for Box<dyn MiddlewareLayer> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Ordered collection of middleware layers.
///
/// Layers run in push order on the way in and in reverse order on the
/// way out.
#[derive(Default)]
pub struct LayerStack {
    layers: Vec<Box<dyn MiddlewareLayer>>,
}

impl LayerStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Append a layer to the chain.
    pub fn push(&mut self, layer: Box<dyn MiddlewareLayer>) {
        self.layers.push(layer);
    }

    /// Number of layers in the chain.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Run the request through every layer, ending at `final_handler`.
    pub fn execute(
        &self,
        req: Request,
        final_handler: BoxedNext,
    ) -> Pin<Box<dyn Future<Output = Response> + Send + 'static>> {
        let mut next = final_handler;
        for layer in self.layers.iter().rev() {
            let layer = layer.clone_box();
            let inner = next;
            next = Arc::new(move |req| layer.call(req, inner.clone()));
        }
        next(req)
    }
}

impl Clone for LayerStack {
    fn clone(&self) -> Self {
        Self {
            layers: self.layers.clone(),
        }
    }
}

//! The handler trait connecting async functions to the router.

use crate::extract::{FromRequest, FromRequestParts};
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A request handler.
///
/// Implemented for async functions taking up to five extractor arguments.
/// Every argument but the last extracts from the request head; the final
/// argument may consume the body. Extraction failures short-circuit into
/// the extractor's error response.
pub trait Handler<T>: Clone + Send + Sync + Sized + 'static {
    /// The future resolving to the handler's response.
    type Future: Future<Output = Response> + Send + 'static;

    /// Invoke the handler on a request.
    fn call(self, req: Request) -> Self::Future;
}

/// Type-erased handler stored in the router.
pub(crate) type BoxedHandler = Arc<
    dyn Fn(Request) -> Pin<Box<dyn Future<Output = Response> + Send + 'static>>
        + Send
        + Sync
        + 'static,
>;

pub(crate) fn boxed<H, T>(handler: H) -> BoxedHandler
where
    H: Handler<T>,
{
    Arc::new(move |req| Box::pin(handler.clone().call(req)))
}

impl<F, Fut, R> Handler<()> for F
where
    F: FnOnce() -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
{
    type Future = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

    fn call(self, _req: Request) -> Self::Future {
        Box::pin(async move { self().await.into_response() })
    }
}

impl<F, Fut, R, T1> Handler<(T1,)> for F
where
    F: FnOnce(T1) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
    T1: FromRequest + Send,
{
    type Future = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

    fn call(self, mut req: Request) -> Self::Future {
        Box::pin(async move {
            let t1 = match T1::from_request(&mut req).await {
                Ok(value) => value,
                Err(err) => return err.into_response(),
            };
            self(t1).await.into_response()
        })
    }
}

impl<F, Fut, R, T1, T2> Handler<(T1, T2)> for F
where
    F: FnOnce(T1, T2) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
    T1: FromRequestParts + Send,
    T2: FromRequest + Send,
{
    type Future = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

    fn call(self, mut req: Request) -> Self::Future {
        Box::pin(async move {
            let t1 = match T1::from_request_parts(&req) {
                Ok(value) => value,
                Err(err) => return err.into_response(),
            };
            let t2 = match T2::from_request(&mut req).await {
                Ok(value) => value,
                Err(err) => return err.into_response(),
            };
            self(t1, t2).await.into_response()
        })
    }
}

impl<F, Fut, R, T1, T2, T3> Handler<(T1, T2, T3)> for F
where
    F: FnOnce(T1, T2, T3) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
    T1: FromRequestParts + Send,
    T2: FromRequestParts + Send,
    T3: FromRequest + Send,
{
    type Future = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

    fn call(self, mut req: Request) -> Self::Future {
        Box::pin(async move {
            let t1 = match T1::from_request_parts(&req) {
                Ok(value) => value,
                Err(err) => return err.into_response(),
            };
            let t2 = match T2::from_request_parts(&req) {
                Ok(value) => value,
                Err(err) => return err.into_response(),
            };
            let t3 = match T3::from_request(&mut req).await {
                Ok(value) => value,
                Err(err) => return err.into_response(),
            };
            self(t1, t2, t3).await.into_response()
        })
    }
}

impl<F, Fut, R, T1, T2, T3, T4> Handler<(T1, T2, T3, T4)> for F
where
    F: FnOnce(T1, T2, T3, T4) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
    T1: FromRequestParts + Send,
    T2: FromRequestParts + Send,
    T3: FromRequestParts + Send,
    T4: FromRequest + Send,
{
    type Future = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

    fn call(self, mut req: Request) -> Self::Future {
        Box::pin(async move {
            let t1 = match T1::from_request_parts(&req) {
                Ok(value) => value,
                Err(err) => return err.into_response(),
            };
            let t2 = match T2::from_request_parts(&req) {
                Ok(value) => value,
                Err(err) => return err.into_response(),
            };
            let t3 = match T3::from_request_parts(&req) {
                Ok(value) => value,
                Err(err) => return err.into_response(),
            };
            let t4 = match T4::from_request(&mut req).await {
                Ok(value) => value,
                Err(err) => return err.into_response(),
            };
            self(t1, t2, t3, t4).await.into_response()
        })
    }
}

impl<F, Fut, R, T1, T2, T3, T4, T5> Handler<(T1, T2, T3, T4, T5)> for F
where
    F: FnOnce(T1, T2, T3, T4, T5) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
    T1: FromRequestParts + Send,
    T2: FromRequestParts + Send,
    T3: FromRequestParts + Send,
    T4: FromRequestParts + Send,
    T5: FromRequest + Send,
{
    type Future = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

    fn call(self, mut req: Request) -> Self::Future {
        Box::pin(async move {
            let t1 = match T1::from_request_parts(&req) {
                Ok(value) => value,
                Err(err) => return err.into_response(),
            };
            let t2 = match T2::from_request_parts(&req) {
                Ok(value) => value,
                Err(err) => return err.into_response(),
            };
            let t3 = match T3::from_request_parts(&req) {
                Ok(value) => value,
                Err(err) => return err.into_response(),
            };
            let t4 = match T4::from_request_parts(&req) {
                Ok(value) => value,
                Err(err) => return err.into_response(),
            };
            let t5 = match T5::from_request(&mut req).await {
                Ok(value) => value,
                Err(err) => return err.into_response(),
            };
            self(t1, t2, t3, t4, t5).await.into_response()
        })
    }
}

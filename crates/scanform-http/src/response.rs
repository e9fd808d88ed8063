//! Response types and conversions for handler return values.

use bytes::Bytes;
use http::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use http_body_util::Full;

/// The concrete response type produced by handlers.
pub type Response = http::Response<Full<Bytes>>;

/// Conversion of handler return values into responses.
pub trait IntoResponse {
    /// Convert the value into a response.
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response {
        self
    }
}

impl IntoResponse for () {
    fn into_response(self) -> Response {
        Response::new(Full::new(Bytes::new()))
    }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response {
        let mut res = Response::new(Full::new(Bytes::from_static(self.as_bytes())));
        res.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        res
    }
}

impl IntoResponse for String {
    fn into_response(self) -> Response {
        let mut res = Response::new(Full::new(Bytes::from(self.into_bytes())));
        res.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        res
    }
}

impl IntoResponse for StatusCode {
    fn into_response(self) -> Response {
        let mut res = Response::new(Full::new(Bytes::new()));
        *res.status_mut() = self;
        res
    }
}

impl<R> IntoResponse for (StatusCode, R)
where
    R: IntoResponse,
{
    fn into_response(self) -> Response {
        let (status, body) = self;
        let mut res = body.into_response();
        *res.status_mut() = status;
        res
    }
}

impl<R> IntoResponse for (StatusCode, HeaderMap, R)
where
    R: IntoResponse,
{
    fn into_response(self) -> Response {
        let (status, headers, body) = self;
        let mut res = body.into_response();
        *res.status_mut() = status;
        res.headers_mut().extend(headers);
        res
    }
}

impl<T, E> IntoResponse for Result<T, E>
where
    T: IntoResponse,
    E: IntoResponse,
{
    fn into_response(self) -> Response {
        match self {
            Ok(value) => value.into_response(),
            Err(err) => err.into_response(),
        }
    }
}

/// An HTML response body.
#[derive(Debug, Clone)]
pub struct Html<T>(pub T);

impl<T> IntoResponse for Html<T>
where
    T: Into<String>,
{
    fn into_response(self) -> Response {
        let mut res = Response::new(Full::new(Bytes::from(self.0.into().into_bytes())));
        res.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );
        res
    }
}

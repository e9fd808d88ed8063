//! Extractors turning requests into typed handler arguments.

use crate::error::{Error, Result};
use crate::request::Request;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::ops::Deref;
use std::str::FromStr;

/// Extract a value from the request head without touching the body.
pub trait FromRequestParts: Sized {
    /// Perform the extraction.
    fn from_request_parts(req: &Request) -> Result<Self>;
}

/// Extract a value from the full request, possibly consuming the body.
///
/// Handlers may take several [`FromRequestParts`] arguments but at most
/// one `FromRequest` argument, in last position.
pub trait FromRequest: Sized {
    /// Perform the extraction.
    fn from_request(req: &mut Request) -> impl Future<Output = Result<Self>> + Send;
}

impl<T> FromRequest for T
where
    T: FromRequestParts + Send,
{
    fn from_request(req: &mut Request) -> impl Future<Output = Result<Self>> + Send {
        let result = T::from_request_parts(req);
        async move { result }
    }
}

/// Deserialized query string parameters.
#[derive(Debug, Clone)]
pub struct Query<T>(pub T);

impl<T> FromRequestParts for Query<T>
where
    T: DeserializeOwned,
{
    fn from_request_parts(req: &Request) -> Result<Self> {
        let query = req.query_string().unwrap_or("");
        serde_urlencoded::from_str(query)
            .map(Query)
            .map_err(Error::from)
    }
}

impl<T> Deref for Query<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

/// A urlencoded request body deserialized into `T`.
#[derive(Debug, Clone)]
pub struct Form<T>(pub T);

impl<T> FromRequest for Form<T>
where
    T: DeserializeOwned + Send,
{
    fn from_request(req: &mut Request) -> impl Future<Output = Result<Self>> + Send {
        let result = serde_urlencoded::from_bytes(req.body())
            .map(Form)
            .map_err(Error::from);
        async move { result }
    }
}

impl<T> Deref for Form<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

/// Raw form fields from a urlencoded request body.
///
/// Keeps every submitted pair in order. [`get`](FormData::get) returns
/// the first value for a name, matching how browsers submit plain forms.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    fields: Vec<(String, String)>,
}

impl FormData {
    /// Parse a urlencoded byte slice into form fields.
    pub fn parse(body: &[u8]) -> Result<Self> {
        let fields: Vec<(String, String)> =
            serde_urlencoded::from_bytes(body).map_err(Error::from)?;
        Ok(Self { fields })
    }

    /// The first value submitted under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    /// Whether any value was submitted under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(field, _)| field == name)
    }

    /// All submitted pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Number of submitted pairs.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the form was empty.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromRequest for FormData {
    fn from_request(req: &mut Request) -> impl Future<Output = Result<Self>> + Send {
        let result = Self::parse(req.body());
        async move { result }
    }
}

/// A single path parameter parsed with [`FromStr`].
///
/// Routes using this extractor must capture exactly one parameter.
#[derive(Debug, Clone)]
pub struct Path<T>(pub T);

impl<T> FromRequestParts for Path<T>
where
    T: FromStr,
{
    fn from_request_parts(req: &Request) -> Result<Self> {
        let mut values = req.path_params().values();
        let (Some(raw), None) = (values.next(), values.next()) else {
            return Err(Error::internal(
                "Path extraction requires exactly one route parameter",
            ));
        };
        raw.parse()
            .map(Path)
            .map_err(|_| Error::bad_request("Invalid path parameter"))
    }
}

impl<T> Deref for Path<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

/// Shared application state registered with `App::state`.
#[derive(Debug, Clone)]
pub struct State<T>(pub T);

impl<T> FromRequestParts for State<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn from_request_parts(req: &Request) -> Result<Self> {
        req.state().get::<T>().cloned().map(State).ok_or_else(|| {
            Error::internal(format!(
                "State of type `{}` was not registered on the app",
                std::any::type_name::<T>()
            ))
        })
    }
}

impl<T> Deref for State<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> FromRequestParts for Option<T>
where
    T: FromRequestParts,
{
    fn from_request_parts(req: &Request) -> Result<Self> {
        Ok(T::from_request_parts(req).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{Extensions, Method, StatusCode};
    use serde::Deserialize;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn request(method: Method, uri: &str, body: &'static [u8]) -> Request {
        let req = http::Request::builder()
            .method(method)
            .uri(uri)
            .body(())
            .unwrap();
        let (parts, _) = req.into_parts();
        Request::new(
            parts,
            Bytes::from_static(body),
            Arc::new(Extensions::new()),
            HashMap::new(),
        )
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Filter {
        inc: Option<String>,
        p: Option<String>,
    }

    #[test]
    fn query_deserializes_into_struct() {
        let req = request(Method::GET, "/scan?inc=abc&p=none", b"");
        let Query(filter) = Query::<Filter>::from_request_parts(&req).unwrap();
        assert_eq!(filter.inc.as_deref(), Some("abc"));
        assert_eq!(filter.p.as_deref(), Some("none"));
    }

    #[test]
    fn query_tolerates_missing_query_string() {
        let req = request(Method::GET, "/scan", b"");
        let Query(filter) = Query::<Filter>::from_request_parts(&req).unwrap();
        assert_eq!(filter, Filter { inc: None, p: None });
    }

    #[tokio::test]
    async fn form_deserializes_the_body() {
        let mut req = request(Method::POST, "/scan", b"inc=abc&p=none");
        let Form(filter) = Form::<Filter>::from_request(&mut req).await.unwrap();
        assert_eq!(filter.inc.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn form_data_keeps_first_value_per_name() {
        let mut req = request(Method::POST, "/scan", b"p=none&p=reject&sp=none");
        let form = FormData::from_request(&mut req).await.unwrap();
        assert_eq!(form.get("p"), Some("none"));
        assert_eq!(form.get("sp"), Some("none"));
        assert_eq!(form.get("missing"), None);
        assert_eq!(form.len(), 3);
    }

    #[test]
    fn form_data_decodes_percent_escapes() {
        let form = FormData::parse(b"rua=mailto%3Aops%40example.com").unwrap();
        assert_eq!(form.get("rua"), Some("mailto:ops@example.com"));
    }

    #[test]
    fn path_parses_the_single_parameter() {
        let req = http::Request::builder()
            .method(Method::GET)
            .uri("/internal/health")
            .body(())
            .unwrap();
        let (parts, _) = req.into_parts();
        let mut params = HashMap::new();
        params.insert("check".to_string(), "health".to_string());
        let req = Request::new(parts, Bytes::new(), Arc::new(Extensions::new()), params);

        let Path(check) = Path::<String>::from_request_parts(&req).unwrap();
        assert_eq!(check, "health");
    }

    #[test]
    fn path_rejects_unparseable_values() {
        let req = http::Request::builder()
            .method(Method::GET)
            .uri("/internal/health")
            .body(())
            .unwrap();
        let (parts, _) = req.into_parts();
        let mut params = HashMap::new();
        params.insert("check".to_string(), "health".to_string());
        let req = Request::new(parts, Bytes::new(), Arc::new(Extensions::new()), params);

        let err = Path::<u32>::from_request_parts(&req).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn state_errors_when_not_registered() {
        let req = request(Method::GET, "/", b"");
        let err = State::<Arc<String>>::from_request_parts(&req).unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn state_clones_the_registered_value() {
        let mut extensions = Extensions::new();
        extensions.insert(Arc::new("scanform".to_string()));
        let req = http::Request::builder()
            .method(Method::GET)
            .uri("/")
            .body(())
            .unwrap();
        let (parts, _) = req.into_parts();
        let req = Request::new(parts, Bytes::new(), Arc::new(extensions), HashMap::new());

        let State(value) = State::<Arc<String>>::from_request_parts(&req).unwrap();
        assert_eq!(*value, "scanform");
    }

    #[test]
    fn option_swallows_extraction_failures() {
        let req = request(Method::GET, "/", b"");
        let state = Option::<State<Arc<String>>>::from_request_parts(&req).unwrap();
        assert!(state.is_none());
    }
}

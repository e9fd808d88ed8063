//! Middleware attaching a session to every request.

use super::store::SessionStore;
use super::Session;
use cookie::{Cookie, CookieJar, Key, SameSite};
use http::header::{HeaderValue, COOKIE, SET_COOKIE};
use scanform_http::{BoxedNext, MiddlewareLayer, Request, Response};
use serde_json::Map;
use sha2::{Digest, Sha256};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::debug;

/// Loads the session named by the request cookie and persists it after
/// the response is built.
///
/// The cookie carries only the signed session id; data lives in the
/// [`SessionStore`]. A `Set-Cookie` header is emitted only when the
/// session was written during the request. Requests with a missing,
/// tampered, or expired cookie get a fresh session.
#[derive(Clone)]
pub struct SessionLayer {
    inner: Arc<SessionLayerInner>,
}

struct SessionLayerInner {
    store: SessionStore,
    key: Key,
    cookie_name: String,
    secure: bool,
}

impl SessionLayer {
    /// Build a layer with its own store.
    ///
    /// The signing key is derived from `secret`. With `secure` set the
    /// cookie is named `__Host-Session` and flagged `Secure`, following
    /// the host-prefix cookie rules; otherwise it is named `Session`.
    pub fn new(secret: impl AsRef<[u8]>, secure: bool) -> Self {
        Self::with_store(SessionStore::new(), secret, secure)
    }

    /// Build a layer around an existing store.
    pub fn with_store(store: SessionStore, secret: impl AsRef<[u8]>, secure: bool) -> Self {
        let digest = Sha256::digest(secret.as_ref());
        let key = Key::derive_from(digest.as_slice());
        let cookie_name = if secure { "__Host-Session" } else { "Session" };
        Self {
            inner: Arc::new(SessionLayerInner {
                store,
                key,
                cookie_name: cookie_name.to_string(),
                secure,
            }),
        }
    }

    /// The cookie name this layer reads and writes.
    pub fn cookie_name(&self) -> &str {
        &self.inner.cookie_name
    }

    /// The store backing this layer.
    pub fn store(&self) -> &SessionStore {
        &self.inner.store
    }

    /// Extract and verify the session id from the request cookie.
    fn verified_session_id(&self, req: &Request) -> Option<String> {
        let header = req.headers().get(COOKIE)?.to_str().ok()?;
        let raw = Cookie::split_parse(header)
            .filter_map(|cookie| cookie.ok())
            .find(|cookie| cookie.name() == self.inner.cookie_name)?
            .into_owned();

        let mut jar = CookieJar::new();
        jar.add_original(raw);
        jar.signed(&self.inner.key)
            .get(&self.inner.cookie_name)
            .map(|cookie| cookie.value().to_string())
    }

    /// Render the signed session cookie for `id`.
    fn set_cookie_header(&self, id: &str) -> Option<HeaderValue> {
        let ttl = self.inner.store.ttl();
        let cookie = Cookie::build((self.inner.cookie_name.clone(), id.to_string()))
            .path("/")
            .http_only(true)
            .secure(self.inner.secure)
            .same_site(SameSite::Lax)
            .max_age(cookie::time::Duration::seconds(ttl.as_secs() as i64))
            .build();

        let mut jar = CookieJar::new();
        jar.signed_mut(&self.inner.key).add(cookie);
        let signed = jar.get(&self.inner.cookie_name)?;
        HeaderValue::from_str(&signed.to_string()).ok()
    }
}

impl MiddlewareLayer for SessionLayer {
    fn call(
        &self,
        mut req: Request,
        next: BoxedNext,
    ) -> Pin<Box<dyn Future<Output = Response> + Send + 'static>> {
        let layer = self.clone();

        Box::pin(async move {
            let session = layer
                .verified_session_id(&req)
                .and_then(|id| layer.inner.store.load(&id))
                .unwrap_or_else(|| Session::new(SessionStore::generate_id(), Map::new()));
            req.extensions_mut().insert(session.clone());

            let mut response = next(req).await;

            if session.is_dirty() {
                layer.inner.store.save(&session);
                if let Some(value) = layer.set_cookie_header(session.id()) {
                    response.headers_mut().append(SET_COOKIE, value);
                } else {
                    debug!(id = %session.id(), "Session cookie could not be rendered");
                }
            }

            response
        })
    }

    fn clone_box(&self) -> Box<dyn MiddlewareLayer> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use scanform_http::{get, App, TestClient, TestRequest};
    use std::time::Duration;

    async fn visit(session: Session) -> String {
        let count: u64 = session.get("visits").unwrap_or(0);
        session.insert("visits", count + 1).unwrap();
        (count + 1).to_string()
    }

    async fn peek(session: Session) -> String {
        session.get::<u64>("visits").unwrap_or(0).to_string()
    }

    fn app(layer: SessionLayer) -> App {
        App::new()
            .layer(layer)
            .route("/visit", get(visit))
            .route("/peek", get(peek))
    }

    #[test]
    fn cookie_name_follows_the_secure_flag() {
        assert_eq!(SessionLayer::new("123", false).cookie_name(), "Session");
        assert_eq!(
            SessionLayer::new("123", true).cookie_name(),
            "__Host-Session"
        );
    }

    #[tokio::test]
    async fn written_sessions_set_a_cookie_and_persist() {
        let client = TestClient::new(app(SessionLayer::new("123", false)));

        let res = client.get("/visit").await.assert_status(StatusCode::OK);
        assert_eq!(res.text(), "1");
        let cookie = res.header("set-cookie").expect("cookie set");
        assert!(cookie.starts_with("Session="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));

        let res = client.get("/visit").await;
        assert_eq!(res.text(), "2");
    }

    #[tokio::test]
    async fn untouched_sessions_set_no_cookie() {
        let client = TestClient::new(app(SessionLayer::new("123", false)));

        let res = client.get("/peek").await.assert_status(StatusCode::OK);
        assert_eq!(res.text(), "0");
        assert!(res.header("set-cookie").is_none());
    }

    #[tokio::test]
    async fn tampered_cookies_start_a_fresh_session() {
        let client = TestClient::new(app(SessionLayer::new("123", false)));

        let res = client.get("/visit").await;
        assert_eq!(res.text(), "1");

        // bypass the remembered jar with a forged cookie value
        let res = client
            .request(TestRequest::get("/visit").header("Cookie", "Session=forged"))
            .await;
        assert_eq!(res.text(), "1");
    }

    #[tokio::test]
    async fn expired_sessions_start_fresh() {
        let store = SessionStore::with_ttl(Duration::ZERO);
        let client = TestClient::new(app(SessionLayer::with_store(store, "123", false)));

        let res = client.get("/visit").await;
        assert_eq!(res.text(), "1");
        let res = client.get("/visit").await;
        assert_eq!(res.text(), "1");
    }

    #[tokio::test]
    async fn keys_from_different_secrets_reject_each_other() {
        let store = SessionStore::new();
        let client = TestClient::new(app(SessionLayer::with_store(store.clone(), "123", false)));
        let res = client.get("/visit").await;
        assert_eq!(res.text(), "1");
        let set_cookie = res.header("set-cookie").expect("cookie set");
        let pair = set_cookie.split(';').next().expect("cookie pair");

        // same store, different signing secret: the old cookie fails
        // verification and a fresh session starts
        let other = TestClient::new(app(SessionLayer::with_store(store, "456", false)));
        let res = other
            .request(TestRequest::get("/visit").header("Cookie", pair))
            .await;
        assert_eq!(res.text(), "1");
    }
}

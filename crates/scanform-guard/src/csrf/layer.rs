use super::state::CsrfState;
use super::CSRF_FORM_FIELD;
use crate::session::Session;
use http::Method;
use scanform_http::{BoxedNext, Error, FormData, IntoResponse, MiddlewareLayer, Request, Response};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::warn;

/// Middleware enforcing session-backed CSRF tokens on POST requests.
///
/// The layer checks the endpoint name the router attached to the
/// request against the token map in the session. Endpoints without an
/// issued token are not enforced; handlers arm the guard by calling
/// [`CsrfToken::issue`](super::CsrfToken::issue) when they render a
/// form. Install this layer after the session layer so the session is
/// already attached.
#[derive(Clone, Debug)]
pub struct CsrfGuardLayer {
    form_field: Arc<str>,
}

impl CsrfGuardLayer {
    /// Create a layer reading the default [`CSRF_FORM_FIELD`] field.
    pub fn new() -> Self {
        Self {
            form_field: Arc::from(CSRF_FORM_FIELD),
        }
    }

    /// Create a layer reading a custom form field.
    pub fn with_form_field(form_field: &str) -> Self {
        Self {
            form_field: Arc::from(form_field),
        }
    }

    /// The form field this layer reads the token from.
    pub fn form_field(&self) -> &str {
        &self.form_field
    }
}

impl Default for CsrfGuardLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl MiddlewareLayer for CsrfGuardLayer {
    fn call(
        &self,
        req: Request,
        next: BoxedNext,
    ) -> Pin<Box<dyn Future<Output = Response> + Send + 'static>> {
        let layer = self.clone();

        Box::pin(async move {
            // 1. Only POST submissions are checked
            if req.method() != Method::POST {
                return next(req).await;
            }

            // 2. Without a session or endpoint name there is nothing
            //    to check against
            let Some(session) = req.extensions().get::<Session>().cloned() else {
                return next(req).await;
            };
            let Some(endpoint) = req.endpoint().map(str::to_string) else {
                return next(req).await;
            };

            // 3. Consume the stored token for this endpoint
            let state = CsrfState::begin(&session, &endpoint);

            // 4. Compare a pending token against the form field
            let state = match state {
                CsrfState::TokenPending { .. } => {
                    let form = FormData::parse(req.body()).ok();
                    let submitted = form
                        .as_ref()
                        .and_then(|form| form.get(layer.form_field.as_ref()));
                    state.resolve(submitted)
                }
                other => other,
            };

            // 5. Reject or proceed
            if state.allows() {
                next(req).await
            } else {
                warn!(%endpoint, "Rejected POST with a missing or stale token");
                Error::forbidden().into_response()
            }
        })
    }

    fn clone_box(&self) -> Box<dyn MiddlewareLayer> {
        Box::new(self.clone())
    }
}

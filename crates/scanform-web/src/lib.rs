//! Scan configuration front-end.
//!
//! A small web service that records "scan" requests submitted through
//! an HTML form. Submissions are protected by per-endpoint CSRF tokens
//! and sanitised before they are stored in the server-side session.
//! The same application runs behind the bundled hyper server or, with
//! the `lambda` feature, behind the AWS Lambda HTTP runtime.

pub mod config;
pub mod records;
pub mod routes;
pub mod view;

use config::AppConfig;
use routes::{Site, SCAN_ENDPOINT};
use scanform_guard::{CsrfGuardLayer, SessionLayer, SessionStore};
use scanform_http::{get, App};
use view::{TemplateError, Templates};

/// Build the application for a loaded configuration.
///
/// The session layer sits outermost so every later layer and handler
/// sees the restored session; the CSRF guard follows it.
pub fn build_app(config: &AppConfig) -> Result<App, TemplateError> {
    let templates = Templates::load(!config.is_production())?;
    let site = Site {
        url_prefix: config.url_prefix(),
        domain: config.domain(),
    };

    let app = App::new()
        .state(templates)
        .state(site)
        .layer(SessionLayer::with_store(
            SessionStore::new(),
            &config.secret_key,
            config.is_https(),
        ))
        .layer(CsrfGuardLayer::new())
        .route("/", get(routes::index))
        .route(
            "/scan",
            get(routes::scan_page)
                .post(routes::scan_submit)
                .name(SCAN_ENDPOINT),
        )
        .route("/internal/{check}", get(routes::health_check))
        .body_limit(config.max_content_length);

    Ok(app)
}

//! Route handlers.

use crate::records::{self, RECORDS_SESSION_KEY};
use crate::view::{Context, Templates};
use scanform_guard::{CsrfToken, Session};
use scanform_http::{FormData, Path, Response, State};
use serde_json::Value;

/// Endpoint identifier the scan form's tokens are keyed under.
pub const SCAN_ENDPOINT: &str = "scan";

/// External addresses rendered into every page.
#[derive(Debug, Clone)]
pub struct Site {
    /// Base URL pages link through.
    pub url_prefix: String,
    /// Host name shown in the footer.
    pub domain: String,
}

fn page_context(site: &Site, title: &str) -> Context {
    let mut context = Context::new();
    context.insert("title", title);
    context.insert("url_prefix", &site.url_prefix);
    context.insert("domain", &site.domain);
    context
}

/// Health probe for the load balancer.
pub async fn health_check(Path(check): Path<String>) -> String {
    if check == "health" {
        format!("IMOK {check}")
    } else {
        "FAIL dependencies".to_string()
    }
}

/// Home page.
pub async fn index(State(templates): State<Templates>, State(site): State<Site>) -> Response {
    templates.render("index.html", &page_context(&site, "Home"))
}

/// Scan form page.
pub async fn scan_page(
    State(templates): State<Templates>,
    State(site): State<Site>,
    session: Session,
) -> Response {
    ensure_records(&session);
    render_scan(&templates, &site, &session)
}

/// Scan form submission.
pub async fn scan_submit(
    State(templates): State<Templates>,
    State(site): State<Site>,
    session: Session,
    form: FormData,
) -> Response {
    ensure_records(&session);

    let record = records::build_record(&form);
    session.update(|data| {
        if let Some(Value::Array(list)) = data.get_mut(RECORDS_SESSION_KEY) {
            list.push(Value::Object(record));
        }
    });

    render_scan(&templates, &site, &session)
}

/// Make sure the session carries a record list.
fn ensure_records(session: &Session) {
    let has_list = session.read(|data| {
        matches!(data.get(RECORDS_SESSION_KEY), Some(Value::Array(_)))
    });
    if !has_list {
        session.update(|data| {
            data.insert(RECORDS_SESSION_KEY.to_string(), Value::Array(Vec::new()));
        });
    }
}

/// Render the scan page with a freshly issued token and the record
/// list.
fn render_scan(templates: &Templates, site: &Site, session: &Session) -> Response {
    let token = CsrfToken::issue(session, SCAN_ENDPOINT);
    let records = session
        .get_value(RECORDS_SESSION_KEY)
        .unwrap_or_else(|| Value::Array(Vec::new()));

    let mut context = page_context(site, "Scan");
    context.insert("csrf_form", token.as_str());
    context.insert("records", &records);
    templates.render("scan.html", &context)
}

//! End-to-end request flows through the full application.

use http::StatusCode;
use scanform_http::{TestClient, TestRequest, TestResponse};
use scanform_web::build_app;
use scanform_web::config::AppConfig;

fn client() -> TestClient {
    client_with(AppConfig::default())
}

fn client_with(config: AppConfig) -> TestClient {
    TestClient::new(build_app(&config).expect("application builds"))
}

fn extract_token(html: &str) -> String {
    let marker = "name=\"csrf_form\" value=\"";
    let start = html.find(marker).expect("token field present") + marker.len();
    let end = html[start..].find('"').expect("token delimited") + start;
    html[start..end].to_string()
}

async fn submit(client: &TestClient, fields: &[(&str, &str)]) -> TestResponse {
    client
        .request(TestRequest::post("/scan").form(&fields))
        .await
}

#[tokio::test]
async fn health_answers_imok_only_for_the_health_check() {
    let client = client();

    let res = client
        .get("/internal/health")
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(res.text(), "IMOK health");

    let res = client
        .get("/internal/dependencies")
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(res.text(), "FAIL dependencies");
}

#[tokio::test]
async fn the_home_page_renders_without_touching_the_session() {
    let client = client();

    let res = client.get("/").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.header("set-cookie").is_none());
    res.assert_body_contains("Home")
        .assert_body_contains("http://localhost:5001/scan");
}

#[tokio::test]
async fn the_scan_page_issues_a_token_and_a_session_cookie() {
    let client = client();

    let res = client.get("/scan").await.assert_status(StatusCode::OK);
    let cookie = res.header("set-cookie").expect("session cookie");
    assert!(cookie.starts_with("Session="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age=43200"));
    assert!(!cookie.contains("; Secure"));

    let token = extract_token(&res.text());
    assert_eq!(token.len(), 32);
    assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
}

#[tokio::test]
async fn https_configurations_use_host_prefixed_secure_cookies() {
    let client = client_with(AppConfig {
        is_https: "true".to_string(),
        ..AppConfig::default()
    });

    let res = client.get("/scan").await.assert_status(StatusCode::OK);
    let cookie = res.header("set-cookie").expect("session cookie");
    assert!(cookie.starts_with("__Host-Session="));
    assert!(cookie.contains("; Secure"));
}

#[tokio::test]
async fn a_scan_submission_round_trips() {
    let client = client();

    let token = extract_token(&client.get("/scan").await.text());
    let res = submit(
        &client,
        &[("csrf_form", token.as_str()), ("p", "reject"), ("sp", "quarantine")],
    )
    .await;

    res.assert_status(StatusCode::OK)
        .assert_body_contains("\"p\":\"reject\"")
        .assert_body_contains("\"sp\":\"quarantine\"")
        .assert_body_contains("\"rf\":\"json\"");
}

#[tokio::test]
async fn wrong_tokens_are_forbidden() {
    let client = client();

    client.get("/scan").await.assert_status(StatusCode::OK);
    let res = submit(&client, &[("csrf_form", "wrong"), ("p", "reject")]).await;
    res.assert_status(StatusCode::FORBIDDEN)
        .assert_body_contains("Forbidden");
}

#[tokio::test]
async fn missing_token_fields_are_forbidden() {
    let client = client();

    client.get("/scan").await;
    let res = submit(&client, &[("p", "reject")]).await;
    res.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn replayed_tokens_are_forbidden() {
    let client = client();

    let token = extract_token(&client.get("/scan").await.text());
    submit(&client, &[("csrf_form", token.as_str())])
        .await
        .assert_status(StatusCode::OK);

    // the successful render issued a new token, so the old one is stale
    let res = submit(&client, &[("csrf_form", token.as_str())]).await;
    res.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn tokens_do_not_survive_a_rerender() {
    let client = client();

    let first = extract_token(&client.get("/scan").await.text());
    let second = extract_token(&client.get("/scan").await.text());
    assert_ne!(first, second);

    submit(&client, &[("csrf_form", first.as_str())])
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn posts_without_a_prior_page_load_pass() {
    let client = client();

    // no token was ever issued for this session, so the guard stays
    // disarmed
    let res = submit(&client, &[("p", "reject")]).await;
    res.assert_status(StatusCode::OK)
        .assert_body_contains("\"p\":\"reject\"");
}

#[tokio::test]
async fn submitted_values_are_sanitised() {
    let client = client();

    let res = submit(
        &client,
        &[("p", "<script>alert('x')</script>"), ("rqs", "<b>no</b>")],
    )
    .await;

    res.assert_status(StatusCode::OK)
        .assert_body_contains("scriptalert'x'/script")
        .assert_body_contains("\"rqs\":\"bno/b\"");
    let body = client.get("/scan").await.text();
    assert!(!body.contains("<script>"));
}

#[tokio::test]
async fn a_nonempty_inc_field_collapses_the_record() {
    let client = client();

    let res = submit(&client, &[("p", "reject"), ("inc", "always")]).await;
    let body = res.text();
    assert!(body.contains("{\"inc\":\"always\"}"), "body: {body}");
    assert!(!body.contains("reject"), "body: {body}");
}

#[tokio::test]
async fn records_accumulate_in_the_session() {
    let client = client();

    // a fresh session has no token on file, so the first post passes;
    // its rendered page arms the guard for the second one
    let res = submit(&client, &[("p", "first")])
        .await
        .assert_status(StatusCode::OK);
    let token = extract_token(&res.text());
    submit(&client, &[("csrf_form", token.as_str()), ("p", "second")])
        .await
        .assert_status(StatusCode::OK);

    let body = client.get("/scan").await.text();
    assert!(body.contains("\"p\":\"first\""));
    assert!(body.contains("\"p\":\"second\""));
}

#[tokio::test]
async fn sessions_do_not_leak_across_cookie_jars() {
    let client = client();
    submit(&client, &[("p", "private")])
        .await
        .assert_status(StatusCode::OK);

    // dropping the cookie starts a fresh session against the same store
    client.clear_cookies();
    let body = client.get("/scan").await.text();
    assert!(!body.contains("private"));
    assert!(body.contains("No scans recorded yet."));
}

#[tokio::test]
async fn unknown_paths_are_not_found() {
    let client = client();
    client
        .get("/missing")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn wrong_methods_carry_an_allow_header() {
    let client = client();

    let res = client
        .request(TestRequest::delete("/scan"))
        .await
        .assert_status(StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(res.header("allow"), Some("GET, POST"));

    let res = client.post("/").await;
    res.assert_status(StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn oversized_bodies_are_rejected() {
    let client = client_with(AppConfig {
        max_content_length: 64,
        ..AppConfig::default()
    });

    let res = client
        .request(TestRequest::post("/scan").body(vec![b'a'; 100]))
        .await;
    res.assert_status(StatusCode::PAYLOAD_TOO_LARGE);

    client.get("/scan").await.assert_status(StatusCode::OK);
}

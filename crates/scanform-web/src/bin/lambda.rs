//! AWS Lambda entry point.
//!
//! Runs the same application as the server binary behind the Lambda
//! HTTP runtime, translating between Lambda and kernel bodies and
//! logging one line per invocation.

use bytes::Bytes;
use http_body_util::BodyExt;
use lambda_http::{run, service_fn, Body, Error};
use scanform_http::App;
use scanform_web::config::{self, AppConfig};
use std::sync::Arc;
use tracing::info;

async fn invoke(app: Arc<App>, event: http::Request<Body>) -> Result<http::Response<Body>, Error> {
    let (parts, body) = event.into_parts();
    let body = match body {
        Body::Empty => Bytes::new(),
        Body::Text(text) => Bytes::from(text),
        Body::Binary(data) => Bytes::from(data),
    };

    let response = app.handle(http::Request::from_parts(parts, body)).await;
    let status = response.status();
    let (parts, body) = response.into_parts();
    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(never) => match never {},
    };
    info!(
        status = status.as_u16(),
        body_length = bytes.len(),
        "Invocation completed"
    );

    let body = match String::from_utf8(bytes.to_vec()) {
        Ok(text) => Body::Text(text),
        Err(raw) => Body::Binary(raw.into_bytes()),
    };
    Ok(http::Response::from_parts(parts, body))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    config::load_dotenv();

    let config = AppConfig::load()?;
    let app = Arc::new(scanform_web::build_app(&config)?);

    run(service_fn(move |event| invoke(app.clone(), event))).await
}

//! Hyper-based server loop.

use crate::app::App;
use crate::error::Error;
use crate::response::{IntoResponse, Response};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

pub(crate) struct Server {
    app: Arc<App>,
}

impl Server {
    pub(crate) fn new(app: App) -> Self {
        Self { app: Arc::new(app) }
    }

    pub(crate) async fn run(self, addr: &str) -> std::io::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        info!("Listening on http://{}", addr);

        loop {
            let (stream, remote) = listener.accept().await?;
            let app = self.app.clone();

            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |req| {
                    let app = app.clone();
                    async move { Ok::<_, Infallible>(serve_request(app, req, remote).await) }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    warn!(error = %err, "Connection error");
                }
            });
        }
    }
}

/// Buffer the body, dispatch through the app, and log the outcome.
///
/// The body is read under the configured cap so oversized uploads are cut
/// off while streaming instead of being buffered in full.
async fn serve_request(
    app: Arc<App>,
    req: http::Request<Incoming>,
    remote: SocketAddr,
) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let client_ip = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| remote.ip().to_string());

    let limit = app.body_limit_bytes();
    let (parts, body) = req.into_parts();

    let response = match Limited::new(body, limit).collect().await {
        Ok(collected) => {
            let body = collected.to_bytes();
            app.handle(http::Request::from_parts(parts, body)).await
        }
        Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
            Error::payload_too_large(limit).into_response()
        }
        Err(err) => {
            warn!(error = %err, "Failed to read request body");
            Error::bad_request("Failed to read request body").into_response()
        }
    };

    let status = response.status().as_u16();
    let duration_ms = start.elapsed().as_millis();
    if response.status().is_server_error() {
        error!(%method, %path, status, duration_ms, %client_ip, "Request failed");
    } else {
        info!(%method, %path, status, duration_ms, %client_ip, "Request completed");
    }

    response
}

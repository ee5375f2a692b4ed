//! Per-port HTTP server.
//!
//! # Responsibilities
//! - Build one Axum router per port group with a catch-all proxy handler
//! - Dump, rewrite and forward matched requests to their backend
//! - Capture the response for the traffic log without altering it
//! - Drain in-flight requests on shutdown, bounded by a grace period
//!
//! # Design Decisions
//! - Routing is done by our own dispatch table, not Axum's router: patterns
//!   combine host and path prefix, which Axum routes cannot express
//! - The hyper legacy client is the backend dispatcher; it is configured
//!   once per server and targets each route's static backend URI

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::http::capture::{CaptureBody, CaptureRecord};
use crate::http::middleware::{backend_uri, dump_request, forward_headers, rewrite_path};
use crate::routing::{DispatchTable, PortGroup};

/// Application state injected into the proxy handler.
#[derive(Clone)]
pub struct AppState {
    routes: Arc<DispatchTable>,
    client: Client<HttpsConnector<HttpConnector>, Body>,
}

/// Build the backend dispatch client. Backends may sit behind either
/// scheme, so the connector speaks TLS with the platform trust store and
/// falls back to plain TCP for http targets.
fn build_client() -> Client<HttpsConnector<HttpConnector>, Body> {
    let connector = HttpsConnectorBuilder::new()
        .with_native_roots()
        .expect("failed to load native root certificates")
        .https_or_http()
        .enable_http1()
        .build();
    Client::builder(TokioExecutor::new()).build(connector)
}

/// One listening server bound to one port, owning that port's dispatch table.
pub struct PortServer {
    port: u16,
    state: AppState,
}

impl PortServer {
    /// Compile the port group into a server ready to run.
    pub fn new(port: u16, group: &PortGroup) -> Self {
        let routes = Arc::new(DispatchTable::new(group));
        Self {
            port,
            state: AppState {
                routes,
                client: build_client(),
            },
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(self.state.clone())
    }

    /// Serve until the shutdown signal fires, then drain in-flight requests
    /// for at most `grace`. Connections still open at the deadline are
    /// dropped when the serve future is discarded.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown_rx: broadcast::Receiver<()>,
        grace: Duration,
    ) {
        let port = self.port;
        let routes = self.state.routes.len();
        tracing::info!(port, routes, "server listening");

        let mut deadline_rx = shutdown_rx.resubscribe();
        let serve = axum::serve(listener, self.router().into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            });

        tokio::select! {
            result = serve.into_future() => {
                match result {
                    Ok(()) => tracing::info!(port, "server stopped"),
                    Err(err) => tracing::error!(port, error = %err, "server failed"),
                }
            }
            _ = async {
                let _ = deadline_rx.recv().await;
                tokio::time::sleep(grace).await;
            } => {
                tracing::warn!(port, grace_secs = grace.as_secs_f64(), "shutdown grace period expired, dropping remaining connections");
            }
        }
    }
}

/// Catch-all proxy handler: match route, dump, rewrite, dispatch, capture.
async fn proxy_handler(State(state): State<AppState>, request: Request) -> Response {
    let request_id = Uuid::new_v4();

    let route = match state.routes.lookup(&request) {
        Some(r) => r.clone(),
        None => {
            tracing::debug!(
                request_id = %request_id,
                host = ?request.headers().get(axum::http::header::HOST),
                path = request.uri().path(),
                "no route matched"
            );
            return (StatusCode::NOT_FOUND, "no matching route").into_response();
        }
    };

    // Buffer the body so the dump is complete; it is re-framed below.
    let (parts, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(request_id = %request_id, error = %err, "failed to read request body");
            return (StatusCode::BAD_REQUEST, "failed to read request body").into_response();
        }
    };

    dump_request(&parts, &body_bytes, &request_id);

    let stripped = rewrite_path(parts.uri.path(), route.path_prefix());
    let uri = match backend_uri(&route.backend, stripped, parts.uri.query()) {
        Ok(uri) => uri,
        Err(err) => {
            tracing::error!(request_id = %request_id, error = %err, "failed to build backend uri");
            return (StatusCode::INTERNAL_SERVER_ERROR, "bad backend target").into_response();
        }
    };

    let mut outbound = axum::http::Request::builder()
        .method(parts.method.clone())
        .uri(uri)
        .body(Body::from(body_bytes))
        .expect("request from parsed parts is valid");
    *outbound.headers_mut() = forward_headers(&parts.headers, &route.backend);

    tracing::debug!(
        request_id = %request_id,
        pattern = %route.pattern,
        target = %outbound.uri(),
        "dispatching to backend"
    );

    match state.client.request(outbound).await {
        Ok(upstream) => {
            let (mut head, body) = upstream.into_parts();
            // Hop-by-hop framing is owned by this server's transport.
            head.headers.remove(axum::http::header::TRANSFER_ENCODING);
            head.headers.remove(axum::http::header::CONNECTION);

            let mut record = CaptureRecord::new();
            record.set_status(head.status);
            record.set_headers(&head.headers);
            let capture = CaptureBody::new(body, record, move |record| {
                tracing::info!(target: "inspector::traffic", request_id = %request_id, "response\n{}", record.summary());
            });
            Response::from_parts(head, Body::new(capture))
        }
        Err(err) => {
            tracing::error!(request_id = %request_id, error = %err, backend = %route.backend, "upstream request failed");
            let mut record = CaptureRecord::new();
            record.set_status(StatusCode::BAD_GATEWAY);
            record.record(b"upstream request failed");
            tracing::info!(target: "inspector::traffic", request_id = %request_id, "response\n{}", record.summary());
            (StatusCode::BAD_GATEWAY, "upstream request failed").into_response()
        }
    }
}

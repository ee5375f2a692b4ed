//! Request logging and path rewriting.
//!
//! # Responsibilities
//! - Dump the inbound request verbatim before any processing
//! - Strip the matched frontend prefix from the request path
//! - Build the static outbound URI from the route's backend target
//!
//! # Design Decisions
//! - Prefix stripping is a plain string prefix, never a pattern
//! - The backend target is fixed per route; only the path suffix and query
//!   vary per request
//! - Hop-by-hop headers are dropped before forwarding (the request body is
//!   re-framed, so the inbound transfer encoding no longer applies)

use std::fmt::Write as _;

use axum::http::{header, request::Parts, HeaderMap, Uri};
use uuid::Uuid;

use crate::routing::Endpoint;

/// Headers that describe the client connection rather than the payload.
const HOP_BY_HOP: [header::HeaderName; 8] = [
    header::CONNECTION,
    header::HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Emit the verbatim request dump: request line, headers and full body,
/// one block per request, before any rewriting.
pub fn dump_request(parts: &Parts, body: &[u8], request_id: &Uuid) {
    let mut block = String::new();
    let _ = writeln!(
        block,
        "{} {} {:?}",
        parts.method, parts.uri, parts.version
    );
    for (name, value) in &parts.headers {
        let _ = writeln!(block, "{}: {}", name, String::from_utf8_lossy(value.as_bytes()));
    }
    if !body.is_empty() {
        block.push('\n');
        block.push_str(&String::from_utf8_lossy(body));
    }
    tracing::info!(target: "inspector::traffic", request_id = %request_id, "request\n{block}");
}

/// Strip the frontend prefix from the request path. A non-matching path is
/// returned unchanged.
pub fn rewrite_path<'a>(path: &'a str, prefix: &str) -> &'a str {
    path.strip_prefix(prefix).unwrap_or(path)
}

/// Join the backend's base path with the rewritten request path, avoiding
/// doubled or missing slashes at the seam.
fn join_paths(base: &str, rest: &str) -> String {
    match (base.ends_with('/'), rest.starts_with('/')) {
        (true, true) => format!("{}{}", base, &rest[1..]),
        (false, false) => format!("{}/{}", base, rest),
        _ => format!("{}{}", base, rest),
    }
}

/// Build the outbound URI: the route's static backend target joined with
/// the rewritten path, query preserved.
pub fn backend_uri(
    backend: &Endpoint,
    rewritten_path: &str,
    query: Option<&str>,
) -> Result<Uri, axum::http::uri::InvalidUri> {
    let path = join_paths(&backend.path, rewritten_path);
    let mut target = format!("{}://{}{}", backend.scheme, backend.authority(), path);
    if let Some(q) = query {
        target.push('?');
        target.push_str(q);
    }
    target.parse()
}

/// Copy headers for the outbound request: hop-by-hop headers dropped, Host
/// replaced with the backend authority.
pub fn forward_headers(inbound: &HeaderMap, backend: &Endpoint) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(inbound.len());
    for (name, value) in inbound {
        if name == &header::HOST || HOP_BY_HOP.contains(name) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    if let Ok(host) = backend.authority().parse() {
        out.insert(header::HOST, host);
    }
    out
}

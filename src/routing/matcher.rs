//! Per-port dispatch table and route matching.
//!
//! # Responsibilities
//! - Compile a port group's routes into a lookup table at server build time
//! - Match host (exact, case-insensitive, port stripped) and path prefix
//!   (case-sensitive plain string prefix, no patterns)
//!
//! # Design Decisions
//! - Most specific route wins: longer path prefix first, then lexicographic
//!   by pattern, so dispatch is deterministic regardless of map order
//! - Immutable after construction; shared via Arc without locks

use axum::body::Body;
use axum::http::Request;

use crate::routing::endpoint::Endpoint;
use crate::routing::table::PortGroup;

/// One registered route, compiled for matching.
#[derive(Debug, Clone)]
pub struct CompiledRoute {
    /// Frontend host, lowercased for case-insensitive comparison.
    host: String,
    /// Frontend path, matched as a plain string prefix.
    path_prefix: String,
    /// Static backend target; never re-parsed per request.
    pub backend: Endpoint,
    /// `host+path` pattern, for logging.
    pub pattern: String,
}

impl CompiledRoute {
    fn new(frontend: &Endpoint, backend: Endpoint) -> Self {
        Self {
            host: frontend.host.to_lowercase(),
            path_prefix: frontend.path.clone(),
            pattern: frontend.pattern(),
            backend,
        }
    }

    pub fn path_prefix(&self) -> &str {
        &self.path_prefix
    }

    /// True when the request's host and path both match this route.
    pub fn matches(&self, req: &Request<Body>) -> bool {
        let host_ok = request_host(req)
            .map(|h| h.eq_ignore_ascii_case(&self.host))
            .unwrap_or(false);
        host_ok && req.uri().path().starts_with(&self.path_prefix)
    }
}

/// Extract the request host for matching: the Host header (HTTP/1.1) or the
/// URI authority (HTTP/2), with any port stripped.
fn request_host(req: &Request<Body>) -> Option<&str> {
    let raw = req
        .headers()
        .get(axum::http::header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| req.uri().host())?;
    // Bracketed IPv6 hosts contain colons of their own.
    match raw.rfind(']') {
        Some(end) => Some(&raw[..=end]),
        None => Some(raw.rsplit_once(':').map_or(raw, |(host, _)| host)),
    }
}

/// All routes registered on one port, in match order.
#[derive(Debug)]
pub struct DispatchTable {
    routes: Vec<CompiledRoute>,
}

impl DispatchTable {
    /// Compile a port group. Longer prefixes sort first so the most
    /// specific route is matched, ties broken lexicographically.
    pub fn new(group: &PortGroup) -> Self {
        let mut routes: Vec<CompiledRoute> = group
            .routes
            .iter()
            .map(|(fe, be)| CompiledRoute::new(fe, be.clone()))
            .collect();
        routes.sort_by(|a, b| {
            b.path_prefix
                .len()
                .cmp(&a.path_prefix.len())
                .then_with(|| a.pattern.cmp(&b.pattern))
        });
        Self { routes }
    }

    /// Find the first route matching the request, if any.
    pub fn lookup(&self, req: &Request<Body>) -> Option<&CompiledRoute> {
        self.routes.iter().find(|r| r.matches(req))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::routing::table::RouteTable;

    fn table_for(entries: &[(&str, &str)]) -> DispatchTable {
        let mapping: BTreeMap<String, String> = entries
            .iter()
            .map(|(f, b)| (f.to_string(), b.to_string()))
            .collect();
        let table = RouteTable::build(&mapping).unwrap();
        let (_, group) = table.groups.iter().next().unwrap();
        DispatchTable::new(group)
    }

    fn request(host: &str, path: &str) -> Request<Body> {
        Request::builder()
            .uri(path)
            .header("Host", host)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn host_match_is_case_insensitive() {
        let table = table_for(&[("http://a.local/", "http://b.example/")]);
        assert!(table.lookup(&request("A.LOCAL", "/x")).is_some());
        assert!(table.lookup(&request("other.local", "/x")).is_none());
    }

    #[test]
    fn host_port_is_stripped_before_matching() {
        let table = table_for(&[("http://a.local:8080/", "http://b.example/")]);
        assert!(table.lookup(&request("a.local:8080", "/")).is_some());
    }

    #[test]
    fn path_prefix_is_case_sensitive() {
        let table = table_for(&[("http://a.local/api/", "http://b.example/")]);
        assert!(table.lookup(&request("a.local", "/api/users")).is_some());
        assert!(table.lookup(&request("a.local", "/API/users")).is_none());
        assert!(table.lookup(&request("a.local", "/images")).is_none());
    }

    #[test]
    fn most_specific_prefix_wins() {
        let table = table_for(&[
            ("http://a.local/", "http://root.example/"),
            ("http://a.local/api/", "http://api.example/"),
        ]);
        let route = table.lookup(&request("a.local", "/api/users")).unwrap();
        assert_eq!(route.backend.host, "api.example");

        let route = table.lookup(&request("a.local", "/other")).unwrap();
        assert_eq!(route.backend.host, "root.example");
    }

    #[test]
    fn missing_host_matches_nothing() {
        let table = table_for(&[("http://a.local/", "http://b.example/")]);
        let req = Request::builder().uri("/x").body(Body::empty()).unwrap();
        assert!(table.lookup(&req).is_none());
    }
}

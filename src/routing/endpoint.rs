//! Frontend/backend address parsing and canonicalization.
//!
//! # Responsibilities
//! - Parse a `scheme://host[:port]/[path]` string into an [`Endpoint`]
//! - Enforce supported schemes (http/https only)
//! - Default the port from the scheme when absent
//! - Preserve the escaped path verbatim for prefix matching
//!
//! # Design Decisions
//! - Credentials, query strings and fragments are never routed on;
//!   they are dropped with a warning rather than rejected
//! - Endpoints are immutable once parsed and ordered so route maps
//!   iterate deterministically

use std::fmt;

use thiserror::Error;
use url::Url;

/// Error type for endpoint parsing.
#[derive(Debug, Error)]
pub enum EndpointError {
    /// Scheme other than http or https.
    #[error("unsupported scheme {0:?}, expected http or https")]
    InvalidScheme(String),
    /// Host component missing or empty.
    #[error("empty hostname")]
    EmptyHost,
    /// Input could not be parsed as a URL at all.
    #[error("malformed url: {0}")]
    Malformed(#[from] url::ParseError),
}

/// Supported listening/target schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    /// Well-known port used when the address carries no explicit one.
    pub fn default_port(self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed, canonical address: either a frontend listening pattern or a
/// backend target.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Endpoint {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
    /// Escaped path component, percent-encoding preserved.
    pub path: String,
}

impl Endpoint {
    /// Parse and canonicalize an address string.
    ///
    /// Credentials, query strings and fragments are dropped from the
    /// result with a warning; they play no part in routing.
    pub fn parse(raw: &str) -> Result<Self, EndpointError> {
        // The WHATWG parser folds extra slashes after the scheme, so an
        // empty authority like `http:///path` would silently turn the
        // first path segment into the host. Reject it up front.
        if let Some((_, rest)) = raw.split_once("://") {
            if rest.is_empty() || rest.starts_with('/') {
                return Err(EndpointError::EmptyHost);
            }
        }

        let url = Url::parse(raw).map_err(|e| match e {
            url::ParseError::EmptyHost => EndpointError::EmptyHost,
            other => EndpointError::Malformed(other),
        })?;

        let scheme = match url.scheme() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            other => return Err(EndpointError::InvalidScheme(other.to_string())),
        };

        let host = match url.host_str() {
            Some(h) if !h.is_empty() => h.to_string(),
            _ => return Err(EndpointError::EmptyHost),
        };

        let port = url.port().unwrap_or_else(|| scheme.default_port());

        if !url.username().is_empty() || url.password().is_some() {
            tracing::warn!(url = raw, "credentials in url will be ignored");
        }
        if let Some(query) = url.query() {
            tracing::warn!(url = raw, query, "query parameters in url will be ignored");
        }
        if let Some(fragment) = url.fragment() {
            tracing::warn!(url = raw, fragment, "fragment in url will be ignored");
        }

        Ok(Self {
            scheme,
            host,
            port,
            path: url.path().to_string(),
        })
    }

    /// `host:port` form, used for the outbound Host header and target URI.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// `host+path` pattern under which this endpoint is registered on its
    /// port, mirroring how the dispatch table keys routes.
    pub fn pattern(&self) -> String {
        format!("{}{}", self.host, self.path)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}{}", self.scheme, self.host, self.port, self.path)
    }
}

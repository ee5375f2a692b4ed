//! Route table construction.
//!
//! # Responsibilities
//! - Validate every frontend/backend pair of the raw mapping
//! - Group routes by listening port
//! - Enforce one scheme per port
//! - Reject duplicate host+path patterns within a port
//!
//! # Design Decisions
//! - An entry that fails validation is skipped with a warning; startup
//!   continues with the remaining entries
//! - A scheme conflict or duplicate pattern aborts the whole build before
//!   any listener is bound
//! - BTreeMaps keep grouping and registration order deterministic

use std::collections::BTreeMap;

use thiserror::Error;

use crate::routing::endpoint::{Endpoint, Scheme};

/// Error type for route table construction. Both variants are fatal to the
/// entire build; no server starts.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Two frontends on one port disagree on scheme.
    #[error("port {port}: http and https frontends cannot share one port ({first} vs {second})")]
    SchemeConflict {
        port: u16,
        first: Scheme,
        second: Scheme,
    },
    /// Two frontends on one port resolve to the same host+path pattern.
    #[error("port {port}: duplicate frontend pattern {pattern:?}")]
    DuplicatePattern { port: u16, pattern: String },
}

/// Routes sharing one listening port and one scheme.
#[derive(Debug, Clone)]
pub struct PortGroup {
    pub scheme: Scheme,
    /// Frontend endpoint to backend endpoint, ordered by frontend.
    pub routes: BTreeMap<Endpoint, Endpoint>,
}

/// The complete validated routing configuration, grouped by port.
///
/// Built once at startup and read-only thereafter.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    pub groups: BTreeMap<u16, PortGroup>,
}

impl RouteTable {
    /// Build the table from the raw frontend-to-backend string mapping.
    ///
    /// Entries that fail URL validation are skipped with a warning.
    /// Scheme conflicts and duplicate patterns abort the build.
    pub fn build(mapping: &BTreeMap<String, String>) -> Result<Self, BuildError> {
        let mut groups: BTreeMap<u16, PortGroup> = BTreeMap::new();

        for (frontend, backend) in mapping {
            let fe = match Endpoint::parse(frontend) {
                Ok(e) => e,
                Err(err) => {
                    tracing::warn!(url = %frontend, error = %err, "skipping proxy entry: bad frontend");
                    continue;
                }
            };
            let be = match Endpoint::parse(backend) {
                Ok(e) => e,
                Err(err) => {
                    tracing::warn!(url = %backend, error = %err, "skipping proxy entry: bad backend");
                    continue;
                }
            };

            let group = groups.entry(fe.port).or_insert_with(|| PortGroup {
                scheme: fe.scheme,
                routes: BTreeMap::new(),
            });
            if group.scheme != fe.scheme {
                return Err(BuildError::SchemeConflict {
                    port: fe.port,
                    first: group.scheme,
                    second: fe.scheme,
                });
            }
            if group.routes.contains_key(&fe) {
                return Err(BuildError::DuplicatePattern {
                    port: fe.port,
                    pattern: fe.pattern(),
                });
            }

            tracing::debug!(frontend = %fe, backend = %be, "route registered");
            group.routes.insert(fe, be);
        }

        Ok(Self { groups })
    }

    /// Total number of routes across all port groups.
    pub fn route_count(&self) -> usize {
        self.groups.values().map(|g| g.routes.len()).sum()
    }
}

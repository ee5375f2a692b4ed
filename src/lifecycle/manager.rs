//! Server lifecycle management.
//!
//! # Responsibilities
//! - Bind one listener per port group, all before any traffic is served
//! - Start all port servers concurrently
//! - Coordinate shutdown: every server drains under an independent grace
//!   period; one server timing out never delays another
//!
//! # Design Decisions
//! - A bind failure aborts startup with an error instead of failing silently
//!   inside a background task
//! - HTTPS port groups are served without TLS termination for now; the
//!   certificate flags are accepted but unused (see config)

use std::net::Ipv4Addr;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::http::PortServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::routing::{RouteTable, Scheme};

/// Handle over all running port servers.
pub struct ServerSet {
    tasks: Vec<(u16, JoinHandle<()>)>,
    shutdown: Shutdown,
}

impl ServerSet {
    /// Bind and start one server per port group. Returns once every
    /// listener is bound and serving; a bind failure aborts the whole set.
    pub async fn start(table: RouteTable, grace: Duration) -> std::io::Result<Self> {
        let shutdown = Shutdown::new();

        // Bind everything first so an occupied port fails startup before
        // any traffic is accepted elsewhere.
        let mut bound = Vec::new();
        for (port, group) in &table.groups {
            if group.scheme == Scheme::Https {
                tracing::warn!(
                    port,
                    "tls termination is not implemented yet, serving plain http"
                );
            }
            let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, *port)).await?;
            bound.push((PortServer::new(*port, group), listener));
        }

        let mut tasks = Vec::with_capacity(bound.len());
        for (server, listener) in bound {
            let port = server.port();
            let rx = shutdown.subscribe();
            tasks.push((port, tokio::spawn(server.run(listener, rx, grace))));
        }

        Ok(Self { tasks, shutdown })
    }

    /// Number of running servers.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Trigger shutdown and wait for every server to stop or time out.
    /// The servers drain concurrently; this only joins them.
    pub async fn shutdown(self) {
        self.shutdown.trigger();
        for (port, task) in self.tasks {
            if let Err(err) = task.await {
                tracing::error!(port, error = %err, "server task failed during shutdown");
            }
        }
        tracing::info!("all servers stopped");
    }
}

//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     RouteTable -> manager.rs (bind all ports, spawn servers)
//!
//! Shutdown:
//!     Ctrl+C -> shutdown.rs (broadcast to all servers)
//!     -> each server drains under its own grace period
//!     -> manager.rs joins all tasks
//! ```

pub mod manager;
pub mod shutdown;

pub use manager::ServerSet;
pub use shutdown::{wait_for_interrupt, Shutdown};

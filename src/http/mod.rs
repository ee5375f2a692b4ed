//! HTTP interception subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     -> server.rs (dispatch table lookup)
//!     -> middleware.rs (verbatim dump, prefix strip, outbound URI)
//!     -> hyper client (backend dispatch)
//!     -> capture.rs (tee response bytes, emit summary)
//!     -> client
//! ```

pub mod capture;
pub mod middleware;
pub mod server;

pub use capture::{CaptureBody, CaptureRecord};
pub use server::PortServer;

//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Raw mapping (frontend string -> backend string)
//!     -> endpoint.rs (parse & canonicalize each side)
//!     -> table.rs (group by port, enforce one scheme per port)
//!     -> matcher.rs (compile per-port dispatch tables at server build)
//! ```
//!
//! # Design Decisions
//! - Routes validated and grouped once at startup, immutable at runtime
//! - Plain string prefix matching only, no patterns in the hot path
//! - Deterministic: same mapping always produces the same dispatch order

pub mod endpoint;
pub mod matcher;
pub mod table;

pub use endpoint::{Endpoint, EndpointError, Scheme};
pub use matcher::{CompiledRoute, DispatchTable};
pub use table::{BuildError, PortGroup, RouteTable};

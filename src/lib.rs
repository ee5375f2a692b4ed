//! Intercepting reverse proxy for debugging HTTP(S) traffic.
//!
//! Turns a flat frontend-pattern to backend-URL mapping into one listening
//! server per port, each dispatching matched requests to the right backend
//! while dumping the full request and the captured response to the log.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod routing;

pub use config::ProxyConfig;
pub use lifecycle::ServerSet;
pub use routing::{Endpoint, RouteTable};

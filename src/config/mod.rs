//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! --proxy flags and/or --config file.toml
//!     -> loader.rs (parse & deserialize)
//!     -> ProxyConfig (immutable, built once at entry)
//!     -> routing::RouteTable::build (semantic validation)
//! ```

pub mod loader;
pub mod schema;

pub use loader::{load_config, ConfigError};
pub use schema::{CaConfig, ProxyConfig, TlsConfig};

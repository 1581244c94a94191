//! Console Core - shared foundations of the settings console
//!
//! - Error taxonomy and structured validation results
//! - Location hierarchy types
//! - Normalization of the backend's inconsistent response shapes
//! - Auth context injected into the HTTP transport
//! - TOML configuration with environment overrides
//!
//! # Example
//!
//! ```rust
//! use console_core::{normalize_list, LocationLevel};
//! use serde_json::json;
//!
//! let body = json!({ "success": true, "data": ["state", "cluster"] });
//! let levels: Vec<LocationLevel> = normalize_list(body).unwrap();
//! assert_eq!(levels, vec![LocationLevel::State, LocationLevel::Cluster]);
//! ```

#![warn(unreachable_pub)]

pub mod auth;
pub mod config;
pub mod envelope;
pub mod error;
pub mod types;

pub use auth::{AuthContext, TokenStore};
pub use config::{ApiConfig, AuthConfig, CascadeConfig, ConsoleConfig, LoggingConfig};
pub use envelope::{message_of, normalize, normalize_list, unwrap_envelope};
pub use error::{ConsoleError, ErrorKind, FieldViolation, Result, Validate, Violations};
pub use types::{LocationLevel, LocationNode, NodeId, ReselectPolicy};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

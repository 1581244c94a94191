//! Console Client - the backend collaborator boundary
//!
//! - [`ApiTransport`]: request/response contract (`GET path -> JSON`,
//!   `POST/PUT path + body -> JSON`, `DELETE path -> ack`)
//! - [`HttpTransport`]: reqwest implementation with bearer auth
//! - [`RestClient`]: typed CRUD with response normalization
//! - [`OptionFetcher`] / [`LocationService`]: child-collection lookups for
//!   the location cascade
//!
//! # Example
//!
//! ```rust,no_run
//! use console_client::{HttpTransport, LevelSpec, LocationService, OptionFetcher, RestClient};
//! use console_core::{ApiConfig, AuthContext, LocationLevel};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let auth = Arc::new(AuthContext::with_token("secret"));
//! let transport = HttpTransport::new(&ApiConfig::default(), auth)?;
//! let locations = LocationService::new(RestClient::new(Arc::new(transport)));
//!
//! let states = locations
//!     .fetch_children(&LevelSpec::root(LocationLevel::State), None)
//!     .await?;
//! println!("{} states", states.len());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod locations;
pub mod resources;
pub mod rest;
pub mod transport;

pub use locations::{LevelSpec, LocationService, OptionFetcher};
pub use resources::{QuoteResource, Resource};
pub use rest::RestClient;
pub use transport::{ApiRequest, ApiTransport, HttpTransport, Method};

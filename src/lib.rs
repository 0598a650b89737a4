//! HTTP(S) dynamic inventory source.
//!
//! Fetches a JSON inventory document from a webserver (GitLab Pages, GitLab
//! artifacts, S3, any plain HTTP endpoint), validates it against the
//! external-inventory document shape, and builds the group/host/variable
//! graph the host tool consumes. One invocation per orchestration run: the
//! pipeline either returns a complete graph or fails with a typed error.
//!
//! Stages, in order:
//! - [`auth`]: credentials for the configured auth method
//! - [`fetch`]: one authenticated GET
//! - [`document`]: schema validation of the payload
//! - [`graph`]: group hierarchy, cycle detection, variable resolution
//! - [`plugin`]: the facade tying them together plus the host-tool sink

pub mod auth;
pub mod config;
pub mod document;
pub mod error;
pub mod fetch;
pub mod graph;
pub mod plugin;

pub use error::InventoryError;

pub type Result<T> = std::result::Result<T, InventoryError>;

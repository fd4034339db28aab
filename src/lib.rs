//! Hemmer provider for NodePing
//!
//! Manages [NodePing](https://nodeping.com) monitoring checks and contacts
//! from Hemmer configurations, and exposes read-only data sources for
//! existing ones.
//!
//! # Overview
//!
//! - **Resources**: `nodeping_check`, `nodeping_contact`
//! - **Data sources**: `nodeping_check`, `nodeping_checks`,
//!   `nodeping_contact`, `nodeping_contacts`
//! - **API client**: rate limited, with retries on 429 and 5xx answers
//!   ([`client`])
//! - **Protocol**: the Hemmer provider gRPC protocol with JSON payloads
//!   ([`server`])
//!
//! # Configuration
//!
//! ```hcl
//! provider "nodeping" {
//!   api_token    = var.nodeping_token   # or NODEPING_API_TOKEN
//!   customer_id  = "201205050153W2Q4C"  # optional sub-account
//!   default_tags = ["managed-by-hemmer"]
//! }
//! ```
//!
//! # Handshake Protocol
//!
//! The binary prints one line to stdout once its gRPC server is listening:
//!
//! ```text
//! HEMMER_PROVIDER|1|127.0.0.1:50051
//! ```
//!
//! Format: `HEMMER_PROVIDER|<protocol_version>|<address>`. Logs go to stderr.
//!
//! # Embedding
//!
//! ```ignore
//! use hemmer_provider_nodeping::{serve, NodePingProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     hemmer_provider_nodeping::init_logging();
//!     serve(NodePingProvider::new(env!("CARGO_PKG_VERSION"))).await
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod data_sources;
pub mod error;
pub mod logging;
pub mod plan;
pub mod provider;
pub mod resources;
pub mod schema;
pub mod server;
pub mod testing;
pub mod types;
pub mod validation;

#[allow(missing_docs)]
#[allow(clippy::all)]
pub mod generated;

pub use client::{Client, ClientConfig, ClientError};
pub use error::ProviderError;
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::NodePingProvider;
pub use schema::ProviderSchema;
pub use server::{
    serve, serve_on_listener, serve_with_options, ProviderService, ServeOptions,
};
pub use types::{
    AttributeChange, ImportedResource, PlanResult, ProviderMetadata, ServerCapabilities,
    HANDSHAKE_PREFIX, PROTOCOL_VERSION,
};
pub use validation::{is_valid, validate};

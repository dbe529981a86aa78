//! Shared types and logic for the Suporte.AI ticketing bridge.
//!
//! The daemon (`suported`) and the operator CLI (`suportectl`) both build on
//! this crate: the category taxonomy and keyword classifier, the session-scoped
//! ticketing backend client, the spreadsheet logger and the composite
//! "service desk" operations that tie them together.

pub mod backend;
pub mod classifier;
pub mod config;
pub mod error;
pub mod provisioning;
pub mod service_desk;
pub mod sheets;
pub mod taxonomy;
pub mod taxonomy_data;
pub mod ticket;

pub use backend::{CredentialProvider, Session, SessionPhase, TicketingClient};
pub use classifier::{Classifier, MatchPolicy};
pub use config::{ConfigError, SuporteConfig};
pub use error::{BackendOperation, BridgeError, ErrorPayload};
pub use service_desk::{ServiceDesk, TicketOutcome};
pub use taxonomy::{CategoryEntry, Taxonomy, TaxonomyError};

/// Crate version, shared by the daemon health probe and the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

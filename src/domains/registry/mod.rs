//! Registry domain module.
//!
//! The registry is the serialized view of every integrated server and its
//! tools. It is generated from the built-in manifests, written to a single
//! JSON file and read back through [`RegistryCache`] for discovery.
//!
//! ## Architecture
//!
//! - `manifest.rs` - Server and tool descriptor types
//! - `document.rs` - The on-disk document, atomic writes
//! - `cache.rs` - Load/invalidate cache over the document
//! - `search.rs` - Listings, search and stats over a cached document
//! - `error.rs` - Registry-specific error types

mod cache;
mod document;
mod error;
pub mod manifest;
pub mod search;

pub use cache::RegistryCache;
pub use document::RegistryDocument;
pub use error::RegistryError;
pub use manifest::{
    ExecutionType, InputContract, InputField, ServerManifest, ToolDescriptor, ToolExample,
};
pub use search::{RegistryStats, SearchHit, ServerSummary};

//! Tools domain module.
//!
//! Tools are thin adapters over third-party APIs and CLIs. Every invocation,
//! whatever the transport, goes through the [`Dispatcher`] and comes back as
//! an [`ExecutionEnvelope`].
//!
//! ## Architecture
//!
//! - `definitions/` - One directory per integrated server, one file per tool
//! - `handlers.rs` - The `ToolHandler` trait and server definitions
//! - `registry.rs` - `ToolCatalog`, the fixed list of built-in servers
//! - `router.rs` - Dispatch by `(server, tool)` and the rmcp tool router
//! - `envelope.rs` - The uniform success/error result wrapper
//! - `history.rs` - Bounded in-memory execution history
//! - `error.rs` - Tool-specific error types
//!
//! ## Adding a New Tool
//!
//! 1. Create a file under the server's directory in `definitions/`
//! 2. Define a params struct deriving `JsonSchema` and implement `ToolHandler`
//! 3. Add it with `.with_tool(..)` in that server's `server()` function
//! 4. Run `generate-registry` so the registry document lists it

pub mod definitions;
mod envelope;
mod error;
mod handlers;
pub mod history;
mod registry;
pub mod router;

pub use envelope::{EnvelopeError, ExecutionEnvelope, ExecutionMetadata};
pub use error::ToolError;
pub use handlers::*;
pub use history::{ExecutionHistory, ExecutionRecord, HistoryQuery};
pub use registry::{CatalogDrift, ToolCatalog};
pub use router::{Dispatcher, build_tool_router};

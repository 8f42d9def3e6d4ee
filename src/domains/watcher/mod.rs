//! Change watcher domain module.
//!
//! Keeps the registry cache eventually consistent with the registry file
//! and drops cached tool sources as soon as they change on disk.
//!
//! ## Architecture
//!
//! - `debounce.rs` - Idle/armed debounce state machine (no timers inside)
//! - `events.rs` - Classification of filesystem events into actions
//! - `source_cache.rs` - Path-keyed cache of tool source files
//! - `service.rs` - `notify` watcher plus the tokio event loop
//! - `error.rs` - Watcher error types

pub mod debounce;
mod error;
pub mod events;
mod service;
mod source_cache;

pub use debounce::{DebounceState, Debouncer};
pub use error::WatchError;
pub use events::{WatchAction, WatchTargets};
pub use service::{ChangeWatcher, WatchStats, WatchStatsSnapshot};
pub use source_cache::SourceCache;

//! Domains module containing business logic organized by bounded contexts.
//!
//! - `registry`: what the catalog publishes
//! - `tools`: what the catalog executes
//! - `watcher`: keeping the published view fresh

pub mod registry;
pub mod tools;
pub mod watcher;

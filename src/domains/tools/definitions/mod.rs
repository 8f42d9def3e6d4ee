//! Tool definitions module.
//!
//! One directory per integrated server, one file per tool. Each server
//! module exposes a `server(..)` function returning its
//! [`ServerDefinition`](super::ServerDefinition).

pub mod common;
pub mod docusign;
pub mod shadcn;
pub mod supabase;

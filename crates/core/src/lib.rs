//! Domain types and pure logic shared across the Lightbox workspace.
//!
//! This crate has no database or network dependencies so it can be used by
//! the repository layer, the mutation engine, the fan-out service, and any
//! CLI tooling alike.

pub mod config;
pub mod etag;
pub mod ids;
pub mod storage;
pub mod types;

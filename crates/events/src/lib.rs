//! Album event bus.
//!
//! This crate provides the in-process publish/subscribe hub the mutation
//! engine announces committed changes on:
//!
//! - [`EventBus`] — pub/sub hub backed by `tokio::sync::broadcast`.
//! - [`AlbumEvent`] — the domain event envelope, published only after the
//!   originating transaction has committed.
//!
//! Subscribers (push notification senders, analytics) are fire-and-forget:
//! a slow or absent subscriber never blocks or fails a mutation.

pub mod bus;

pub use bus::{AddedPhoto, AlbumEvent, AlbumEventKind, EventBus};

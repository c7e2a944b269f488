//! ledserver — networked addressable LED strip controller.
//!
//! Listens for small binary update messages on a datagram transport and
//! applies them to an in-memory frame buffer, committing the buffer to
//! hardware according to a render policy.

pub mod color;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod render;
pub mod server;
pub mod strip;
pub mod transport;
pub mod wire;

pub use error::LedserverError;

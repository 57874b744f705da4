//! TCP relay layer: listener, per-connection state machine, protocol texts.
//!
//! The [`Listener`] accepts clients and spawns one task per connection;
//! each task runs [`connection::run_connection`] against the shared
//! participant registry.

pub mod connection;
pub mod listener;
pub mod messages;

pub use connection::{ConnectionState, run_connection};
pub use listener::Listener;

// src/signal/mod.rs

//! Connection-as-signal trigger channels.
//!
//! The daemon listens on a local unix socket and on a TCP address.
//! Opening and closing a connection to either one requests a rebuild;
//! there is no payload and no reply. [`client::send_trigger`] is the
//! producer side of that contract.

pub mod client;
pub mod endpoint;
pub mod listener;

pub use client::{DEFAULT_SEND_TIMEOUT, send_trigger};
pub use endpoint::Endpoint;
pub use listener::{TriggerListener, spawn_accept_loop};

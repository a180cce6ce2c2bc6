//! Networking layer between the dealer and its players.
//!
//! Frames are a little-endian `u32` length followed by a JSON document.
//! The server side uses `mio` for non-blocking I/O on the dealer's own
//! thread.

/// Blocking TCP client for bots and tools.
pub mod client;

pub mod errors;

/// In-process transport for tests and local bot tournaments.
pub mod local;

/// Message types for the dealer protocol.
pub mod messages;

/// TCP transport driven by a `mio` poll loop.
pub mod server;

/// The dealer's side of the conversation with its players.
pub mod transport;

/// Utilities for message framing.
pub mod utils;

//! Connection actors.
//!
//! Each client connection is one tokio task draining one queue:
//!
//! ```text
//! WebSocket --text--> ConnectionActor --update--> WebSocket
//! (ws.rs)        ^     (connection.rs)
//!                |
//! StateHandle ---+ (Flush via the root's subscriber)
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types for the connection queue
//! - `connection` - Per-connection state machine and handle
//! - `ws` - WebSocket accept loop and frame pump

pub mod connection;
pub mod messages;
pub(crate) mod ws;

pub use connection::{ConnectionHandle, ConnectionSender};

//! Wire protocol between the runtime and the browser script.
//!
//! # Message Types
//!
//! Client to server:
//! - `connect`: register the root ids found in the page
//! - `event`: a DOM event fired on an element carrying `data-on<event>`
//!
//! Server to client:
//! - `connected`: registration acknowledged
//! - `update`: replace the element with `data-component-id == componentID`

mod message;

pub use message::{ClientMessage, ServerMessage};

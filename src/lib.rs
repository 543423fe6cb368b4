//! Purview - server-rendered stateful components kept live over a WebSocket.
//!
//! ```text
//! Runtime::render(element) ──> static HTML with data-component-id / data-on*
//!                                   │
//! browser ──connect{rootIDs}──> ConnectionActor ──connected──> browser
//! browser ──event{eventID}────> handler -> StateHandle -> reconcile
//!                                   └──────update{componentID, html}──> browser
//! ```
//!
//! # Module Structure
//!
//! - `element` - Virtual nodes and `create_elem`
//! - `component` - Component trait, props, state handles, handlers
//! - `render` - Element tree to HTML, instance creation and reuse
//! - `reconcile` - Dirty-set processing and lifecycle hooks
//! - `runtime` - Root table and the public engine entry point
//! - `actor` - Per-connection actors and the WebSocket transport
//! - `protocol` - JSON wire messages
//! - `config` - `purview.toml`
//! - `cli` - The `purview` binary's commands and demo app

pub mod actor;
pub mod cli;
pub mod component;
pub mod config;
pub mod element;
pub mod embed;
pub mod error;
pub mod logger;
pub mod protocol;
pub(crate) mod reconcile;
pub(crate) mod render;
pub mod runtime;
pub mod utils;

pub use actor::{ConnectionHandle, ConnectionSender};
pub use component::{
    Component, ComponentRef, EventCx, Handler, HookCx, Props, RenderCx, State, StateHandle,
};
pub use config::{PurviewConfig, RuntimeConfig};
pub use element::{AttrValue, Attributes, Child, Element, NodeName, create_elem};
pub use error::{RenderError, TransportError};
pub use protocol::{ClientMessage, ServerMessage};
pub use runtime::Runtime;

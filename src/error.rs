//! Engine error types.
//!
//! Configuration errors live with the configuration (`config::ConfigError`).

use thiserror::Error;

/// Failure of a synchronous render.
#[derive(Debug, Error)]
pub enum RenderError {
    /// `Runtime::render` was given a plain tag instead of a component.
    #[error("root element `{0}` is not a component")]
    RootNotComponent(String),

    /// A component's render, constructor or hook panicked.
    #[error("component `{component}` panicked: {message}")]
    Panicked { component: String, message: String },
}

/// Failure of the WebSocket transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("websocket error")]
    WebSocket(#[from] tungstenite::Error),

    #[error("io error")]
    Io(#[from] std::io::Error),
}

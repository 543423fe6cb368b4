//! JSON messages exchanged over a connection.
//!
//! Both directions are internally tagged by `type`. Extra fields of an
//! `event` are kept as the handler payload.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Message sent by the browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Register the roots rendered into the page.
    Connect {
        #[serde(rename = "rootIDs")]
        root_ids: Vec<String>,
    },

    /// A DOM event; extra fields are passed to the handler.
    Event {
        #[serde(rename = "eventID")]
        event_id: String,
        #[serde(flatten)]
        payload: Map<String, Value>,
    },
}

impl ClientMessage {
    pub fn connect<I, S>(root_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Connect {
            root_ids: root_ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn event(event_id: impl Into<String>) -> Self {
        Self::Event {
            event_id: event_id.into(),
            payload: Map::new(),
        }
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Message sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    /// Registration acknowledged.
    Connected,

    /// New markup for one component.
    Update {
        #[serde(rename = "componentID")]
        component_id: String,
        html: String,
    },
}

impl ServerMessage {
    pub fn update(component_id: impl Into<String>, html: impl Into<String>) -> Self {
        Self::Update {
            component_id: component_id.into(),
            html: html.into(),
        }
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

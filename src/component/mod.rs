//! Component runtime.
//!
//! A component definition is a value implementing [`Component`]: the
//! capability set `initial_state`, `render` and the optional lifecycle
//! hooks. Definitions hold no per-instance data; each occurrence in a tree
//! is backed by an [`Instance`](instance::Instance) in its root's arena,
//! which owns the props and state and moves through the lifecycle
//!
//! ```text
//! constructed -> mounted -> updating <-> mounted -> unmounted
//! ```
//!
//! # Module Structure
//!
//! - `context` - Render/hook contexts handed to definitions
//! - `handler` - Event handlers and the event context
//! - `handle` - `StateHandle`, the only way to change state
//! - `instance` - Arena records and lifecycle state

mod context;
mod handle;
mod handler;
pub(crate) mod instance;

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::element::{AttrValue, Attributes, Child, Element, EventBinding};

pub use context::{HookCx, RenderCx};
pub use handle::StateHandle;
pub(crate) use handle::StateUpdate;
pub use handler::{EventCx, Handler, HandlerFuture};
pub use instance::{InstanceId, Lifecycle};

/// Component state: a JSON object, updated by shallow merge.
pub type State = Map<String, Value>;

/// Coerce a state value into an object. Non-object values become `{}`.
pub fn into_state(value: Value) -> State {
    match value {
        Value::Object(map) => map,
        Value::Null => State::new(),
        other => {
            crate::debug!("component"; "ignoring non-object state value: {}", other);
            State::new()
        }
    }
}

/// Shallow-merge `partial` into `state`.
pub(crate) fn merge_state(state: &mut State, partial: State) {
    for (key, value) in partial {
        state.insert(key, value);
    }
}

// =============================================================================
// Component Trait
// =============================================================================

/// Capability set of a component definition.
///
/// Only `render` is required. Hooks receive a [`HookCx`] whose handle may
/// queue state updates; the updates are applied on the next reconcile pass.
pub trait Component: Send + Sync + 'static {
    /// Initial state for a freshly constructed instance.
    fn initial_state(&self, _props: &Props) -> Value {
        Value::Object(State::new())
    }

    /// Describe the instance's markup for its current props and state.
    fn render(&self, cx: &RenderCx<'_>) -> Element;

    /// Fires once, after the instance's first render, when a client is
    /// connected to its root.
    fn component_did_mount(&self, _cx: &HookCx<'_>) {}

    /// Fires once, when the instance leaves the tree.
    fn component_will_unmount(&self, _cx: &HookCx<'_>) {}

    /// Fires when a re-render reuses the instance, before `next` replaces the
    /// current props.
    fn component_will_receive_props(&self, _next: &Props, _cx: &HookCx<'_>) {}
}

// =============================================================================
// Component Reference
// =============================================================================

/// A component definition plus its type identity.
///
/// Two references denote the same component type when they wrap the same
/// Rust type, regardless of which definition value they carry.
#[derive(Clone)]
pub struct ComponentRef {
    definition: Arc<dyn Component>,
    type_id: TypeId,
    name: &'static str,
}

impl ComponentRef {
    pub fn new<C: Component>(component: C) -> Self {
        Self::from_arc(Arc::new(component))
    }

    pub fn from_arc<C: Component>(component: Arc<C>) -> Self {
        let full = std::any::type_name::<C>();
        Self {
            definition: component,
            type_id: TypeId::of::<C>(),
            name: full.rsplit("::").next().unwrap_or(full),
        }
    }

    /// Short type name, for logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn same_type(&self, other: &ComponentRef) -> bool {
        self.type_id == other.type_id
    }

    pub(crate) fn definition(&self) -> &dyn Component {
        self.definition.as_ref()
    }
}

impl PartialEq for ComponentRef {
    fn eq(&self, other: &Self) -> bool {
        self.same_type(other)
    }
}

impl fmt::Debug for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentRef").field(&self.name).finish()
    }
}

// =============================================================================
// Props
// =============================================================================

/// Props of a component occurrence: the component element's attributes,
/// event registrations and children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Props {
    attributes: Attributes,
    events: Vec<EventBinding>,
    children: Vec<Child>,
}

impl Props {
    pub fn new(attributes: Attributes, children: Vec<Child>) -> Self {
        Self {
            attributes,
            events: Vec::new(),
            children,
        }
    }

    /// Props carried by a component element.
    pub(crate) fn from_element(element: &Element) -> Self {
        Self {
            attributes: element.attributes.clone(),
            events: element.events.clone(),
            children: element.children.clone(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.attributes.get(key)
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn children(&self) -> &[Child] {
        &self.children
    }

    /// Handler passed down under an event name (`"change"` for `onChange`).
    pub fn handler(&self, event: &str) -> Option<&Handler> {
        let event = event.to_ascii_lowercase();
        self.events
            .iter()
            .find(|b| b.event == event)
            .map(|b| &b.handler)
    }

    /// Bind handlers passed down as props to the instance that passed them.
    pub(crate) fn bind_handlers(&mut self, owner: &str) {
        for binding in &mut self.events {
            binding.handler = binding.handler.clone().owned_by(owner);
        }
    }

    /// Props as JSON: attributes plus a `children` array.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

impl Serialize for Props {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.attributes.len() + 1))?;
        for (k, v) in self.attributes.iter() {
            map.serialize_entry(k, v)?;
        }
        map.serialize_entry("children", &self.children)?;
        map.end()
    }
}

// =============================================================================
// Tests
// =============================================================================

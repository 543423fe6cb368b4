//! Contexts handed to component definitions.

use std::future::Future;

use serde_json::Value;

use super::{EventCx, Handler, Props, State, StateHandle};

/// Render context: the instance's id, props, state and handle.
pub struct RenderCx<'a> {
    props: &'a Props,
    state: &'a State,
    handle: StateHandle,
}

impl<'a> RenderCx<'a> {
    pub(crate) fn new(props: &'a Props, state: &'a State, handle: StateHandle) -> Self {
        Self {
            props,
            state,
            handle,
        }
    }

    pub fn id(&self) -> &str {
        self.handle.id()
    }

    pub fn props(&self) -> &Props {
        self.props
    }

    pub fn state(&self) -> &State {
        self.state
    }

    /// State field lookup.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    pub fn handle(&self) -> StateHandle {
        self.handle.clone()
    }

    /// Handler owned by this instance, safe to pass down as a prop.
    pub fn handler(&self, f: impl Fn(&EventCx) + Send + Sync + 'static) -> Handler {
        Handler::new(f).owned_by(self.handle.id())
    }

    /// Async handler owned by this instance.
    pub fn handler_future<F, Fut>(&self, f: F) -> Handler
    where
        F: Fn(EventCx) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Handler::future(f).owned_by(self.handle.id())
    }
}

/// Lifecycle hook context.
pub struct HookCx<'a> {
    props: &'a Props,
    state: &'a State,
    handle: StateHandle,
}

impl<'a> HookCx<'a> {
    pub(crate) fn new(props: &'a Props, state: &'a State, handle: StateHandle) -> Self {
        Self {
            props,
            state,
            handle,
        }
    }

    pub fn id(&self) -> &str {
        self.handle.id()
    }

    pub fn props(&self) -> &Props {
        self.props
    }

    pub fn state(&self) -> &State {
        self.state
    }

    pub fn handle(&self) -> StateHandle {
        self.handle.clone()
    }

    pub fn set_state(&self, partial: Value) {
        self.handle.set_state(partial);
    }

    pub fn update_state(&self, f: impl FnOnce(&State) -> Value + Send + 'static) {
        self.handle.update_state(f);
    }
}

//! Event handlers.
//!
//! A [`Handler`] is what an element registers for a DOM event. The renderer
//! turns each registration into a token; when the client reports the token
//! back, the connection invokes the handler with an [`EventCx`].
//!
//! Handlers may be synchronous closures or closures returning a future. An
//! async handler is awaited in place, so later events on the same connection
//! wait behind it.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::{InstanceId, Props, State, StateHandle};

/// Boxed future returned by async handlers.
pub type HandlerFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

type SyncFn = dyn Fn(&EventCx) + Send + Sync;
type AsyncFn = dyn Fn(EventCx) -> HandlerFuture + Send + Sync;

#[derive(Clone)]
enum HandlerKind {
    Sync(Arc<SyncFn>),
    Async(Arc<AsyncFn>),
}

/// Event handler, optionally bound to the instance that created it.
#[derive(Clone)]
pub struct Handler {
    kind: HandlerKind,
    owner: Option<InstanceId>,
}

impl Handler {
    /// Synchronous handler.
    pub fn new(f: impl Fn(&EventCx) + Send + Sync + 'static) -> Self {
        Self {
            kind: HandlerKind::Sync(Arc::new(f)),
            owner: None,
        }
    }

    /// Asynchronous handler.
    pub fn future<F, Fut>(f: F) -> Self
    where
        F: Fn(EventCx) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            kind: HandlerKind::Async(Arc::new(move |cx| Box::pin(f(cx)) as HandlerFuture)),
            owner: None,
        }
    }

    /// Bind to an owning instance. Already-bound handlers keep their owner.
    pub(crate) fn owned_by(mut self, owner: &str) -> Self {
        if self.owner.is_none() {
            self.owner = Some(owner.to_string());
        }
        self
    }

    pub(crate) fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub(crate) async fn invoke(&self, cx: EventCx) {
        match &self.kind {
            HandlerKind::Sync(f) => f(&cx),
            HandlerKind::Async(f) => f(cx).await,
        }
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        let same_fn = match (&self.kind, &other.kind) {
            (HandlerKind::Sync(a), HandlerKind::Sync(b)) => Arc::ptr_eq(a, b),
            (HandlerKind::Async(a), HandlerKind::Async(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        same_fn && self.owner == other.owner
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            HandlerKind::Sync(_) => "sync",
            HandlerKind::Async(_) => "async",
        };
        f.debug_struct("Handler")
            .field("kind", &kind)
            .field("owner", &self.owner)
            .finish()
    }
}

// =============================================================================
// Event Context
// =============================================================================

/// What a handler sees: the owning instance's handle, a snapshot of its props
/// and state taken at dispatch, and the event payload sent by the client.
#[derive(Clone)]
pub struct EventCx {
    handle: StateHandle,
    props: Props,
    state: State,
    payload: Map<String, Value>,
}

impl EventCx {
    pub(crate) fn new(
        handle: StateHandle,
        props: Props,
        state: State,
        payload: Map<String, Value>,
    ) -> Self {
        Self {
            handle,
            props,
            state,
            payload,
        }
    }

    /// Queue a shallow-merge state update on the owning instance.
    pub fn set_state(&self, partial: Value) {
        self.handle.set_state(partial);
    }

    /// Queue a functional state update on the owning instance.
    pub fn update_state(&self, f: impl FnOnce(&State) -> Value + Send + 'static) {
        self.handle.update_state(f);
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    /// Event payload fields (everything but `type` and `eventID`).
    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    pub fn handle(&self) -> &StateHandle {
        &self.handle
    }
}

impl fmt::Debug for EventCx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventCx")
            .field("instance", &self.handle.id())
            .field("payload", &self.payload)
            .finish()
    }
}

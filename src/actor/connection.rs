//! Connection Actor - per-client state machine
//!
//! ```text
//! unregistered --connect--> registered --close--> closed
//!      |                        |  ^
//!      | event: ignored         |  | connect: bind more roots
//!      v                        v  |
//!                        event: resolve token, run handler, flush
//! ```
//!
//! Messages are processed one at a time, to completion. An async handler is
//! awaited in place, so later frames on the same connection queue behind it.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use serde_json::{Map, Value};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::messages::ConnMsg;
use crate::component::{EventCx, Handler, StateHandle};
use crate::protocol::{ClientMessage, ServerMessage};
use crate::reconcile::panic_message;
use crate::runtime::{RootShared, Runtime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnState {
    Unregistered,
    Registered,
    Closed,
}

pub(crate) struct ConnectionActor {
    id: u64,
    runtime: Runtime,
    rx: UnboundedReceiver<ConnMsg>,
    /// Own queue sender, handed to roots as their subscriber.
    tx: UnboundedSender<ConnMsg>,
    out: UnboundedSender<ServerMessage>,
    state: ConnState,
    roots: Vec<Arc<RootShared>>,
}

impl ConnectionActor {
    pub fn new(id: u64, runtime: Runtime) -> (Self, ConnectionHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (out, outbound) = mpsc::unbounded_channel();
        let handle = ConnectionHandle {
            sender: ConnectionSender { tx: tx.clone() },
            outbound,
        };
        let actor = Self {
            id,
            runtime,
            rx,
            tx,
            out,
            state: ConnState::Unregistered,
            roots: Vec::new(),
        };
        (actor, handle)
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        crate::debug!("conn"; "#{} opened", self.id);
        while let Some(msg) = self.rx.recv().await {
            match msg {
                ConnMsg::Inbound(text) => self.on_text(&text).await,
                ConnMsg::Flush(root_id) => self.flush_root(&root_id),
                ConnMsg::Close => break,
            }
            if self.state == ConnState::Closed {
                break;
            }
        }
        self.close();
    }

    async fn on_text(&mut self, text: &str) {
        match ClientMessage::from_json(text) {
            Ok(ClientMessage::Connect { root_ids }) => self.connect(&root_ids),
            Ok(ClientMessage::Event { event_id, payload }) => self.event(&event_id, payload).await,
            Err(e) => crate::debug!("conn"; "#{} discarding malformed message: {}", self.id, e),
        }
    }

    // =========================================================================
    // connect
    // =========================================================================

    fn connect(&mut self, root_ids: &[String]) {
        let mut bound = Vec::new();
        for id in root_ids {
            let Some(root) = self.runtime.root(id) else {
                crate::debug!("conn"; "#{} skipping unknown root {}", self.id, id);
                continue;
            };
            if let Some(prev) = root.subscribe(self.id, self.tx.clone())
                && prev != self.id
            {
                crate::debug!("conn"; "root {} moved from #{} to #{}", id, prev, self.id);
            }
            root.cancel_unmount();
            if !self.roots.iter().any(|r| Arc::ptr_eq(r, &root)) {
                self.roots.push(Arc::clone(&root));
            }
            bound.push(root);
        }

        for root in &bound {
            self.runtime.mount(root);
        }
        self.state = ConnState::Registered;
        crate::debug!("conn"; "#{} registered {} root(s)", self.id, bound.len());
        self.send(ServerMessage::Connected);

        for root in &bound {
            self.flush(root);
        }
    }

    // =========================================================================
    // event
    // =========================================================================

    async fn event(&mut self, token: &str, payload: Map<String, Value>) {
        if self.state != ConnState::Registered {
            crate::debug!("conn"; "#{} ignoring event before connect", self.id);
            return;
        }
        let Some((handler, cx)) = self.resolve(token, payload) else {
            crate::debug!("conn"; "#{} dropping stale token {}", self.id, token);
            return;
        };

        if let Err(panic) = AssertUnwindSafe(handler.invoke(cx)).catch_unwind().await {
            crate::log!("error"; "handler for {} panicked: {}", token, panic_message(panic.as_ref()));
        }

        let roots = self.roots.clone();
        for root in &roots {
            self.flush(root);
        }
    }

    /// Find the handler behind `token` and snapshot its owner.
    fn resolve(&self, token: &str, payload: Map<String, Value>) -> Option<(Handler, EventCx)> {
        for root in &self.roots {
            let tree = root.tree.lock();
            let Some(entry) = tree.tokens.resolve(token) else {
                continue;
            };
            let owner = tree.get(&entry.owner)?;
            let cx = EventCx::new(
                StateHandle::new(root, entry.owner.as_str()),
                owner.props.clone(),
                owner.state.clone(),
                payload,
            );
            return Some((entry.handler.clone(), cx));
        }
        None
    }

    // =========================================================================
    // flush / send / close
    // =========================================================================

    fn flush_root(&mut self, root_id: &str) {
        let Some(root) = self.roots.iter().find(|r| r.id() == root_id).cloned() else {
            return;
        };
        self.flush(&root);
    }

    fn flush(&mut self, root: &Arc<RootShared>) {
        for update in self.runtime.flush(root) {
            self.send(ServerMessage::update(update.id, update.html));
        }
    }

    fn send(&mut self, msg: ServerMessage) {
        if self.state == ConnState::Closed {
            return;
        }
        if self.out.send(msg).is_err() {
            crate::debug!("conn"; "#{} transport gone", self.id);
            self.state = ConnState::Closed;
        }
    }

    fn close(&mut self) {
        self.state = ConnState::Closed;
        for root in self.roots.drain(..) {
            if root.unsubscribe(self.id) {
                self.runtime.schedule_unmount(root);
            }
        }
        crate::debug!("conn"; "#{} closed", self.id);
    }
}

// =============================================================================
// Handle
// =============================================================================

/// Inbound half of a connection. Dropping it closes the connection.
pub struct ConnectionSender {
    tx: UnboundedSender<ConnMsg>,
}

impl ConnectionSender {
    pub fn send(&self, msg: &ClientMessage) {
        self.send_text(msg.to_json());
    }

    /// Forward a raw text frame; malformed frames are discarded by the actor.
    pub fn send_text(&self, text: impl Into<String>) {
        let _ = self.tx.send(ConnMsg::Inbound(text.into()));
    }
}

impl Drop for ConnectionSender {
    fn drop(&mut self) {
        let _ = self.tx.send(ConnMsg::Close);
    }
}

/// A live connection over in-memory channels.
pub struct ConnectionHandle {
    sender: ConnectionSender,
    outbound: UnboundedReceiver<ServerMessage>,
}

impl ConnectionHandle {
    pub fn send(&self, msg: &ClientMessage) {
        self.sender.send(msg);
    }

    pub fn send_text(&self, text: impl Into<String>) {
        self.sender.send_text(text);
    }

    /// Next server message; `None` once the connection is closed.
    pub async fn recv(&mut self) -> Option<ServerMessage> {
        self.outbound.recv().await
    }

    /// Next server message if one is already queued.
    pub fn try_recv(&mut self) -> Option<ServerMessage> {
        self.outbound.try_recv().ok()
    }

    pub fn split(self) -> (ConnectionSender, UnboundedReceiver<ServerMessage>) {
        (self.sender, self.outbound)
    }

    pub fn close(self) {
        drop(self);
    }
}

#[cfg(test)]
mod tests;

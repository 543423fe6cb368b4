//! Shared per-root record.
//!
//! Each root owns its tree behind its own mutex, a pending-update queue and
//! the senders of the connections bound to it. The most recent binding
//! receives flush requests; earlier ones take over again when it leaves. Roots never lock each
//! other, so independent roots proceed in parallel.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::AbortHandle;

use super::RootTree;
use crate::actor::messages::ConnMsg;
use crate::component::{InstanceId, StateUpdate};

/// A connection bound to a root.
struct Subscriber {
    conn: u64,
    tx: UnboundedSender<ConnMsg>,
}

pub(crate) struct RootShared {
    id: InstanceId,
    pub(crate) tree: Mutex<RootTree>,
    pending: Mutex<Vec<StateUpdate>>,
    /// Bound connections, oldest first. The last one is active.
    subscribers: Mutex<Vec<Subscriber>>,
    unmount_timer: Mutex<Option<AbortHandle>>,
    closed: AtomicBool,
}

impl RootShared {
    pub fn new(id: InstanceId) -> Self {
        Self {
            id,
            tree: Mutex::new(RootTree::default()),
            pending: Mutex::new(Vec::new()),
            subscribers: Mutex::new(Vec::new()),
            unmount_timer: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Queue a state update. The first update of a batch posts a flush
    /// request to the subscribed connection.
    pub fn enqueue(&self, update: StateUpdate) {
        if self.is_closed() {
            crate::debug!("runtime"; "root {} is closed, dropping {:?}", self.id, update);
            return;
        }
        let first = {
            let mut pending = self.pending.lock();
            pending.push(update);
            pending.len() == 1
        };
        if first && let Some(sub) = self.subscribers.lock().last() {
            let _ = sub.tx.send(ConnMsg::Flush(self.id.clone()));
        }
    }

    pub fn take_pending(&self) -> Vec<StateUpdate> {
        std::mem::take(&mut *self.pending.lock())
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.lock().is_empty()
    }

    /// Bind a connection and make it the active one. Returns the id of the
    /// connection that was active before.
    pub fn subscribe(&self, conn: u64, tx: UnboundedSender<ConnMsg>) -> Option<u64> {
        let mut subscribers = self.subscribers.lock();
        let prev = subscribers.last().map(|s| s.conn);
        subscribers.retain(|s| s.conn != conn);
        subscribers.push(Subscriber { conn, tx });
        prev
    }

    /// Unbind `conn`. Returns true when this left the root with no
    /// connection at all.
    ///
    /// If `conn` was active, the previous binding becomes active and is
    /// asked to flush whatever was queued meanwhile.
    pub fn unsubscribe(&self, conn: u64) -> bool {
        let mut subscribers = self.subscribers.lock();
        let Some(pos) = subscribers.iter().position(|s| s.conn == conn) else {
            return false;
        };
        let was_active = pos + 1 == subscribers.len();
        subscribers.remove(pos);
        match subscribers.last() {
            None => true,
            Some(next) => {
                if was_active && self.has_pending() {
                    crate::debug!("runtime"; "root {} falls back to #{}", self.id, next.conn);
                    let _ = next.tx.send(ConnMsg::Flush(self.id.clone()));
                }
                false
            }
        }
    }

    pub fn is_subscribed(&self) -> bool {
        !self.subscribers.lock().is_empty()
    }

    pub fn set_unmount_timer(&self, timer: AbortHandle) {
        if let Some(old) = self.unmount_timer.lock().replace(timer) {
            old.abort();
        }
    }

    /// Abort a scheduled delayed unmount. Returns true if one was pending.
    pub fn cancel_unmount(&self) -> bool {
        match self.unmount_timer.lock().take() {
            Some(timer) => {
                timer.abort();
                true
            }
            None => false,
        }
    }

    /// Mark closed. Returns false if it already was.
    pub fn close(&self) -> bool {
        self.subscribers.lock().clear();
        self.pending.lock().clear();
        !self.closed.swap(true, Ordering::AcqRel)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

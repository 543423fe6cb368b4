//! Runtime context.
//!
//! A [`Runtime`] owns everything the engine shares between requests and
//! connections: the root table, the id generator and the configuration.
//!
//! ```text
//! Runtime::new(config)
//!   ├── render(element)       -> static HTML, root registered
//!   ├── attach(listener)      -> WebSocket accept loop
//!   ├── open_connection()     -> in-memory connection (custom transports)
//!   └── shutdown()            -> every root unmounted
//! ```
//!
//! Cloning a runtime is cheap; clones share the same state.

mod root;
mod tree;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::runtime::Handle;
use tokio::task::{AbortHandle, JoinHandle};

use crate::actor::connection::{ConnectionActor, ConnectionHandle};
use crate::component::{InstanceId, StateHandle};
use crate::config::RuntimeConfig;
use crate::element::Element;
use crate::error::RenderError;
use crate::reconcile::{self, Update};
use crate::utils::id::IdGen;

pub(crate) use root::RootShared;
pub(crate) use tree::RootTree;

struct RuntimeInner {
    config: RuntimeConfig,
    ids: IdGen,
    roots: DashMap<InstanceId, Arc<RootShared>>,
    next_conn: AtomicU64,
    /// Accept loops and socket tasks, aborted on shutdown.
    attachments: Mutex<Vec<AbortHandle>>,
    /// Tokio runtime seen by `attach`, for timers started off-runtime.
    tokio: Mutex<Option<Handle>>,
    shut_down: AtomicBool,
}

/// Engine entry point.
#[derive(Clone)]
pub struct Runtime {
    inner: Arc<RuntimeInner>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

impl Runtime {
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            inner: Arc::new(RuntimeInner {
                config,
                ids: IdGen::new(),
                roots: DashMap::new(),
                next_conn: AtomicU64::new(1),
                attachments: Mutex::new(Vec::new()),
                tokio: Mutex::new(None),
                shut_down: AtomicBool::new(false),
            }),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    /// Render a component element as a new root and register the root.
    ///
    /// The returned HTML's outermost element carries the root id in
    /// `data-component-id`. Instances stay `constructed` until a connection
    /// registers the root. A root nobody registers within
    /// `register_timeout_ms` is dropped.
    pub fn render(&self, element: &Element) -> Result<String, RenderError> {
        self.render_root(element).map(|(_, html)| html)
    }

    /// Like [`render`](Self::render), also returning the root id.
    pub fn render_root(&self, element: &Element) -> Result<(InstanceId, String), RenderError> {
        let id = self.inner.ids.next_id();
        let root = Arc::new(RootShared::new(id.clone()));
        let html = reconcile::render_root(&root, &self.inner.ids, element)?;
        crate::debug!("runtime"; "root {} rendered", id);
        self.inner.roots.insert(id.clone(), Arc::clone(&root));
        let timeout = self.inner.config.register_timeout();
        if !timeout.is_zero() && !self.unmount_after(&root, timeout) {
            crate::debug!("runtime"; "no tokio runtime, root {} kept until shutdown", id);
        }
        Ok((id, html))
    }

    pub fn has_root(&self, id: &str) -> bool {
        self.inner.roots.contains_key(id)
    }

    pub fn root_count(&self) -> usize {
        self.inner.roots.len()
    }

    /// State handle of a root's top-level instance.
    pub fn handle(&self, root_id: &str) -> Option<StateHandle> {
        self.root(root_id).map(|root| StateHandle::new(&root, root_id))
    }

    /// Open a connection over in-memory channels.
    ///
    /// Must be called inside a tokio runtime.
    pub fn open_connection(&self) -> ConnectionHandle {
        let conn = self.inner.next_conn.fetch_add(1, Ordering::Relaxed);
        let (actor, handle) = ConnectionActor::new(conn, self.clone());
        tokio::spawn(actor.run());
        handle
    }

    /// Accept WebSocket connections on `listener` until shutdown.
    ///
    /// Must be called inside a tokio runtime. That runtime also drives the
    /// registration timers of roots rendered from other threads.
    pub fn attach(&self, listener: TcpListener) -> JoinHandle<()> {
        self.inner.tokio.lock().get_or_insert_with(Handle::current);
        self.spawn_tracked(crate::actor::ws::accept_loop(self.clone(), listener))
    }

    /// Stop accepting connections and unmount every root.
    pub fn shutdown(&self) {
        if self.inner.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        for task in self.inner.attachments.lock().drain(..) {
            task.abort();
        }
        let ids: Vec<InstanceId> = self.inner.roots.iter().map(|e| e.key().clone()).collect();
        crate::log!("runtime"; "shutting down, unmounting {} root(s)", ids.len());
        for id in ids {
            self.unmount_root(&id);
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shut_down.load(Ordering::Acquire)
    }

    // =========================================================================
    // Connection-facing operations
    // =========================================================================

    /// Spawn a transport task that shutdown aborts.
    pub(crate) fn spawn_tracked<F>(&self, fut: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let task = tokio::spawn(fut);
        let mut attachments = self.inner.attachments.lock();
        if self.is_shut_down() {
            task.abort();
        } else {
            attachments.retain(|t| !t.is_finished());
            attachments.push(task.abort_handle());
        }
        task
    }

    pub(crate) fn root(&self, id: &str) -> Option<Arc<RootShared>> {
        self.inner.roots.get(id).map(|e| Arc::clone(e.value()))
    }

    pub(crate) fn flush(&self, root: &Arc<RootShared>) -> Vec<Update> {
        reconcile::flush(root, &self.inner.ids, &self.inner.config)
    }

    pub(crate) fn mount(&self, root: &Arc<RootShared>) {
        reconcile::mount(root);
    }

    /// Remove a root and tear its tree down.
    pub(crate) fn unmount_root(&self, id: &str) {
        let Some((_, root)) = self.inner.roots.remove(id) else {
            return;
        };
        root.cancel_unmount();
        if root.close() {
            reconcile::unmount(&root);
        }
    }

    /// Unmount `root` after the grace period unless a connection re-binds it.
    pub(crate) fn schedule_unmount(&self, root: Arc<RootShared>) {
        let grace = self.inner.config.unmount_grace();
        if grace.is_zero() || !self.unmount_after(&root, grace) {
            self.unmount_root(root.id());
        }
    }

    /// Start a timer that unmounts `root` after `delay` if no connection is
    /// bound by then. Returns false when there is no tokio runtime to run it.
    fn unmount_after(&self, root: &Arc<RootShared>, delay: Duration) -> bool {
        let Some(handle) = Handle::try_current()
            .ok()
            .or_else(|| self.inner.tokio.lock().clone())
        else {
            return false;
        };
        let runtime = self.clone();
        let target = Arc::clone(root);
        let task = handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if target.is_subscribed() {
                return;
            }
            crate::debug!("runtime"; "no connection for root {}, unmounting", target.id());
            runtime.unmount_root(target.id());
        });
        root.set_unmount_timer(task.abort_handle());
        true
    }
}

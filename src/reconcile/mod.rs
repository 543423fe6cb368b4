//! Reconciler.
//!
//! Turns queued state updates into `(instance id, html)` fragments:
//!
//! ```text
//! flush(root)
//!   ├── apply pending updates  -> merge state, mark dirty
//!   ├── reconcile dirty        -> shallowest first, one snapshot per instance
//!   │     └── Renderer::render_instance(id)
//!   ├── detach dropped slots   -> will_unmount (top-down)
//!   ├── mount new instances    -> did_mount (post-order)
//!   └── repeat while hooks queued more updates (bounded)
//! ```
//!
//! Hooks fire after the tree lock is released, so a hook may freely queue
//! state updates or inspect the runtime.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::component::instance::Instance;
use crate::component::{ComponentRef, HookCx, InstanceId, Props, State, StateHandle, merge_state};
use crate::config::RuntimeConfig;
use crate::error::RenderError;
use crate::render::Renderer;
use crate::runtime::{RootShared, RootTree};
use crate::utils::id::IdGen;

/// One fragment to ship: replace the element carrying `id`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Update {
    pub id: InstanceId,
    pub html: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HookKind {
    DidMount,
    WillUnmount,
}

/// A lifecycle hook to fire once the tree lock is released.
struct HookCall {
    kind: HookKind,
    id: InstanceId,
    definition: ComponentRef,
    props: Props,
    state: State,
}

impl HookCall {
    fn new(kind: HookKind, instance: &Instance) -> Self {
        Self {
            kind,
            id: instance.id.clone(),
            definition: instance.definition.clone(),
            props: instance.props.clone(),
            state: instance.state.clone(),
        }
    }
}

/// Result of reconciling one root's dirty set.
#[derive(Default)]
struct Pass {
    updates: Vec<Update>,
    hooks: Vec<HookCall>,
}

// =============================================================================
// Entry Points
// =============================================================================

/// Render a fresh root. On failure the root's tree is left empty.
pub(crate) fn render_root(
    root: &Arc<RootShared>,
    ids: &IdGen,
    element: &crate::element::Element,
) -> Result<String, RenderError> {
    let mut tree = root.tree.lock();
    let result = catch_unwind(AssertUnwindSafe(|| {
        Renderer::new(&mut tree, ids, root).mount_root(root.id(), element)
    }));
    match result {
        Ok(Some(html)) => Ok(html),
        Ok(None) => Err(RenderError::RootNotComponent(
            element.node_name.as_str().to_string(),
        )),
        Err(payload) => {
            *tree = RootTree::default();
            let err = RenderError::Panicked {
                component: element.node_name.as_str().to_string(),
                message: panic_message(payload.as_ref()),
            };
            crate::log!("error"; "{}", err);
            Err(err)
        }
    }
}

/// Apply pending updates and re-render until the root settles.
pub(crate) fn flush(root: &Arc<RootShared>, ids: &IdGen, config: &RuntimeConfig) -> Vec<Update> {
    let mut updates = Vec::new();
    for pass_no in 0..config.max_flush_passes.max(1) {
        let pending = root.take_pending();
        let pass = {
            let mut tree = root.tree.lock();
            apply_updates(&mut tree, pending);
            let mut pass = reconcile_dirty(&mut tree, ids, root);
            pass.hooks.extend(collect_mounts(&mut tree, root.id()));
            pass
        };
        crate::debug!(
            "reconcile";
            "root {} pass {}: {} update(s), {} hook(s)",
            root.id(),
            pass_no,
            pass.updates.len(),
            pass.hooks.len()
        );
        updates.extend(pass.updates);
        fire_hooks(root, pass.hooks);
        if !root.has_pending() {
            crate::debug_do! {
                let tree = root.tree.lock();
                crate::debug!(
                    "reconcile";
                    "root {} settled: {} instance(s), {} token(s)",
                    root.id(),
                    tree.len(),
                    tree.tokens.len()
                );
            }
            return updates;
        }
    }
    let dropped = root.take_pending().len();
    crate::log!(
        "error";
        "root {} still has {} update(s) after {} passes, dropping them",
        root.id(),
        dropped,
        config.max_flush_passes
    );
    updates
}

/// Fire `component_did_mount` for every instance still in `constructed`.
pub(crate) fn mount(root: &Arc<RootShared>) {
    let hooks = collect_mounts(&mut root.tree.lock(), root.id());
    fire_hooks(root, hooks);
}

/// Tear down the whole tree, firing `component_will_unmount` top-down.
pub(crate) fn unmount(root: &Arc<RootShared>) {
    let hooks: Vec<HookCall> = {
        let mut tree = root.tree.lock();
        let removed = tree.detach(root.id());
        tree.tokens.clear();
        tree.dirty.clear();
        removed
            .iter()
            .filter(|(_, fire)| *fire)
            .map(|(instance, _)| HookCall::new(HookKind::WillUnmount, instance))
            .collect()
    };
    crate::debug!("reconcile"; "root {} unmounted ({} hook(s))", root.id(), hooks.len());
    fire_hooks(root, hooks);
}

// =============================================================================
// Passes
// =============================================================================

fn apply_updates(tree: &mut RootTree, pending: Vec<crate::component::StateUpdate>) {
    for update in pending {
        let id = update.instance().to_string();
        let Some(instance) = tree.get_mut(&id) else {
            crate::debug!("reconcile"; "ignoring update for unknown instance {}", id);
            continue;
        };
        if !instance.mark_updating() {
            crate::debug!("reconcile"; "ignoring update for unmounted instance {}", id);
            continue;
        }
        let current = &instance.state;
        match catch_unwind(AssertUnwindSafe(|| update.into_partial(current))) {
            Ok(partial) => {
                merge_state(&mut instance.state, partial);
                tree.dirty.insert(id);
            }
            Err(payload) => {
                crate::log!("error"; "state update for {} panicked: {}", id, panic_message(payload.as_ref()));
            }
        }
    }
}

/// Re-render dirty instances, shallowest first.
///
/// Each instance gets its own snapshot: a panic restores the tree as it was
/// before that instance's render and skips its update.
fn reconcile_dirty(tree: &mut RootTree, ids: &IdGen, root: &Arc<RootShared>) -> Pass {
    let dirty: Vec<InstanceId> = tree.dirty.drain().collect();
    let mut order: Vec<(usize, InstanceId)> = dirty
        .into_iter()
        .filter_map(|id| tree.get(&id).map(|inst| (inst.depth, id)))
        .collect();
    order.sort();

    let mut pass = Pass::default();
    let mut rendered: FxHashSet<InstanceId> = FxHashSet::default();
    for (_, id) in order {
        if rendered.contains(&id) || !tree.contains(&id) {
            continue;
        }
        let snapshot = tree.clone();
        let result = catch_unwind(AssertUnwindSafe(|| {
            let mut renderer = Renderer::new(&mut *tree, ids, root);
            let html = renderer.render_instance(&id);
            (html, renderer.finish())
        }));
        match result {
            Ok((html, outcome)) => {
                rendered.extend(outcome.rendered);
                for dropped in outcome.dropped {
                    for (instance, fire) in tree.detach(&dropped) {
                        if fire {
                            pass.hooks.push(HookCall::new(HookKind::WillUnmount, &instance));
                        }
                    }
                }
                pass.updates.push(Update { id, html });
            }
            Err(payload) => {
                let component = snapshot.get(&id).map_or("?", |inst| inst.definition.name());
                *tree = snapshot;
                let err = RenderError::Panicked {
                    component: component.to_string(),
                    message: panic_message(payload.as_ref()),
                };
                crate::log!("error"; "re-render of {} failed: {}", id, err);
            }
        }
    }
    pass
}

/// `constructed -> mounted` for the whole tree, in post-order.
fn collect_mounts(tree: &mut RootTree, root_id: &str) -> Vec<HookCall> {
    let mut hooks = Vec::new();
    for id in tree.subtree_post_order(root_id) {
        if let Some(instance) = tree.get_mut(&id)
            && instance.mark_mounted()
        {
            hooks.push(HookCall::new(HookKind::DidMount, instance));
        }
    }
    hooks
}

fn fire_hooks(root: &Arc<RootShared>, hooks: Vec<HookCall>) {
    for hook in hooks {
        let cx = HookCx::new(&hook.props, &hook.state, StateHandle::new(root, hook.id.as_str()));
        let definition = hook.definition.definition();
        let result = catch_unwind(AssertUnwindSafe(|| match hook.kind {
            HookKind::DidMount => definition.component_did_mount(&cx),
            HookKind::WillUnmount => definition.component_will_unmount(&cx),
        }));
        if let Err(payload) = result {
            crate::log!(
                "error";
                "{:?} hook of <{}> {} panicked: {}",
                hook.kind,
                hook.definition.name(),
                hook.id,
                panic_message(payload.as_ref())
            );
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

//! Per-root instance arena.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::component::InstanceId;
use crate::component::instance::Instance;
use crate::render::TokenTable;

/// Instances, handler tokens and dirty marks of one root.
///
/// `Clone` is the pre-pass snapshot: a failed render restores the clone.
#[derive(Debug, Clone, Default)]
pub(crate) struct RootTree {
    instances: FxHashMap<InstanceId, Instance>,
    pub tokens: TokenTable,
    pub dirty: FxHashSet<InstanceId>,
}

impl RootTree {
    pub fn get(&self, id: &str) -> Option<&Instance> {
        self.instances.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Instance> {
        self.instances.get_mut(id)
    }

    pub fn insert(&mut self, instance: Instance) {
        self.instances.insert(instance.id.clone(), instance);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.instances.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Subtree ids in pre-order (parents before children).
    pub fn subtree(&self, id: &str) -> Vec<InstanceId> {
        let mut out = Vec::new();
        let mut stack = vec![id.to_string()];
        while let Some(current) = stack.pop() {
            let Some(instance) = self.instances.get(&current) else {
                continue;
            };
            stack.extend(instance.children.iter().rev().map(|(_, child)| child.clone()));
            out.push(current);
        }
        out
    }

    /// Subtree ids in post-order (children before parents).
    pub fn subtree_post_order(&self, id: &str) -> Vec<InstanceId> {
        fn walk(tree: &RootTree, id: &str, out: &mut Vec<InstanceId>) {
            let Some(instance) = tree.instances.get(id) else {
                return;
            };
            for (_, child) in &instance.children {
                walk(tree, child, out);
            }
            out.push(id.to_string());
        }
        let mut out = Vec::new();
        walk(self, id, &mut out);
        out
    }

    /// Remove a subtree, revoking its tokens and dirty marks.
    ///
    /// Instances are returned top-down and already marked unmounted.
    pub fn detach(&mut self, id: &str) -> Vec<(Instance, bool)> {
        let mut removed = Vec::new();
        for current in self.subtree(id) {
            let Some(mut instance) = self.instances.remove(&current) else {
                continue;
            };
            self.tokens.revoke(&instance.tokens);
            self.dirty.remove(&current);
            let fire_hook = instance.mark_unmounted();
            removed.push((instance, fire_hook));
        }
        removed
    }
}

//! Component instance records.
//!
//! Instances live in their root's arena keyed by id. Identity and reuse are
//! explicit lookups: an instance is found again through its parent's
//! `children` list, keyed by the structural slot path inside the parent's
//! render output.

use smallvec::SmallVec;

use super::{ComponentRef, Props, State};

/// Opaque instance id (also the `data-component-id` value).
pub type InstanceId = String;

/// Child-index path from a parent's render root to a component node.
pub(crate) type SlotPath = SmallVec<[u32; 8]>;

/// Instance lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Created with initial state, `component_did_mount` not yet fired.
    Constructed,
    /// Rendered and mounted.
    Mounted,
    /// A state update was accepted; re-render pending.
    Updating,
    /// Terminal.
    Unmounted,
}

/// Arena record backing one component occurrence.
#[derive(Debug, Clone)]
pub(crate) struct Instance {
    pub id: InstanceId,
    pub definition: ComponentRef,
    pub props: Props,
    pub state: State,
    pub parent: Option<InstanceId>,
    pub slot: SlotPath,
    pub depth: usize,
    /// Child instances in render order, keyed by slot.
    pub children: Vec<(SlotPath, InstanceId)>,
    /// Handler tokens emitted by this instance's last render.
    pub tokens: Vec<String>,
    pub lifecycle: Lifecycle,
}

impl Instance {
    pub fn new(
        id: InstanceId,
        definition: ComponentRef,
        props: Props,
        parent: Option<InstanceId>,
        slot: SlotPath,
        depth: usize,
    ) -> Self {
        let state = super::into_state(definition.definition().initial_state(&props));
        Self {
            id,
            definition,
            props,
            state,
            parent,
            slot,
            depth,
            children: Vec::new(),
            tokens: Vec::new(),
            lifecycle: Lifecycle::Constructed,
        }
    }

    /// Accept a state update. Returns false for unmounted instances.
    pub fn mark_updating(&mut self) -> bool {
        match self.lifecycle {
            Lifecycle::Unmounted => false,
            Lifecycle::Constructed => true,
            Lifecycle::Mounted | Lifecycle::Updating => {
                self.lifecycle = Lifecycle::Updating;
                true
            }
        }
    }

    /// A render of this instance completed.
    pub fn mark_rendered(&mut self) {
        if self.lifecycle == Lifecycle::Updating {
            self.lifecycle = Lifecycle::Mounted;
        }
    }

    /// `constructed -> mounted`. Returns true when the transition happened,
    /// i.e. when `component_did_mount` must fire.
    pub fn mark_mounted(&mut self) -> bool {
        if self.lifecycle == Lifecycle::Constructed {
            self.lifecycle = Lifecycle::Mounted;
            true
        } else {
            false
        }
    }

    /// `* -> unmounted`. Returns true when `component_will_unmount` must
    /// fire: the instance had been mounted and was not unmounted before.
    pub fn mark_unmounted(&mut self) -> bool {
        let was = self.lifecycle;
        self.lifecycle = Lifecycle::Unmounted;
        matches!(was, Lifecycle::Mounted | Lifecycle::Updating)
    }

    pub fn is_unmounted(&self) -> bool {
        self.lifecycle == Lifecycle::Unmounted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, RenderCx};
    use crate::element::Element;
    use serde_json::{Value, json};

    struct Counter;
    impl Component for Counter {
        fn initial_state(&self, _props: &Props) -> Value {
            json!({ "count": 0 })
        }

        fn render(&self, _cx: &RenderCx<'_>) -> Element {
            Element::tag("span")
        }
    }

    fn counter() -> Instance {
        Instance::new(
            "a1".into(),
            ComponentRef::new(Counter),
            Props::default(),
            None,
            SlotPath::new(),
            0,
        )
    }

    #[test]
    fn test_constructor_runs_initial_state() {
        let inst = counter();
        assert_eq!(inst.state.get("count"), Some(&json!(0)));
        assert_eq!(inst.lifecycle, Lifecycle::Constructed);
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut inst = counter();
        assert!(inst.mark_updating());
        assert_eq!(inst.lifecycle, Lifecycle::Constructed);

        assert!(inst.mark_mounted());
        assert!(!inst.mark_mounted());

        assert!(inst.mark_updating());
        assert_eq!(inst.lifecycle, Lifecycle::Updating);
        inst.mark_rendered();
        assert_eq!(inst.lifecycle, Lifecycle::Mounted);

        assert!(inst.mark_unmounted());
        assert!(!inst.mark_unmounted());
        assert!(!inst.mark_updating());
    }

    #[test]
    fn test_unmount_without_mount_skips_hook() {
        let mut inst = counter();
        assert!(!inst.mark_unmounted());
        assert!(inst.is_unmounted());
    }
}

//! State handles.
//!
//! A [`StateHandle`] names one instance in one root. It holds the root
//! weakly: a handle kept by a background task after the root was unmounted
//! turns every update into a no-op.

use std::fmt;
use std::sync::{Arc, Weak};

use serde_json::Value;

use super::{InstanceId, State, into_state};
use crate::runtime::RootShared;

/// Queued state change, applied on the next flush of the owning root.
pub(crate) enum StateUpdate {
    Merge {
        instance: InstanceId,
        partial: State,
    },
    Apply {
        instance: InstanceId,
        f: Box<dyn FnOnce(&State) -> Value + Send>,
    },
}

impl StateUpdate {
    pub fn instance(&self) -> &str {
        match self {
            Self::Merge { instance, .. } | Self::Apply { instance, .. } => instance,
        }
    }

    /// Resolve to the partial object to merge, given the latest state.
    pub fn into_partial(self, current: &State) -> State {
        match self {
            Self::Merge { partial, .. } => partial,
            Self::Apply { f, .. } => into_state(f(current)),
        }
    }
}

impl fmt::Debug for StateUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Merge { instance, partial } => f
                .debug_struct("Merge")
                .field("instance", instance)
                .field("partial", partial)
                .finish(),
            Self::Apply { instance, .. } => {
                f.debug_struct("Apply").field("instance", instance).finish()
            }
        }
    }
}

/// Handle used to request state updates on one instance.
#[derive(Clone)]
pub struct StateHandle {
    root: Weak<RootShared>,
    instance: InstanceId,
}

impl StateHandle {
    pub(crate) fn new(root: &Arc<RootShared>, instance: impl Into<InstanceId>) -> Self {
        Self {
            root: Arc::downgrade(root),
            instance: instance.into(),
        }
    }

    /// Handle bound to nothing. Every update is dropped.
    pub(crate) fn detached(instance: impl Into<InstanceId>) -> Self {
        Self {
            root: Weak::new(),
            instance: instance.into(),
        }
    }

    /// Id of the target instance.
    pub fn id(&self) -> &str {
        &self.instance
    }

    /// Shallow-merge `partial` into the instance's state on the next flush.
    ///
    /// Non-object values are ignored.
    pub fn set_state(&self, partial: Value) {
        self.enqueue(StateUpdate::Merge {
            instance: self.instance.clone(),
            partial: into_state(partial),
        });
    }

    /// Compute a partial update from the latest state (including updates
    /// queued before this one) and merge it.
    pub fn update_state(&self, f: impl FnOnce(&State) -> Value + Send + 'static) {
        self.enqueue(StateUpdate::Apply {
            instance: self.instance.clone(),
            f: Box::new(f),
        });
    }

    fn enqueue(&self, update: StateUpdate) {
        match self.root.upgrade() {
            Some(root) => root.enqueue(update),
            None => crate::debug!("component"; "dropping update for detached instance {}", self.instance),
        }
    }
}

impl fmt::Debug for StateHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StateHandle").field(&self.instance).finish()
    }
}

//! Handler token table.
//!
//! Maps the opaque `data-on<event>` tokens of one root to their handlers.
//! Entries are revoked whenever the instance that emitted them re-renders,
//! so a token is valid for exactly one render pass.

use rustc_hash::FxHashMap;

use crate::component::{Handler, InstanceId};

#[derive(Debug, Clone)]
pub(crate) struct TokenEntry {
    pub owner: InstanceId,
    pub handler: Handler,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct TokenTable {
    entries: FxHashMap<String, TokenEntry>,
}

impl TokenTable {
    pub fn register(&mut self, token: String, owner: InstanceId, handler: Handler) {
        self.entries.insert(token, TokenEntry { owner, handler });
    }

    pub fn resolve(&self, token: &str) -> Option<&TokenEntry> {
        self.entries.get(token)
    }

    pub fn revoke<'a>(&mut self, tokens: impl IntoIterator<Item = &'a String>) {
        for token in tokens {
            self.entries.remove(token);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

use std::collections::HashMap;

use crate::item::ItemId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

/// Tracks the latest in-flight request per item so stale completions can be
/// told apart from current ones.
#[derive(Debug, Default)]
pub struct RequestLedger {
    next: u64,
    latest: HashMap<ItemId, RequestToken>,
}

impl RequestLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a token for `id`, superseding any earlier one.
    pub fn issue(&mut self, id: &ItemId) -> RequestToken {
        self.next += 1;
        let token = RequestToken(self.next);
        self.latest.insert(id.clone(), token);
        token
    }

    pub fn is_current(&self, id: &ItemId, token: RequestToken) -> bool {
        self.latest.get(id) == Some(&token)
    }

    /// Marks `token` finished. Returns false if it had been superseded.
    pub fn complete(&mut self, id: &ItemId, token: RequestToken) -> bool {
        if !self.is_current(id, token) {
            return false;
        }
        self.latest.remove(id);
        true
    }

    pub fn in_flight(&self, id: &ItemId) -> bool {
        self.latest.contains_key(id)
    }
}

use std::collections::HashMap;

use crate::item::ItemId;

/// Monotonic edit counter; bumped on every write to any entry.
pub type Revision = u64;

#[derive(Clone, Debug)]
struct Entry {
    text: String,
    revision: Revision,
}

/// Unsaved YAML text per tab. Absence of an entry means "no local edits".
#[derive(Clone, Debug, Default)]
pub struct EditBuffer {
    entries: HashMap<ItemId, Entry>,
    next_revision: Revision,
}

impl EditBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, id: &ItemId, text: impl Into<String>) -> Revision {
        self.next_revision += 1;
        let revision = self.next_revision;
        self.entries.insert(
            id.clone(),
            Entry {
                text: text.into(),
                revision,
            },
        );
        revision
    }

    pub fn get(&self, id: &ItemId) -> Option<&str> {
        self.entries.get(id).map(|e| e.text.as_str())
    }

    pub fn revision(&self, id: &ItemId) -> Option<Revision> {
        self.entries.get(id).map(|e| e.revision)
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn clear(&mut self, id: &ItemId) -> Option<String> {
        self.entries.remove(id).map(|e| e.text)
    }

    /// Clears the entry only if nothing was written to it since `revision`
    /// was observed. Returns whether the buffer now has no entry for `id`.
    pub fn clear_if_unchanged(&mut self, id: &ItemId, revision: Option<Revision>) -> bool {
        if self.revision(id) != revision {
            return false;
        }
        self.entries.remove(id);
        true
    }

    /// True iff an entry exists and differs from `canonical`.
    pub fn is_modified(&self, id: &ItemId, canonical: Option<&str>) -> bool {
        match self.get(id) {
            Some(text) => Some(text) != canonical,
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

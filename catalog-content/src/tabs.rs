use std::sync::{Arc, Mutex};

use futures::future::{self, BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{ContentError, Result};
use crate::item::ItemId;

/// Ordered open tabs plus the active one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabSet {
    pub ids: Vec<ItemId>,
    pub active: Option<ItemId>,
}

impl TabSet {
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Edit actions coming from the tab strip.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TabEdit {
    Add,
    Remove(ItemId),
}

/// Reply to a tab-open request. `yaml` carries the seed of a freshly
/// created tab.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenedTab {
    pub id: ItemId,
    pub yaml: Option<String>,
}

pub trait TabRegistry {
    /// Activates `id`, or creates a new tab seeded with `seed` when `id` is
    /// `None`.
    fn open(&self, id: Option<ItemId>, seed: Option<String>) -> BoxFuture<'_, Result<OpenedTab>>;

    fn close(&self, id: ItemId) -> BoxFuture<'_, Result<()>>;

    fn close_all(&self) -> BoxFuture<'_, Result<()>>;

    fn snapshot(&self) -> TabSet;
}

/// Process-local registry. Cloning shares the same tab set.
#[derive(Clone, Debug, Default)]
pub struct MemoryTabRegistry {
    tabs: Arc<Mutex<TabSet>>,
}

impl MemoryTabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_tabs<R>(&self, f: impl FnOnce(&mut TabSet) -> R) -> Result<R> {
        let mut tabs = self
            .tabs
            .lock()
            .map_err(|_| ContentError::Registry("poisoned tab lock".into()))?;
        Ok(f(&mut tabs))
    }
}

impl TabRegistry for MemoryTabRegistry {
    #[tracing::instrument(skip(self, seed))]
    fn open(&self, id: Option<ItemId>, seed: Option<String>) -> BoxFuture<'_, Result<OpenedTab>> {
        let opened = self.with_tabs(|tabs| {
            let (id, yaml) = match id {
                Some(id) => (id, None),
                None => (ItemId::new(Uuid::new_v4().to_string()), seed),
            };
            if !tabs.ids.contains(&id) {
                tabs.ids.push(id.clone());
            }
            tabs.active = Some(id.clone());
            debug!(tab = %id, open = tabs.ids.len(), "tab opened");
            OpenedTab { id, yaml }
        });
        future::ready(opened).boxed()
    }

    #[tracing::instrument(skip(self))]
    fn close(&self, id: ItemId) -> BoxFuture<'_, Result<()>> {
        let closed = self.with_tabs(|tabs| {
            let Some(index) = tabs.ids.iter().position(|t| *t == id) else {
                return;
            };
            tabs.ids.remove(index);
            if tabs.active.as_ref() == Some(&id) {
                let next = index.min(tabs.ids.len().saturating_sub(1));
                tabs.active = tabs.ids.get(next).cloned();
            }
        });
        future::ready(closed).boxed()
    }

    #[tracing::instrument(skip(self))]
    fn close_all(&self) -> BoxFuture<'_, Result<()>> {
        let closed = self.with_tabs(|tabs| {
            tabs.ids.clear();
            tabs.active = None;
        });
        future::ready(closed).boxed()
    }

    fn snapshot(&self) -> TabSet {
        self.with_tabs(|tabs| tabs.clone()).unwrap_or_default()
    }
}

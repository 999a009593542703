//! In-memory collaborators for unit tests.

use std::sync::{Arc, Mutex};

use futures::future::{self, BoxFuture, FutureExt};

use crate::editor::EditorWidget;
use crate::error::{ContentError, Result};
use crate::item::{CatalogFlags, Item, ItemId, ItemMap, ItemPayload};
use crate::positions::{CursorPosition, ScrollPosition};
use crate::store::ItemStore;

#[derive(Debug, Default)]
struct StoreState {
    items: ItemMap,
    calls: Vec<String>,
    conflict_with: Option<String>,
    fail_next: bool,
    flags: CatalogFlags,
}

#[derive(Clone, Debug, Default)]
pub struct MemoryItemStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, item: Item) {
        self.state.lock().unwrap().items.insert(item.id.clone(), item);
    }

    /// The next put reports a conflict and moves the canonical text to `yaml`.
    pub fn conflict_next(&self, yaml: &str) {
        self.state.lock().unwrap().conflict_with = Some(yaml.to_string());
    }

    pub fn fail_next(&self) {
        self.state.lock().unwrap().fail_next = true;
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    fn run(
        &self,
        call: String,
        f: impl FnOnce(&mut StoreState) -> Result<ItemPayload>,
    ) -> BoxFuture<'_, Result<ItemPayload>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        let result = if std::mem::take(&mut state.fail_next) {
            Err(ContentError::Registry("injected failure".into()))
        } else {
            f(&mut state)
        };
        future::ready(result).boxed()
    }
}

impl ItemStore for MemoryItemStore {
    fn get(&self, id: ItemId) -> BoxFuture<'_, Result<ItemPayload>> {
        self.run(format!("get {id}"), |state| {
            let item = state
                .items
                .get(&id)
                .cloned()
                .ok_or_else(|| ContentError::UnknownItem(id.clone()))?;
            Ok(ItemPayload::item(item))
        })
    }

    fn post(&self, id: ItemId, yaml: String) -> BoxFuture<'_, Result<ItemPayload>> {
        self.run(format!("post {id}"), |state| {
            let item = Item::new(id.clone(), "v1/ConfigMap", yaml);
            state.items.insert(id, item.clone());
            Ok(ItemPayload::item(item))
        })
    }

    fn put(&self, id: ItemId, yaml: String) -> BoxFuture<'_, Result<ItemPayload>> {
        self.run(format!("put {id}"), |state| {
            let conflict = state.conflict_with.take();
            let item = state
                .items
                .get_mut(&id)
                .ok_or_else(|| ContentError::UnknownItem(id.clone()))?;
            match conflict {
                Some(theirs) => {
                    item.yaml = theirs;
                    Ok(ItemPayload::conflict(Some(item.clone())))
                }
                None => {
                    item.yaml = yaml;
                    Ok(ItemPayload::item(item.clone()))
                }
            }
        })
    }

    fn delete(&self, id: ItemId) -> BoxFuture<'_, Result<ItemPayload>> {
        self.run(format!("delete {id}"), |state| {
            state.items.remove(&id);
            Ok(ItemPayload::gone())
        })
    }

    fn snapshot(&self) -> ItemMap {
        self.state.lock().unwrap().items.clone()
    }

    fn flags(&self) -> CatalogFlags {
        self.state.lock().unwrap().flags
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum EditorCall {
    Focus,
    Cursor(CursorPosition),
    Scroll(ScrollPosition),
}

#[derive(Clone, Debug, Default)]
pub struct RecordingEditor {
    calls: Arc<Mutex<Vec<EditorCall>>>,
}

impl RecordingEditor {
    pub fn calls(&self) -> Vec<EditorCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl EditorWidget for RecordingEditor {
    fn set_focus(&mut self) {
        self.calls.lock().unwrap().push(EditorCall::Focus);
    }

    fn set_cursor_position(&mut self, pos: CursorPosition) {
        self.calls.lock().unwrap().push(EditorCall::Cursor(pos));
    }

    fn set_scroll_position(&mut self, pos: ScrollPosition) {
        self.calls.lock().unwrap().push(EditorCall::Scroll(pos));
    }
}

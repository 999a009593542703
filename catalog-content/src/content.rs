//! The tabbed YAML content pane.
//!
//! `Content` reconciles three sources of state: the item map and tab set
//! pushed in as `Props`, the locally edited text held in the `EditBuffer`,
//! and the editor-local cursor/scroll positions held in the `PositionCache`.
//! Only the first two decide what gets rendered.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::buffer::{EditBuffer, Revision};
use crate::config::{ContentConfig, DeletePolicy, Shortcut};
use crate::editor::{EditorEvent, EditorProps, EditorWidget};
use crate::error::Result;
use crate::item::{CatalogFlags, Item, ItemId, ItemMap, ItemPayload};
use crate::positions::{CursorPosition, PositionCache, ScrollPosition};
use crate::requests::{RequestLedger, RequestToken};
use crate::store::ItemStore;
use crate::tab_strip::{render_tabs, TabDescriptor};
use crate::tabs::{TabEdit, TabRegistry, TabSet};

/// Snapshot of externally owned state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Props {
    pub items: ItemMap,
    pub tabs: TabSet,
    pub flags: CatalogFlags,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ButtonStates {
    pub open_new: bool,
    pub close_all: bool,
    pub reload: bool,
    pub save: bool,
    pub delete: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ContentView {
    pub tabs: Vec<TabDescriptor>,
    pub active: Option<ItemId>,
    /// `None` when the editor pane is hidden.
    pub editor: Option<EditorProps>,
    pub buttons: ButtonStates,
    /// Keyboard shortcut legend, shown only while the editor is hidden.
    pub legend: Option<Vec<Shortcut>>,
}

/// An issued reload/save/delete, fenced by a token and the buffer revision
/// observed when it was issued.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingRequest {
    pub id: ItemId,
    token: RequestToken,
    revision: Option<Revision>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveMethod {
    Post,
    Put,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingSave {
    pub request: PendingRequest,
    pub method: SaveMethod,
    pub yaml: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// Canonical record changed concurrently; the buffer is left as sent.
    Conflict,
    /// A newer request for the same tab was issued meanwhile.
    Superseded,
    /// Nothing to save.
    Skipped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    Cleared,
    /// Buffer kept, either by policy or because it was edited in flight.
    Kept,
    Superseded,
    Skipped,
}

#[derive(Clone, Copy, Debug, Default)]
struct PendingRestore {
    cursor: Option<CursorPosition>,
    scroll: Option<ScrollPosition>,
}

pub struct Content<S, R> {
    store: S,
    registry: R,
    config: ContentConfig,
    props: Props,
    buffer: EditBuffer,
    positions: PositionCache,
    requests: RequestLedger,
    editor: Option<Box<dyn EditorWidget>>,
    pending_restore: Option<PendingRestore>,
    view: Option<ContentView>,
    dirty: bool,
}

impl<S: ItemStore, R: TabRegistry> Content<S, R> {
    pub fn new(store: S, registry: R, config: ContentConfig) -> Self {
        let mut content = Self {
            store,
            registry,
            config,
            props: Props::default(),
            buffer: EditBuffer::new(),
            positions: PositionCache::new(),
            requests: RequestLedger::new(),
            editor: None,
            pending_restore: None,
            view: None,
            dirty: true,
        };
        content.sync();
        content
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn buffer(&self) -> &EditBuffer {
        &self.buffer
    }

    pub fn positions(&self) -> &PositionCache {
        &self.positions
    }

    pub fn config(&self) -> &ContentConfig {
        &self.config
    }

    /// Accepts new props. Returns whether the pane should re-render.
    pub fn receive(&mut self, props: Props) -> bool {
        if props != self.props {
            self.props = props;
            self.dirty = true;
        }
        self.should_render()
    }

    /// Pulls fresh props from the collaborators.
    pub fn sync(&mut self) -> bool {
        let props = Props {
            items: self.store.snapshot(),
            tabs: self.registry.snapshot(),
            flags: self.store.flags(),
        };
        self.receive(props)
    }

    /// Rendering is suppressed while the catalog is in its loading stage.
    pub fn should_render(&self) -> bool {
        !self.props.flags.loading_stage
    }

    /// Returns the committed view, recomputing it only when state changed
    /// and the render gate is open. The first render always happens.
    pub fn render(&mut self) -> &ContentView {
        let stale = self.dirty && self.should_render();
        if self.view.is_none() || stale {
            self.view = Some(self.compute_view());
            self.dirty = false;
        }
        self.view.get_or_insert_with(ContentView::default)
    }

    /// Runs after the editor has mounted and laid out for the current
    /// render; applies any cursor/scroll restore queued by `open`.
    pub fn after_render(&mut self) {
        let Some(restore) = self.pending_restore.take() else {
            return;
        };
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        if let Some(cursor) = restore.cursor {
            editor.set_cursor_position(cursor);
        }
        if let Some(scroll) = restore.scroll {
            editor.set_scroll_position(scroll);
        }
    }

    pub fn attach_editor(&mut self, editor: Box<dyn EditorWidget>) {
        self.editor = Some(editor);
    }

    pub fn focus_editor(&mut self) {
        if let Some(editor) = self.editor.as_mut() {
            editor.set_focus();
        }
    }

    pub fn active_id(&self) -> Option<&ItemId> {
        self.props.tabs.active.as_ref()
    }

    fn active_item(&self) -> Option<&Item> {
        self.active_id().and_then(|id| self.props.items.get(id))
    }

    fn canonical(&self, id: &ItemId) -> Option<&str> {
        self.props.items.get(id).map(|i| i.yaml.as_str())
    }

    /// Buffer text if present, else canonical text.
    pub fn displayed_text(&self, id: &ItemId) -> Option<&str> {
        self.buffer.get(id).or_else(|| self.canonical(id))
    }

    pub fn is_modified(&self, id: &ItemId) -> bool {
        self.buffer.is_modified(id, self.canonical(id))
    }

    pub fn buttons(&self) -> ButtonStates {
        let item = self.active_item();
        let loading = item.is_some_and(|i| i.loading);
        let modified = self.active_id().is_some_and(|id| self.is_modified(id));
        ButtonStates {
            open_new: true,
            close_all: !self.props.tabs.is_empty(),
            reload: item.is_some() && !loading,
            save: modified && !loading,
            delete: item.is_some() && !loading,
        }
    }

    fn compute_view(&self) -> ContentView {
        let ids = &self.props.tabs.ids;
        let hidden = ids.is_empty();
        let active = self.active_id().cloned();

        let editor = (!hidden).then(|| EditorProps {
            original: active
                .as_ref()
                .and_then(|id| self.canonical(id))
                .map(String::from),
            value: active
                .as_ref()
                .and_then(|id| self.displayed_text(id))
                .map(String::from),
        });

        ContentView {
            tabs: render_tabs(ids, &self.props.items, &self.buffer, &self.config),
            active,
            editor,
            buttons: self.buttons(),
            legend: hidden.then(|| self.config.shortcuts.clone()),
        }
    }

    // editor events
    // -------------

    pub fn on_value(&mut self, yaml: impl Into<String>) {
        let Some(id) = self.props.tabs.active.clone() else {
            return;
        };
        self.buffer.set(&id, yaml);
        self.dirty = true;
    }

    pub fn on_cursor(&mut self, pos: CursorPosition) {
        if let Some(id) = self.props.tabs.active.as_ref() {
            self.positions.set_cursor(id, pos);
        }
    }

    pub fn on_scroll(&mut self, pos: ScrollPosition) {
        if let Some(id) = self.props.tabs.active.as_ref() {
            self.positions.set_scroll(id, pos);
        }
    }

    pub async fn on_editor_event(&mut self, event: EditorEvent) -> Result<()> {
        match event {
            EditorEvent::Value(yaml) => self.on_value(yaml),
            EditorEvent::Cursor(pos) => self.on_cursor(pos),
            EditorEvent::Scroll(pos) => self.on_scroll(pos),
            EditorEvent::Save => {
                self.save().await?;
            }
            EditorEvent::Close => self.close_active().await?,
            EditorEvent::Reload => {
                self.reload().await?;
            }
        }
        Ok(())
    }

    // tab lifecycle
    // -------------

    pub async fn on_tab_edit(&mut self, edit: TabEdit) -> Result<()> {
        match edit {
            TabEdit::Add => self.open_new().await,
            TabEdit::Remove(id) => self.close(id).await,
        }
    }

    /// Activates `id`; its cached cursor/scroll is applied on the next
    /// `after_render`.
    #[tracing::instrument(skip(self))]
    pub async fn open(&mut self, id: ItemId) -> Result<()> {
        let restore = PendingRestore {
            cursor: self.positions.cursor(&id),
            scroll: self.positions.scroll(&id),
        };
        self.registry.open(Some(id), None).await?;
        if restore.cursor.is_some() || restore.scroll.is_some() {
            self.pending_restore = Some(restore);
        }
        self.sync();
        Ok(())
    }

    /// Opens a new tab seeded with the active tab's pending or canonical text.
    #[tracing::instrument(skip(self))]
    pub async fn open_new(&mut self) -> Result<()> {
        let seed = self
            .active_id()
            .and_then(|id| self.displayed_text(id))
            .map(String::from);
        let opened = self.registry.open(None, seed).await?;
        if let Some(yaml) = opened.yaml {
            self.buffer.set(&opened.id, yaml);
        }
        debug!(tab = %opened.id, "new tab");
        self.sync();
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn close(&mut self, id: ItemId) -> Result<()> {
        self.registry.close(id).await?;
        self.sync();
        Ok(())
    }

    pub async fn close_active(&mut self) -> Result<()> {
        match self.props.tabs.active.clone() {
            Some(id) => self.close(id).await,
            None => Ok(()),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn close_all(&mut self) -> Result<()> {
        self.registry.close_all().await?;
        self.sync();
        Ok(())
    }

    // persistence
    // -----------

    fn issue(&mut self, id: ItemId) -> PendingRequest {
        let token = self.requests.issue(&id);
        let revision = self.buffer.revision(&id);
        PendingRequest {
            id,
            token,
            revision,
        }
    }

    /// Clears the buffer for a finished request unless it was superseded or
    /// edited while in flight.
    fn settle(&mut self, request: &PendingRequest, clear: bool) -> Completion {
        if !self.requests.complete(&request.id, request.token) {
            debug!(tab = %request.id, "stale completion ignored");
            return Completion::Superseded;
        }
        if !clear {
            return Completion::Kept;
        }
        self.dirty = true;
        if self.buffer.clear_if_unchanged(&request.id, request.revision) {
            Completion::Cleared
        } else {
            debug!(tab = %request.id, "buffer edited in flight, keeping newer text");
            Completion::Kept
        }
    }

    pub fn begin_reload(&mut self) -> Option<PendingRequest> {
        if !self.buttons().reload {
            return None;
        }
        let id = self.active_id()?.clone();
        Some(self.issue(id))
    }

    /// Reload is "discard and refetch": the buffer is cleared on completion.
    pub fn finish_reload(&mut self, request: &PendingRequest) -> Completion {
        self.settle(request, true)
    }

    #[tracing::instrument(skip(self))]
    pub async fn reload(&mut self) -> Result<Completion> {
        let Some(request) = self.begin_reload() else {
            return Ok(Completion::Skipped);
        };
        let fetched = self.store.get(request.id.clone()).await;
        let completion = self.finish_reload(&request);
        self.sync();
        if let Err(e) = &fetched {
            warn!(tab = %request.id, "reload failed: {e}");
        }
        fetched.map(|_| completion)
    }

    pub fn begin_save(&mut self) -> Option<PendingSave> {
        if !self.buttons().save {
            return None;
        }
        let id = self.active_id()?.clone();
        let yaml = self.buffer.get(&id)?.to_string();
        let method = if self.props.items.contains_key(&id) {
            SaveMethod::Put
        } else {
            SaveMethod::Post
        };
        Some(PendingSave {
            request: self.issue(id),
            method,
            yaml,
        })
    }

    pub fn finish_save(&mut self, pending: &PendingSave, payload: &ItemPayload) -> SaveOutcome {
        if payload.conflict {
            if !self.requests.complete(&pending.request.id, pending.request.token) {
                debug!(tab = %pending.request.id, "stale conflict ignored");
                return SaveOutcome::Superseded;
            }
            info!(tab = %pending.request.id, "save conflicted, keeping local text");
            return SaveOutcome::Conflict;
        }
        match self.settle(&pending.request, true) {
            Completion::Superseded => SaveOutcome::Superseded,
            _ => SaveOutcome::Saved,
        }
    }

    /// Drops the fence for a request whose round-trip failed outright.
    pub fn abandon(&mut self, request: &PendingRequest) {
        self.requests.complete(&request.id, request.token);
    }

    #[tracing::instrument(skip(self))]
    pub async fn save(&mut self) -> Result<SaveOutcome> {
        let Some(pending) = self.begin_save() else {
            return Ok(SaveOutcome::Skipped);
        };
        let id = pending.request.id.clone();
        let sent = match pending.method {
            SaveMethod::Post => self.store.post(id, pending.yaml.clone()).await,
            SaveMethod::Put => self.store.put(id, pending.yaml.clone()).await,
        };
        let payload = match sent {
            Ok(payload) => payload,
            Err(e) => {
                self.abandon(&pending.request);
                return Err(e);
            }
        };
        let outcome = self.finish_save(&pending, &payload);
        self.sync();
        Ok(outcome)
    }

    pub fn begin_delete(&mut self) -> Option<PendingRequest> {
        if !self.buttons().delete {
            return None;
        }
        let id = self.active_id()?.clone();
        Some(self.issue(id))
    }

    pub fn finish_delete(&mut self, request: &PendingRequest, succeeded: bool) -> Completion {
        let clear = match self.config.delete_policy {
            DeletePolicy::ClearAlways => true,
            DeletePolicy::KeepOnFailure => succeeded,
        };
        self.settle(request, clear)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&mut self) -> Result<Completion> {
        let Some(request) = self.begin_delete() else {
            return Ok(Completion::Skipped);
        };
        let deleted = self.store.delete(request.id.clone()).await;
        let completion = self.finish_delete(&request, deleted.is_ok());
        self.sync();
        deleted.map(|_| completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{EditorCall, MemoryItemStore, RecordingEditor};
    use crate::tabs::MemoryTabRegistry;

    type TestContent = Content<MemoryItemStore, MemoryTabRegistry>;

    fn content_with(items: &[(&str, &str)]) -> TestContent {
        let store = MemoryItemStore::new();
        for (id, yaml) in items {
            store.insert(
                Item::new(*id, "v1/ConfigMap", *yaml)
                    .with_namespace("default")
                    .with_name(*id),
            );
        }
        Content::new(store, MemoryTabRegistry::new(), ContentConfig::default())
    }

    fn id(s: &str) -> ItemId {
        ItemId::from(s)
    }

    #[tokio::test]
    async fn edit_then_save_clears_modified_flag() {
        let mut content = content_with(&[("x", "a: 1")]);
        content.open(id("x")).await.unwrap();
        assert!(!content.is_modified(&id("x")));

        content.on_value("a: 2");
        assert!(content.is_modified(&id("x")));
        assert!(content.render().tabs[0].modified);
        assert!(content.render().buttons.save);

        let outcome = content.save().await.unwrap();
        assert_eq!(outcome, SaveOutcome::Saved);
        assert!(!content.buffer().contains(&id("x")));
        assert!(!content.is_modified(&id("x")));
        assert_eq!(content.displayed_text(&id("x")), Some("a: 2"));

        let view = content.render();
        assert!(!view.tabs[0].modified);
        assert_eq!(
            view.editor,
            Some(EditorProps {
                original: Some("a: 2".into()),
                value: Some("a: 2".into()),
            })
        );
    }

    #[tokio::test]
    async fn conflicting_save_keeps_buffer() {
        let mut content = content_with(&[("x", "a: 1")]);
        content.open(id("x")).await.unwrap();
        content.on_value("a: 2");
        content.store().conflict_next("a: 9");

        let outcome = content.save().await.unwrap();

        assert_eq!(outcome, SaveOutcome::Conflict);
        assert_eq!(content.buffer().get(&id("x")), Some("a: 2"));
        assert_eq!(content.render().editor.as_ref().unwrap().original.as_deref(), Some("a: 9"));
        assert!(content.is_modified(&id("x")));
    }

    #[tokio::test]
    async fn save_without_item_posts() {
        let mut content = content_with(&[]);
        content.open_new().await.unwrap();
        assert!(!content.buttons().save);

        content.on_value("kind: ConfigMap");
        let new_id = content.active_id().cloned().unwrap();
        assert!(content.render().tabs[0].detached);

        assert_eq!(content.save().await.unwrap(), SaveOutcome::Saved);
        assert_eq!(content.store().calls(), vec![format!("post {new_id}")]);
        assert!(!content.render().tabs[0].detached);
    }

    #[tokio::test]
    async fn failed_save_leaves_buffer_and_releases_fence() {
        let mut content = content_with(&[("x", "a: 1")]);
        content.open(id("x")).await.unwrap();
        content.on_value("a: 2");
        content.store().fail_next();

        assert!(content.save().await.is_err());
        assert_eq!(content.buffer().get(&id("x")), Some("a: 2"));
        assert_eq!(content.save().await.unwrap(), SaveOutcome::Saved);
    }

    #[tokio::test]
    async fn reload_and_delete_clear_buffer() {
        let mut content = content_with(&[("x", "a: 1"), ("y", "b: 1")]);
        content.open(id("x")).await.unwrap();
        content.on_value("a: 2");
        assert_eq!(content.reload().await.unwrap(), Completion::Cleared);
        assert!(!content.buffer().contains(&id("x")));
        assert_eq!(content.displayed_text(&id("x")), Some("a: 1"));

        content.open(id("y")).await.unwrap();
        content.on_value("b: 2");
        assert_eq!(content.delete().await.unwrap(), Completion::Cleared);
        assert!(!content.buffer().contains(&id("y")));
        assert_eq!(content.displayed_text(&id("y")), None);

        let view = content.render();
        assert!(view.tabs[1].detached);
        assert!(!view.buttons.reload);
        assert!(!view.buttons.delete);
    }

    #[tokio::test]
    async fn failed_delete_follows_policy() {
        let mut content = content_with(&[("x", "a: 1")]);
        content.open(id("x")).await.unwrap();
        content.on_value("a: 2");
        content.store().fail_next();
        assert!(content.delete().await.is_err());
        assert!(!content.buffer().contains(&id("x")));

        let config = ContentConfig {
            delete_policy: DeletePolicy::KeepOnFailure,
            ..ContentConfig::default()
        };
        let store = MemoryItemStore::new();
        store.insert(Item::new("x", "v1/ConfigMap", "a: 1"));
        let mut content = Content::new(store, MemoryTabRegistry::new(), config);
        content.open(id("x")).await.unwrap();
        content.on_value("a: 2");
        content.store().fail_next();
        assert!(content.delete().await.is_err());
        assert_eq!(content.buffer().get(&id("x")), Some("a: 2"));
    }

    #[tokio::test]
    async fn edits_are_isolated_per_tab() {
        let mut content = content_with(&[("x", "a: 1"), ("y", "b: 1")]);
        content.open(id("y")).await.unwrap();
        content.on_value("b: 2");
        content.open(id("x")).await.unwrap();
        content.on_value("a: 2");
        content.on_value("a: 3");

        assert_eq!(content.buffer().get(&id("y")), Some("b: 2"));
        assert_eq!(content.buffer().get(&id("x")), Some("a: 3"));

        content.save().await.unwrap();
        assert!(content.is_modified(&id("y")));
        assert!(!content.is_modified(&id("x")));
    }

    #[tokio::test]
    async fn close_all_hides_editor_and_shows_legend() {
        let mut content = content_with(&[("x", "a: 1"), ("y", "b: 1")]);
        content.open(id("x")).await.unwrap();
        content.open(id("y")).await.unwrap();
        assert!(content.render().legend.is_none());

        content.close_all().await.unwrap();

        let view = content.render();
        assert!(view.tabs.is_empty());
        assert!(view.editor.is_none());
        assert!(!view.buttons.close_all);
        let legend = view.legend.as_ref().unwrap();
        assert_eq!(
            legend.iter().map(|s| s.action.as_str()).collect::<Vec<_>>(),
            vec!["Tab.Save", "Tab.Close", "Tab.Reload"]
        );
    }

    #[tokio::test]
    async fn new_tab_is_seeded_with_pending_text() {
        let mut content = content_with(&[("a", "a: 1")]);
        content.open(id("a")).await.unwrap();
        content.on_value("a: 2");

        content.on_tab_edit(TabEdit::Add).await.unwrap();

        let new_id = content.active_id().cloned().unwrap();
        assert_ne!(new_id, id("a"));
        assert_eq!(content.buffer().get(&new_id), Some("a: 2"));
        assert_eq!(content.buffer().get(&id("a")), Some("a: 2"));
        assert_eq!(content.render().tabs.len(), 2);
    }

    #[tokio::test]
    async fn new_tab_falls_back_to_canonical_text() {
        let mut content = content_with(&[("a", "a: 1")]);
        content.open(id("a")).await.unwrap();
        content.open_new().await.unwrap();

        let new_id = content.active_id().cloned().unwrap();
        assert_eq!(content.buffer().get(&new_id), Some("a: 1"));
    }

    #[tokio::test]
    async fn closing_a_tab_keeps_its_buffer() {
        let mut content = content_with(&[("x", "a: 1")]);
        content.open(id("x")).await.unwrap();
        content.on_value("a: 2");

        content.on_tab_edit(TabEdit::Remove(id("x"))).await.unwrap();
        assert!(content.props().tabs.is_empty());
        assert_eq!(content.buffer().get(&id("x")), Some("a: 2"));

        content.open(id("x")).await.unwrap();
        assert_eq!(content.displayed_text(&id("x")), Some("a: 2"));
    }

    #[tokio::test]
    async fn value_without_active_tab_is_ignored() {
        let mut content = content_with(&[("x", "a: 1")]);
        content.on_value("a: 2");
        content.on_cursor(CursorPosition { line_number: 3, column: 1 });
        assert!(content.buffer().is_empty());
        assert_eq!(content.positions().cursor(&id("x")), None);
    }

    #[tokio::test]
    async fn positions_restore_after_render() {
        let mut content = content_with(&[("x", "a: 1"), ("y", "b: 1")]);
        let editor = RecordingEditor::default();
        content.attach_editor(Box::new(editor.clone()));

        content.open(id("x")).await.unwrap();
        let cursor = CursorPosition { line_number: 4, column: 2 };
        let scroll = ScrollPosition { scroll_top: 120.0, scroll_left: 0.0 };
        content.on_cursor(cursor);
        content.on_scroll(scroll);

        content.open(id("y")).await.unwrap();
        content.after_render();
        assert!(editor.calls().is_empty());

        content.open(id("x")).await.unwrap();
        assert!(editor.calls().is_empty());
        content.render();
        content.after_render();
        assert_eq!(
            editor.calls(),
            vec![EditorCall::Cursor(cursor), EditorCall::Scroll(scroll)]
        );

        content.after_render();
        assert_eq!(editor.calls().len(), 2);
    }

    #[tokio::test]
    async fn position_writes_do_not_dirty_the_view() {
        let mut content = content_with(&[("x", "a: 1")]);
        content.open(id("x")).await.unwrap();
        let before = content.render().clone();
        content.dirty = false;

        content.on_cursor(CursorPosition { line_number: 2, column: 5 });
        content.on_scroll(ScrollPosition { scroll_top: 8.0, scroll_left: 1.0 });

        assert!(!content.dirty);
        assert_eq!(*content.render(), before);
    }

    #[tokio::test]
    async fn loading_stage_gates_rendering() {
        let mut content = content_with(&[("x", "a: 1")]);
        content.open(id("x")).await.unwrap();
        let before = content.render().clone();

        let mut props = content.props().clone();
        props.flags.loading_stage = true;
        assert!(!content.receive(props.clone()));
        content.on_value("a: 2");
        assert_eq!(*content.render(), before);

        props.flags.loading_stage = false;
        assert!(content.receive(props));
        assert!(content.render().tabs[0].modified);
    }

    #[tokio::test]
    async fn editor_events_dispatch_actions() {
        let mut content = content_with(&[("x", "a: 1")]);
        content.open(id("x")).await.unwrap();

        content
            .on_editor_event(EditorEvent::Value("a: 2".into()))
            .await
            .unwrap();
        content.on_editor_event(EditorEvent::Save).await.unwrap();
        assert_eq!(content.store().calls(), vec!["put x".to_string()]);

        content.on_editor_event(EditorEvent::Reload).await.unwrap();
        assert_eq!(content.store().calls().last().map(String::as_str), Some("get x"));

        content.on_editor_event(EditorEvent::Close).await.unwrap();
        assert!(content.props().tabs.is_empty());
    }

    #[tokio::test]
    async fn loading_item_disables_actions() {
        let mut content = content_with(&[("x", "a: 1")]);
        content.open(id("x")).await.unwrap();
        content.on_value("a: 2");

        let mut props = content.props().clone();
        if let Some(item) = props.items.get_mut(&id("x")) {
            item.loading = true;
        }
        content.receive(props);

        let buttons = content.buttons();
        assert!(!buttons.reload && !buttons.save && !buttons.delete);
        assert_eq!(content.save().await.unwrap(), SaveOutcome::Skipped);
        assert_eq!(content.reload().await.unwrap(), Completion::Skipped);
        assert!(content.store().calls().is_empty());
    }

    #[tokio::test]
    async fn stale_reload_does_not_clobber_newer_edits() {
        let mut content = content_with(&[("x", "a: 1")]);
        content.open(id("x")).await.unwrap();
        content.on_value("a: 2");

        let first = content.begin_reload().unwrap();
        let second = content.begin_reload().unwrap();
        assert_eq!(content.finish_reload(&first), Completion::Superseded);
        assert_eq!(content.buffer().get(&id("x")), Some("a: 2"));

        content.on_value("a: 3");
        assert_eq!(content.finish_reload(&second), Completion::Kept);
        assert_eq!(content.buffer().get(&id("x")), Some("a: 3"));
    }

    #[tokio::test]
    async fn superseded_save_leaves_buffer_untouched() {
        let mut content = content_with(&[("x", "a: 1")]);
        content.open(id("x")).await.unwrap();
        content.on_value("a: 2");

        let save = content.begin_save().unwrap();
        let _reload = content.begin_reload().unwrap();

        let outcome = content.finish_save(&save, &ItemPayload::default());
        assert_eq!(outcome, SaveOutcome::Superseded);
        assert_eq!(content.buffer().get(&id("x")), Some("a: 2"));
    }

    #[tokio::test]
    async fn superseded_conflict_reports_superseded() {
        let mut content = content_with(&[("x", "a: 1")]);
        content.open(id("x")).await.unwrap();
        content.on_value("a: 2");

        let first = content.begin_save().unwrap();
        let second = content.begin_save().unwrap();

        let conflict = ItemPayload::conflict(None);
        assert_eq!(content.finish_save(&first, &conflict), SaveOutcome::Superseded);
        assert_eq!(content.finish_save(&second, &conflict), SaveOutcome::Conflict);
        assert_eq!(content.buffer().get(&id("x")), Some("a: 2"));
    }

    #[tokio::test]
    async fn stale_delete_completion_is_ignored() {
        let mut content = content_with(&[("x", "a: 1")]);
        content.open(id("x")).await.unwrap();
        content.on_value("a: 2");

        let first = content.begin_delete().unwrap();
        let second = content.begin_delete().unwrap();

        assert_eq!(content.finish_delete(&first, true), Completion::Superseded);
        assert_eq!(content.buffer().get(&id("x")), Some("a: 2"));
        assert_eq!(content.finish_delete(&second, true), Completion::Cleared);
        assert!(!content.buffer().contains(&id("x")));
    }

    #[tokio::test]
    async fn unchanged_props_keep_view_clean() {
        let mut content = content_with(&[("x", "a: 1")]);
        content.open(id("x")).await.unwrap();
        content.render();
        assert!(!content.dirty);

        content.sync();
        assert!(!content.dirty);

        let mut props = content.props().clone();
        if let Some(item) = props.items.get_mut(&id("x")) {
            item.yaml = "a: 5".into();
        }
        content.receive(props);
        assert!(content.dirty);
        assert_eq!(
            content.render().editor.as_ref().unwrap().original.as_deref(),
            Some("a: 5")
        );
    }

    #[tokio::test]
    async fn save_completion_keeps_text_typed_in_flight() {
        let mut content = content_with(&[("x", "a: 1")]);
        content.open(id("x")).await.unwrap();
        content.on_value("a: 2");

        let pending = content.begin_save().unwrap();
        assert_eq!(pending.method, SaveMethod::Put);
        assert_eq!(pending.yaml, "a: 2");
        content.on_value("a: 3");

        let outcome = content.finish_save(&pending, &ItemPayload::default());
        assert_eq!(outcome, SaveOutcome::Saved);
        assert_eq!(content.buffer().get(&id("x")), Some("a: 3"));
    }
}

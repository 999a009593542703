//! View-model for a tabbed YAML editing pane over a resource catalog.

pub mod buffer;
pub mod config;
pub mod content;
pub mod editor;
pub mod error;
pub mod item;
pub mod positions;
pub mod requests;
pub mod store;
pub mod tab_strip;
pub mod tabs;

#[cfg(test)]
mod testing;

pub use buffer::EditBuffer;
pub use config::{ContentConfig, DeletePolicy, Shortcut};
pub use content::{ButtonStates, Completion, Content, ContentView, Props, SaveOutcome};
pub use editor::{EditorEvent, EditorProps, EditorWidget};
pub use error::{ContentError, Result};
pub use item::{CatalogFlags, Item, ItemId, ItemMap, ItemPayload};
pub use positions::{CursorPosition, PositionCache, ScrollPosition};
pub use store::{ItemStore, KubeItemStore};
pub use tab_strip::{render_tabs, TabDescriptor};
pub use tabs::{MemoryTabRegistry, OpenedTab, TabEdit, TabRegistry, TabSet};

use serde::Serialize;

use crate::positions::{CursorPosition, ScrollPosition};

/// Inputs handed to the embedded editor on each render.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EditorProps {
    /// Canonical text, used by the editor for diffing.
    pub original: Option<String>,
    /// Effective displayed text.
    pub value: Option<String>,
}

/// Events emitted by the editor widget.
#[derive(Clone, Debug, PartialEq)]
pub enum EditorEvent {
    Value(String),
    Cursor(CursorPosition),
    Scroll(ScrollPosition),
    Save,
    Close,
    Reload,
}

/// Imperative handle on the editor. Position is not a controlled input of
/// the widget, so it is pushed through here instead of through `EditorProps`.
pub trait EditorWidget {
    fn set_focus(&mut self);

    fn set_cursor_position(&mut self, pos: CursorPosition);

    fn set_scroll_position(&mut self, pos: ScrollPosition);
}

//! Editor commands queued for the Lua side, which owns the actual buffer
//! and window and drains the queue after each render.

use std::sync::mpsc::{channel, Receiver, Sender};

use catalog_content::{CursorPosition, EditorWidget, ScrollPosition};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum EditorCommand {
    Focus,
    Cursor(CursorPosition),
    Scroll(ScrollPosition),
}

pub struct QueuedEditor {
    tx: Sender<EditorCommand>,
}

impl EditorWidget for QueuedEditor {
    fn set_focus(&mut self) {
        let _ = self.tx.send(EditorCommand::Focus);
    }

    fn set_cursor_position(&mut self, pos: CursorPosition) {
        let _ = self.tx.send(EditorCommand::Cursor(pos));
    }

    fn set_scroll_position(&mut self, pos: ScrollPosition) {
        let _ = self.tx.send(EditorCommand::Scroll(pos));
    }
}

pub fn editor_queue() -> (QueuedEditor, Receiver<EditorCommand>) {
    let (tx, rx) = channel();
    (QueuedEditor { tx }, rx)
}

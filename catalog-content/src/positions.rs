//! Per-tab cursor and scroll coordinates.
//!
//! This store is a side channel: it is read only by imperative editor calls
//! and never participates in deciding whether the view re-renders.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::item::ItemId;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorPosition {
    pub line_number: u32,
    pub column: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrollPosition {
    pub scroll_top: f64,
    pub scroll_left: f64,
}

#[derive(Clone, Debug, Default)]
pub struct PositionCache {
    cursors: HashMap<ItemId, CursorPosition>,
    scrolls: HashMap<ItemId, ScrollPosition>,
}

impl PositionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_cursor(&mut self, id: &ItemId, pos: CursorPosition) {
        self.cursors.insert(id.clone(), pos);
    }

    pub fn set_scroll(&mut self, id: &ItemId, pos: ScrollPosition) {
        self.scrolls.insert(id.clone(), pos);
    }

    pub fn cursor(&self, id: &ItemId) -> Option<CursorPosition> {
        self.cursors.get(id).copied()
    }

    pub fn scroll(&self, id: &ItemId) -> Option<ScrollPosition> {
        self.scrolls.get(id).copied()
    }
}

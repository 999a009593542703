use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier shared by an item and the tab that shows it.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A remote resource record as last reported by the item store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub namespace: Option<String>,
    pub name: Option<String>,
    pub loading: bool,
    /// Canonical YAML text.
    pub yaml: String,
    /// Resource kind identifier, e.g. `apps/v1/Deployment`.
    pub resource_id: String,
}

impl Item {
    pub fn new(id: impl Into<ItemId>, resource_id: impl Into<String>, yaml: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            namespace: None,
            name: None,
            loading: false,
            yaml: yaml.into(),
            resource_id: resource_id.into(),
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

pub type ItemMap = HashMap<ItemId, Item>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFlags {
    /// Set while the catalog is still performing its initial load.
    pub loading_stage: bool,
}

/// Result of a store round-trip.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ItemPayload {
    pub item: Option<Item>,
    /// Canonical record changed concurrently with the local edit.
    pub conflict: bool,
}

impl ItemPayload {
    pub fn item(item: Item) -> Self {
        Self {
            item: Some(item),
            conflict: false,
        }
    }

    pub fn conflict(item: Option<Item>) -> Self {
        Self {
            item,
            conflict: true,
        }
    }

    pub fn gone() -> Self {
        Self::default()
    }
}

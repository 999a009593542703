use serde::Serialize;

use crate::buffer::EditBuffer;
use crate::config::ContentConfig;
use crate::item::{ItemId, ItemMap};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TabDescriptor {
    pub id: ItemId,
    pub label: String,
    /// Local edit differs from the canonical text.
    pub modified: bool,
    /// Backing item no longer exists in the item map.
    pub detached: bool,
    pub closable: bool,
}

/// Projects open tab ids into tab descriptors, in order.
pub fn render_tabs(
    ids: &[ItemId],
    items: &ItemMap,
    buffer: &EditBuffer,
    config: &ContentConfig,
) -> Vec<TabDescriptor> {
    ids.iter()
        .map(|id| {
            let item = items.get(id);
            let namespace = item
                .and_then(|i| i.namespace.as_deref())
                .unwrap_or(&config.no_namespace);
            let name = item
                .and_then(|i| i.name.as_deref())
                .unwrap_or(&config.no_name);
            let resource_id = item
                .map(|i| i.resource_id.as_str())
                .filter(|r| !r.is_empty())
                .unwrap_or(&config.no_resource);

            TabDescriptor {
                id: id.clone(),
                label: format!("{namespace} • {resource_id} • {name}"),
                modified: buffer.is_modified(id, item.map(|i| i.yaml.as_str())),
                detached: item.is_none(),
                closable: true,
            }
        })
        .collect()
}

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const NO_NAMESPACE: &str = "<no namespace>";
pub const NO_NAME: &str = "<no name>";
pub const NO_RESOURCE: &str = "<no kind>";

/// What happens to a tab's unsaved text once a delete round-trip completes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletePolicy {
    /// Clear the buffer whatever the store reported.
    #[default]
    ClearAlways,
    /// Keep the buffer when the store reported an error.
    KeepOnFailure,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortcut {
    pub keys: String,
    pub action: String,
}

impl Shortcut {
    fn new(keys: &str, action: &str) -> Self {
        Self {
            keys: keys.to_string(),
            action: action.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    pub no_namespace: String,
    pub no_name: String,
    pub no_resource: String,
    pub delete_policy: DeletePolicy,
    /// Field manager sent with create/replace requests.
    pub field_manager: String,
    pub shortcuts: Vec<Shortcut>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            no_namespace: NO_NAMESPACE.to_string(),
            no_name: NO_NAME.to_string(),
            no_resource: NO_RESOURCE.to_string(),
            delete_policy: DeletePolicy::default(),
            field_manager: "catalog-content".to_string(),
            shortcuts: vec![
                Shortcut::new("⌘ + ⌥ + S", "Tab.Save"),
                Shortcut::new("⌘ + ⌥ + C", "Tab.Close"),
                Shortcut::new("⌘ + ⌥ + R", "Tab.Reload"),
            ],
        }
    }
}

impl ContentConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(k8s_openapi::serde_json::from_str(json)?)
    }
}

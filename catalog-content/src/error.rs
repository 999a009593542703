use thiserror::Error;

use crate::item::ItemId;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("kube request failed: {0}")]
    Kube(#[from] kube::Error),

    #[error("invalid yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("bad json: {0}")]
    Json(#[from] k8s_openapi::serde_json::Error),

    #[error("missing apiVersion/kind")]
    MissingTypes,

    #[error("missing metadata.name")]
    MissingName,

    #[error("invalid apiVersion/kind: {0}")]
    InvalidGvk(String),

    #[error("no item with id {0}")]
    UnknownItem(ItemId),

    #[error("tab registry: {0}")]
    Registry(String),

    #[error("Client not initialised")]
    ClientNotInitialised,
}

pub type Result<T, E = ContentError> = std::result::Result<T, E>;

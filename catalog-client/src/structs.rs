use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Gvk {
    pub k: String,
    pub v: String,
    pub g: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoadArgs {
    pub gvk: Gvk,
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TabEditArgs {
    pub action: String,
    pub id: Option<String>,
}

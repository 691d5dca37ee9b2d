use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleListItem {
    pub id: Uuid,
    pub name: String,
    pub is_solved: bool,
}

/// Body of `PUT /admin/module/:name/flag`. A missing flag switches to dynamic.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetFlagRequest {
    #[serde(default)]
    pub static_flag: Option<String>,
}

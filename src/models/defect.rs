//! Defect listing

use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefectClassList {
    pub schema_version: u32,
    pub classes: Vec<String>,
}

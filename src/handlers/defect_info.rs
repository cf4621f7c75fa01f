//! Defect knowledge handlers

use axum::{
    extract::{Path, State},
    Json,
};

use crate::knowledge::{DefectRecord, CURRENT_SCHEMA_VERSION};
use crate::models::DefectClassList;
use crate::{AppError, AppResult, AppState};

/// Raw record for one class key
pub async fn get(
    State(state): State<AppState>,
    Path(class_name): Path<String>,
) -> AppResult<Json<DefectRecord>> {
    let record = state
        .service
        .knowledge()
        .lookup(&class_name)
        .cloned()
        .ok_or_else(|| AppError::NotFound("Defect class not found".to_string()))?;

    Ok(Json(record))
}

/// All known class keys
pub async fn list(State(state): State<AppState>) -> Json<DefectClassList> {
    let classes = state
        .service
        .knowledge()
        .class_keys()
        .into_iter()
        .map(str::to_string)
        .collect();

    Json(DefectClassList {
        schema_version: CURRENT_SCHEMA_VERSION,
        classes,
    })
}

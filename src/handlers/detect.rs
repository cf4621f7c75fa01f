//! Detection handlers

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{header, HeaderName},
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use crate::models::DetectResponse;
use crate::service::UploadedFile;
use crate::{AppError, AppResult, AppState};

const TOTAL_DETECTIONS_HEADER: &str = "x-total-detections";
const REQUEST_ID_HEADER: &str = "x-request-id";

/// Detect defects in an uploaded panel image
pub async fn detect(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<DetectResponse>> {
    let upload = read_upload(multipart?).await?;
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("detect", %request_id, file = ?upload.file_name);

    // decode and inference are CPU bound
    let service = state.service.clone();
    let response = tokio::task::spawn_blocking(move || {
        let _guard = span.enter();
        service.detect(&upload, request_id)
    })
    .await??;

    Ok(Json(response))
}

/// Same input as [`detect`], answers with the annotated JPEG
pub async fn detect_annotated(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Response> {
    let upload = read_upload(multipart?).await?;
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("detect_annotated", %request_id, file = ?upload.file_name);

    let service = state.service.clone();
    let (jpeg, count) = tokio::task::spawn_blocking(move || {
        let _guard = span.enter();
        service.detect_annotated(&upload, request_id)
    })
    .await??;

    let headers = [
        (header::CONTENT_TYPE, "image/jpeg".to_string()),
        (HeaderName::from_static(TOTAL_DETECTIONS_HEADER), count.to_string()),
        (HeaderName::from_static(REQUEST_ID_HEADER), request_id.to_string()),
    ];
    Ok((headers, jpeg).into_response())
}

/// Pull the `file` part out of the multipart body.
async fn read_upload(mut multipart: Multipart) -> AppResult<UploadedFile> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?.to_vec();

        return Ok(UploadedFile {
            file_name,
            content_type,
            bytes,
        });
    }

    Err(AppError::NoFile)
}

//! Multipart resume upload: extract text, store the original in S3.

use aws_sdk_s3::primitives::ByteStream;
use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::resume::extract_pdf_text;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub s3_key: String,
    pub raw_text: String,
}

/// POST /api/v1/resumes/upload
///
/// Expects multipart fields `user_id` and `file` (a PDF). Returns the stored
/// key plus extracted text; the client sends both back when creating an
/// analysis.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut user_id: Option<Uuid> = None;
    let mut file: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        match field.name() {
            Some("user_id") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Bad user_id field: {e}")))?;
                user_id = Some(
                    text.parse()
                        .map_err(|_| AppError::Validation("user_id must be a UUID".to_string()))?,
                );
            }
            Some("file") => {
                file = Some(field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("Could not read uploaded file: {e}"))
                })?);
            }
            _ => {}
        }
    }

    let user_id =
        user_id.ok_or_else(|| AppError::Validation("Missing user_id field".to_string()))?;
    let file = file.ok_or_else(|| AppError::Validation("Missing file field".to_string()))?;

    let raw_text = extract_pdf_text(&file)?;

    let s3_key = format!("resumes/{}/{}.pdf", user_id, Uuid::new_v4());
    state
        .s3
        .put_object()
        .bucket(&state.config.s3_bucket)
        .key(&s3_key)
        .body(ByteStream::from(file.to_vec()))
        .content_type("application/pdf")
        .send()
        .await
        .map_err(|e| AppError::S3(format!("Resume upload failed: {e}")))?;

    info!(
        "Stored resume for user {user_id} at s3://{}/{s3_key} ({} chars extracted)",
        state.config.s3_bucket,
        raw_text.len()
    );

    Ok(Json(UploadResponse { s3_key, raw_text }))
}

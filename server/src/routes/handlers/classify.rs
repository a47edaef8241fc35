use axum::{
    extract::{Multipart, State},
    Json,
};

use lib_extract::SupportedFile;

use crate::{
    error::{AppError, AppJsonResult},
    model::ClassificationResult,
    ServerState,
};

/// Classify raw email text submitted as a multipart form field.
pub async fn classify_text(
    State(state): State<ServerState>,
    mut multipart: Multipart,
) -> AppJsonResult<ClassificationResult> {
    let mut text: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() == Some("text") {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read field: {}", e)))?;
            text = Some(value);
            break;
        }
    }

    let text = text.ok_or_else(|| AppError::BadRequest("Field 'text' is required".to_string()))?;
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::BadRequest("Field 'text' must not be empty".to_string()));
    }

    let result = state.triage.classify(&state.http_client, text).await;
    Ok(Json(result))
}

/// Classify the text extracted from an uploaded PDF or TXT file.
pub async fn classify_file(
    State(state): State<ServerState>,
    mut multipart: Multipart,
) -> AppJsonResult<ClassificationResult> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() == Some("file") {
            let filename = field
                .file_name()
                .ok_or_else(|| AppError::BadRequest("Uploaded file has no filename".to_string()))?
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;
            upload = Some((filename, bytes.to_vec()));
            break;
        }
    }

    let (filename, bytes) =
        upload.ok_or_else(|| AppError::BadRequest("Field 'file' is required".to_string()))?;

    let kind = SupportedFile::from_filename(&filename).ok_or_else(|| {
        AppError::UnsupportedMedia(format!(
            "Unsupported file type for '{}'; only .pdf and .txt are accepted",
            filename
        ))
    })?;

    let text = lib_extract::extract_text(kind, &bytes)
        .map_err(|e| AppError::BadRequest(format!("Could not extract text: {}", e)))?;
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::BadRequest(
            "Uploaded file contains no extractable text".to_string(),
        ));
    }

    let result = state.triage.classify(&state.http_client, text).await;
    Ok(Json(result))
}

//! Merge routes - multipart upload, merge to a download or to storage.

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Multipart;
use file_merger_core::{InputFile, SaveOutcome};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

use crate::helpers::{ResultExt, RouteResult, attachment, run_blocking};
use crate::state::AppState;

/// Download name for merge-to-bytes responses.
const MERGED_FILE_NAME: &str = "merged-document.pdf";

/// Multipart field carrying the files to merge (repeatable).
const FILES_FIELD: &str = "files";

/// Multipart field carrying the requested base name.
const FILE_NAME_FIELD: &str = "fileName";

/// Files and options read from a merge request.
#[derive(Debug, Default)]
struct MergeUpload {
    files: Vec<InputFile>,
    file_name: Option<String>,
}

impl MergeUpload {
    /// Collect all fields, keeping file order as sent.
    async fn read(multipart: &mut Multipart) -> anyhow::Result<Self> {
        let mut upload = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let field_name = field.name().unwrap_or_default().to_string();
            match field_name.as_str() {
                FILES_FIELD => {
                    let name = field.file_name().unwrap_or_default().to_string();
                    let data = field.bytes().await?;
                    upload.files.push(InputFile::new(name, data.to_vec()));
                }
                FILE_NAME_FIELD => {
                    upload.file_name = Some(field.text().await?);
                }
                _ => {}
            }
        }

        Ok(upload)
    }
}

/// Response body for a successful save.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    pub message: String,
    pub file_name: String,
    pub file_path: String,
}

/// Merge uploaded files and return the PDF as a download.
pub async fn merge_to_pdf(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> RouteResult<Response> {
    let upload = MergeUpload::read(&mut multipart)
        .await
        .or_internal_error()?;

    let merged = run_blocking(move || state.merger.merge_to_bytes(&upload.files))
        .await
        .map_err(|e| {
            error!("Failed to merge files: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    info!(
        "Merged {} files into {} pages",
        merged.report.merged.len(),
        merged.report.pages
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(header::CONTENT_DISPOSITION, attachment(MERGED_FILE_NAME))
        .body(Body::from(merged.bytes))
        .or_internal_error()
}

/// Merge uploaded files and save the result under a unique name.
pub async fn merge_and_save(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Response {
    let result: anyhow::Result<SaveOutcome> = async {
        let upload = MergeUpload::read(&mut multipart).await?;
        run_blocking(move || {
            state
                .merger
                .merge_and_save(&upload.files, upload.file_name.as_deref())
        })
        .await
    }
    .await;

    match result {
        Ok(outcome) => {
            let file_path = outcome.saved.path().display().to_string();
            Json(SaveResponse {
                message: "Files merged successfully".to_string(),
                file_name: outcome.saved.file_name,
                file_path,
            })
            .into_response()
        }
        Err(e) => {
            error!("Failed to merge files: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": format!("Failed to merge files: {e}") })),
            )
                .into_response()
        }
    }
}

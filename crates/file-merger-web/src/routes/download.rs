//! Download routes - saved PDF retrieval.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::Response,
};
use std::sync::Arc;
use tracing::error;

use crate::helpers::{ResultExt, RouteResult, attachment, run_blocking, status_for};
use crate::state::AppState;

/// Download a previously saved PDF by file name.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(file_name): Path<String>,
) -> RouteResult<Response> {
    let name = file_name.clone();
    let data = run_blocking(move || state.merger.retrieve(&name))
        .await
        .map_err(|e| {
            let status = status_for(&e);
            if status == StatusCode::INTERNAL_SERVER_ERROR {
                error!("Failed to read {}: {:#}", file_name, e);
            } else {
                error!("Download of {} rejected: {}", file_name, e);
            }
            status
        })?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(header::CONTENT_DISPOSITION, attachment(&file_name))
        .body(Body::from(data))
        .or_internal_error()
}

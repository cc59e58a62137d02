//! Helper types and traits for cleaner route handlers.
//!
//! Provides conversions from core errors into HTTP status codes and a
//! wrapper for running synchronous merge work on the blocking pool.

use anyhow::Context;
use axum::http::StatusCode;
use file_merger_core::Error;
use tracing::error;

/// Standard result type for route handlers with an empty error body.
pub type RouteResult<T> = Result<T, StatusCode>;

/// Status code for a failed operation.
///
/// Missing files map to 404 and rejected file names to 400; everything else
/// is a server error.
pub fn status_for(err: &anyhow::Error) -> StatusCode {
    match err.downcast_ref::<Error>() {
        Some(Error::NotFound(_)) => StatusCode::NOT_FOUND,
        Some(Error::InvalidFileName(_)) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Extension trait for converting `Result<T, E>` to `RouteResult<T>`.
pub trait ResultExt<T> {
    /// Logs the error and converts it to 500 Internal Server Error.
    fn or_internal_error(self) -> RouteResult<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn or_internal_error(self) -> RouteResult<T> {
        self.map_err(|e| {
            error!("{}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
    }
}

/// `Content-Disposition` value offering `file_name` as a download.
///
/// `"` and `\` are backslash-escaped inside the quoted string.
pub fn attachment(file_name: &str) -> String {
    let mut value = String::with_capacity(file_name.len() + 24);
    value.push_str("attachment; filename=\"");
    for c in file_name.chars() {
        if matches!(c, '"' | '\\') {
            value.push('\\');
        }
        value.push(c);
    }
    value.push('"');
    value
}

/// Run merge or storage work on the blocking pool.
pub async fn run_blocking<T, F>(task: F) -> anyhow::Result<T>
where
    F: FnOnce() -> file_merger_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::task::spawn_blocking(task)
        .await
        .context("Merge task panicked")?;
    Ok(result?)
}

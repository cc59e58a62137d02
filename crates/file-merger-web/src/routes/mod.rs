//! HTTP route handlers for the file merger web service.
//!
//! Merge routes accept multipart uploads; every response is either PDF bytes,
//! a small JSON document, or an empty body with an error status.

mod download;
mod merge;

pub use download::download_file;
pub use merge::{SaveResponse, merge_and_save, merge_to_pdf};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;

use crate::state::AppState;

/// Build the API router with the upload size limit from the configuration.
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.config().server.max_upload_bytes;

    Router::new()
        .route("/api/files/merge-to-pdf", post(merge_to_pdf))
        .route("/api/files/merge-to-pdf/save", post(merge_and_save))
        .route("/api/files/download/{fileName}", get(download_file))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use file_merger_core::AppConfig;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use std::io::Cursor;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const BOUNDARY: &str = "merge-test-boundary";

    /// One multipart part: field name, optional file name, content.
    type Part<'a> = (&'a str, Option<&'a str>, &'a [u8]);

    fn file<'a>(name: &'a str, content: &'a [u8]) -> Part<'a> {
        ("files", Some(name), content)
    }

    fn text<'a>(field: &'a str, value: &'a str) -> Part<'a> {
        (field, None, value.as_bytes())
    }

    fn state(dir: &TempDir) -> Arc<AppState> {
        let mut config = AppConfig::default();
        config.storage.upload_dir = dir.path().join("files");
        Arc::new(AppState::new(config).unwrap())
    }

    fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
        let mut body = Vec::new();
        for (field, file_name, content) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            let disposition = match file_name {
                Some(file_name) => format!(
                    "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                ),
                None => format!("Content-Disposition: form-data; name=\"{field}\"\r\n\r\n"),
            };
            body.extend_from_slice(disposition.as_bytes());
            body.extend_from_slice(content);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    async fn post(state: &Arc<AppState>, uri: &str, parts: &[Part<'_>]) -> Response {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap();
        router(Arc::clone(state)).oneshot(request).await.unwrap()
    }

    async fn get(state: &Arc<AppState>, uri: &str) -> Response {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        router(Arc::clone(state)).oneshot(request).await.unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    fn page_count(pdf: &[u8]) -> usize {
        lopdf::Document::load_mem(pdf).unwrap().get_pages().len()
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::new(width, height));
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[tokio::test]
    async fn test_merge_to_pdf_returns_attachment() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir);
        let image = png(20, 10);

        let response = post(
            &state,
            "/api/files/merge-to-pdf",
            &[
                file("notes.txt", b"first line\nsecond line"),
                file("picture.png", &image),
                file("data.csv", b"a,b"),
            ],
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/pdf"
        );
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"merged-document.pdf\""
        );
        assert_eq!(page_count(&body_bytes(response).await), 2);
    }

    #[tokio::test]
    async fn test_merge_without_files_returns_empty_pdf() {
        let dir = TempDir::new().unwrap();
        let response = post(&state(&dir), "/api/files/merge-to-pdf", &[]).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(page_count(&body_bytes(response).await), 0);
    }

    #[tokio::test]
    async fn test_merge_failure_returns_empty_500() {
        let dir = TempDir::new().unwrap();
        let response = post(
            &state(&dir),
            "/api/files/merge-to-pdf",
            &[file("broken.pdf", b"not a pdf")],
        )
        .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_save_returns_unique_names() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir);
        let parts: &[Part<'_>] = &[
            text("fileName", "report"),
            file("a.txt", b"hello"),
        ];

        let first = post(&state, "/api/files/merge-to-pdf/save", parts).await;
        assert_eq!(first.status(), StatusCode::OK);
        let first = body_json(first).await;
        assert_eq!(first["message"], "Files merged successfully");
        assert_eq!(first["fileName"], "report.pdf");

        let expected_path = dir.path().join("files").join("report.pdf");
        assert_eq!(first["filePath"], expected_path.display().to_string());
        assert!(expected_path.is_file());

        let second = body_json(post(&state, "/api/files/merge-to-pdf/save", parts).await).await;
        assert_eq!(second["fileName"], "report_1.pdf");
    }

    #[tokio::test]
    async fn test_save_strips_pdf_suffix() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir);

        let response = post(
            &state,
            "/api/files/merge-to-pdf/save",
            &[
                file("a.txt", b"hello"),
                text("fileName", "invoice.pdf"),
            ],
        )
        .await;

        assert_eq!(body_json(response).await["fileName"], "invoice.pdf");
    }

    #[tokio::test]
    async fn test_save_without_name_uses_default() {
        let dir = TempDir::new().unwrap();
        let response = post(
            &state(&dir),
            "/api/files/merge-to-pdf/save",
            &[file("a.txt", b"hello")],
        )
        .await;

        let json = body_json(response).await;
        let name = json["fileName"].as_str().unwrap();
        assert!(name.starts_with("merged-document-"));
        assert!(name.ends_with(".pdf"));
    }

    #[tokio::test]
    async fn test_save_failure_returns_json_error() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir);

        let response = post(
            &state,
            "/api/files/merge-to-pdf/save",
            &[
                file("photo.jpg", b"not a jpeg"),
                text("fileName", "broken"),
            ],
        )
        .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        let message = json["error"].as_str().unwrap();
        assert!(message.starts_with("Failed to merge files: "), "{message}");
        assert!(!dir.path().join("files").join("broken.pdf").exists());
    }

    #[tokio::test]
    async fn test_download_saved_file() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir);

        post(
            &state,
            "/api/files/merge-to-pdf/save",
            &[
                file("a.txt", b"hello"),
                text("fileName", "saved"),
            ],
        )
        .await;

        let response = get(&state, "/api/files/download/saved.pdf").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"saved.pdf\""
        );

        let on_disk = std::fs::read(dir.path().join("files").join("saved.pdf")).unwrap();
        assert_eq!(body_bytes(response).await, on_disk);
    }

    #[tokio::test]
    async fn test_download_missing_file_is_404() {
        let dir = TempDir::new().unwrap();
        let response = get(&state(&dir), "/api/files/download/missing.pdf").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_download_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir);
        std::fs::write(dir.path().join("secret.pdf"), b"secret").unwrap();

        let response = get(&state, "/api/files/download/..%2Fsecret.pdf").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_download_escapes_quotes_in_file_name() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir);

        let saved = post(
            &state,
            "/api/files/merge-to-pdf/save",
            &[
                file("a.txt", b"hello"),
                text("fileName", "a\"; x=\"y"),
            ],
        )
        .await;
        assert_eq!(saved.status(), StatusCode::OK);
        assert_eq!(body_json(saved).await["fileName"], "a\"; x=\"y.pdf");

        let response = get(&state, "/api/files/download/a%22%3B%20x%3D%22y.pdf").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            r#"attachment; filename="a\"; x=\"y.pdf""#
        );

        let on_disk = std::fs::read(dir.path().join("files").join("a\"; x=\"y.pdf")).unwrap();
        assert_eq!(body_bytes(response).await, on_disk);
    }

    #[tokio::test]
    async fn test_save_rejects_control_characters_in_name() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir);

        let response = post(
            &state,
            "/api/files/merge-to-pdf/save",
            &[
                file("a.txt", b"hello"),
                text("fileName", "line\nbreak"),
            ],
        )
        .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().starts_with("Failed to merge files: "));
        assert_eq!(std::fs::read_dir(dir.path().join("files")).unwrap().count(), 0);

        let response = get(&state, "/api/files/download/line%0Abreak.pdf").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_bytes(response).await.is_empty());
    }
}

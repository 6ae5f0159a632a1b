//! HTTP routes: page, sentence upload, audio upload, zip download

pub mod page;
pub mod recordings;
pub mod sentences;

use crate::recordings::RecordingsError;
use crate::sentences::SentenceError;
use crate::server::AppState;
use axum::body::Bytes;
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Missing form field: {0}")]
    MissingField(&'static str),
    #[error("Form field {0} is not valid UTF-8")]
    InvalidText(&'static str),
    #[error("Malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),
    #[error(transparent)]
    Recordings(#[from] RecordingsError),
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingField(_) | ApiError::InvalidText(_) => StatusCode::BAD_REQUEST,
            ApiError::Multipart(e) => e.status(),
            ApiError::Recordings(RecordingsError::EmptySentence)
            | ApiError::Recordings(RecordingsError::Sentences(SentenceError::InvalidUtf8(_))) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Recordings(_) | ApiError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Rejected request: {}", self);
        }
        (status, self.to_string()).into_response()
    }
}

/// Multipart fields collected by name
struct Form {
    fields: HashMap<String, Bytes>,
}

impl Form {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut fields = HashMap::new();
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let data = field.bytes().await?;
            fields.insert(name, data);
        }
        Ok(Self { fields })
    }

    fn take(&mut self, name: &'static str) -> Result<Bytes, ApiError> {
        self.fields.remove(name).ok_or(ApiError::MissingField(name))
    }

    fn take_text(&mut self, name: &'static str) -> Result<String, ApiError> {
        let bytes = self.take(name)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| ApiError::InvalidText(name))
    }
}

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(page::index))
        .route("/sentences", get(sentences::list_sentences))
        .route("/upload-sentences", post(sentences::upload_sentences))
        .route("/upload-audio", post(recordings::upload_audio))
        .route("/download-recordings", get(recordings::download_recordings))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::recordings::Recordings;
    use axum::body::Body;
    use axum::http::{header, Request};
    use std::io::{Cursor, Read};
    use std::path::Path;
    use tempfile::tempdir;
    use tower::ServiceExt;
    use zip::ZipArchive;

    const BOUNDARY: &str = "recorder-test-boundary";

    fn app(root: &Path) -> Router {
        app_with(Config::in_dir(root))
    }

    fn app_with(config: Config) -> Router {
        let recordings = Recordings::open(&config).unwrap();
        router(AppState::new(config, recordings))
    }

    struct Part {
        name: &'static str,
        filename: Option<&'static str>,
        data: Vec<u8>,
    }

    fn file(name: &'static str, filename: &'static str, data: &[u8]) -> Part {
        Part {
            name,
            filename: Some(filename),
            data: data.to_vec(),
        }
    }

    fn text(name: &'static str, value: &str) -> Part {
        Part {
            name,
            filename: None,
            data: value.as_bytes().to_vec(),
        }
    }

    fn multipart(uri: &str, parts: Vec<Part>) -> Request<Body> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            let disposition = match part.filename {
                Some(f) => format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    part.name, f
                ),
                None => format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.name),
            };
            body.extend_from_slice(disposition.as_bytes());
            body.extend_from_slice(&part.data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn test_index_page() {
        let temp = tempdir().unwrap();
        let response = app(temp.path()).oneshot(get_request("/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = String::from_utf8(body_bytes(response).await).unwrap();
        assert!(html.contains("/upload-sentences"));
        assert!(html.contains("/download-recordings"));
    }

    #[tokio::test]
    async fn test_upload_sentences_returns_json_list() {
        let temp = tempdir().unwrap();
        let app = app(temp.path());

        let response = app
            .clone()
            .oneshot(multipart(
                "/upload-sentences",
                vec![file("file", "script.txt", b"Hello.\n\n  World.  \n")],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let sentences: Vec<String> = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(sentences, vec!["Hello.", "World."]);

        let response = app.oneshot(get_request("/sentences")).await.unwrap();
        let restored: Vec<String> = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(restored, sentences);
    }

    #[tokio::test]
    async fn test_sentences_empty_before_upload() {
        let temp = tempdir().unwrap();
        let response = app(temp.path()).oneshot(get_request("/sentences")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, b"[]");
    }

    #[tokio::test]
    async fn test_upload_sentences_rejects_bad_input() {
        let temp = tempdir().unwrap();
        let app = app(temp.path());

        let response = app
            .clone()
            .oneshot(multipart(
                "/upload-sentences",
                vec![file("file", "script.txt", &[0xff, 0xfe, 0x00])],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(multipart("/upload-sentences", vec![text("other", "x")]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_bytes(response).await, b"Missing form field: file");
    }

    #[tokio::test]
    async fn test_upload_audio_and_download() {
        let temp = tempdir().unwrap();
        let app = app(temp.path());

        let response = app
            .clone()
            .oneshot(multipart(
                "/upload-audio",
                vec![
                    file("audio", "blob.webm", b"opus data"),
                    text("sentence_idx", "0"),
                    text("sentence_text", "Hello."),
                ],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, b"Audio received");
        assert!(temp
            .path()
            .join("audio_files/f9776f93ac975cd47b598e34d9242d18.webm")
            .exists());

        let response = app.oneshot(get_request("/download-recordings")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/zip"
        );
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"recordings.zip\""
        );

        let mut archive = ZipArchive::new(Cursor::new(body_bytes(response).await)).unwrap();
        assert_eq!(archive.len(), 2);
        let mut manifest = String::new();
        archive
            .by_name("mapping.tsv")
            .unwrap()
            .read_to_string(&mut manifest)
            .unwrap();
        assert_eq!(
            manifest,
            "audio_filename\tsentence\nf9776f93ac975cd47b598e34d9242d18.webm\tHello."
        );
        assert_eq!(
            std::fs::read_dir(temp.path().join("audio_files")).unwrap().count(),
            0
        );
    }

    #[tokio::test]
    async fn test_upload_audio_missing_fields() {
        let temp = tempdir().unwrap();
        let app = app(temp.path());

        let response = app
            .clone()
            .oneshot(multipart("/upload-audio", vec![file("audio", "a.webm", b"x")]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_bytes(response).await, b"Missing form field: sentence_text");

        let response = app
            .clone()
            .oneshot(multipart("/upload-audio", vec![text("sentence_text", "Hi.")]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(multipart(
                "/upload-audio",
                vec![file("audio", "a.webm", b"x"), text("sentence_text", "   ")],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_sentence_idx_is_not_used_for_keying() {
        let temp = tempdir().unwrap();
        let app = app(temp.path());

        for idx in ["3", "not a number"] {
            let response = app
                .clone()
                .oneshot(multipart(
                    "/upload-audio",
                    vec![
                        file("audio", "a.webm", b"x"),
                        text("sentence_idx", idx),
                        text("sentence_text", "Same."),
                    ],
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let mapping = std::fs::read_to_string(temp.path().join("audio_mapping.tsv")).unwrap();
        assert_eq!(mapping.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_body_limit() {
        let temp = tempdir().unwrap();
        let mut config = Config::in_dir(temp.path());
        config.max_upload_bytes = 64;
        let app = app_with(config);

        let big = vec![b'a'; 1024];
        let response = app
            .oneshot(multipart(
                "/upload-audio",
                vec![file("audio", "a.webm", &big), text("sentence_text", "Big.")],
            ))
            .await
            .unwrap();
        assert!(response.status().is_client_error());
        assert!(!temp.path().join("audio_mapping.tsv").exists());
    }
}

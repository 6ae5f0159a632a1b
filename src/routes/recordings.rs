//! Recording routes: /upload-audio and /download-recordings

use super::{ApiError, Form};
use crate::archive::ARCHIVE_NAME;
use crate::server::AppState;
use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::IntoResponse;
use std::sync::Arc;
use tracing::info;

/// POST /upload-audio - store a take for `sentence_text`
///
/// `sentence_idx` is only logged; the sentence text decides the filename.
pub async fn upload_audio(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<&'static str, ApiError> {
    let mut form = Form::read(multipart).await?;
    let audio = form.take("audio")?;
    let sentence = form.take_text("sentence_text")?;
    let idx = form
        .take_text("sentence_idx")
        .ok()
        .and_then(|s| s.trim().parse::<usize>().ok());

    let recordings = state.recordings.clone();
    let fingerprint =
        tokio::task::spawn_blocking(move || recordings.save_recording(&sentence, &audio)).await??;

    info!(sentence_idx = ?idx, "Received audio as {}", fingerprint);
    Ok("Audio received")
}

/// GET /download-recordings - zip every take and clear them out
pub async fn download_recordings(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let recordings = state.recordings.clone();
    let export = tokio::task::spawn_blocking(move || recordings.export_archive()).await??;

    info!(
        "Sending {} with {} clips ({} stale rows skipped)",
        ARCHIVE_NAME, export.clip_count, export.stale_count
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", ARCHIVE_NAME),
            ),
        ],
        export.archive,
    ))
}

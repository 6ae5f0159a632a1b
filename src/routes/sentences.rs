//! Sentence list routes: /upload-sentences and /sentences

use super::{ApiError, Form};
use crate::recordings::RecordingsError;
use crate::server::AppState;
use axum::extract::{Multipart, State};
use axum::Json;
use std::sync::Arc;
use tracing::debug;

/// POST /upload-sentences - replace the script, return its sentences
pub async fn upload_sentences(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<Vec<String>>, ApiError> {
    let mut form = Form::read(multipart).await?;
    let script = form.take("file")?.to_vec();

    let recordings = state.recordings.clone();
    let sentences = tokio::task::spawn_blocking(move || recordings.replace_sentences(script)).await??;

    Ok(Json(sentences))
}

/// GET /sentences - the last uploaded sentence list
pub async fn list_sentences(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, ApiError> {
    let recordings = state.recordings.clone();
    let (sentences, recorded) = tokio::task::spawn_blocking(move || {
        Ok::<_, RecordingsError>((recordings.current_sentences()?, recordings.recorded_count()?))
    })
    .await??;

    debug!("Restoring {} sentences, {} clips recorded", sentences.len(), recorded);
    Ok(Json(sentences))
}

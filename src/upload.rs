//! Multipart uploads into the upload directory.

use std::path::{Path, PathBuf};

use axum::extract::{Multipart, State};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::error::AppError;
use crate::paths::resolve_within;
use crate::AppState;

/// Validate a client-supplied filename and fix the destination inside
/// `upload_dir`. Path separators and control characters are stripped before
/// the containment check, so a crafted filename cannot climb out of the
/// upload directory.
fn prepare_target(upload_dir: &Path, filename: &str) -> Result<PathBuf, AppError> {
    if filename.is_empty() {
        return Err(AppError::BadRequest("No selected file"));
    }

    let cleaned = sanitize_filename::sanitize(filename);
    if cleaned.is_empty() {
        warn!(filename, "upload filename rejected by sanitizer");
        return Err(AppError::BadRequest("Invalid filename"));
    }

    resolve_within(upload_dir, &cleaned)
}

/// POST /upload
///
/// Takes the multipart field named `file` and writes it under the upload
/// directory, replacing any existing file of the same name. Collisions are
/// last-write-wins at the filesystem; there is deliberately no locking.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<&'static str, AppError> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::BadRequest("Invalid multipart payload"))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let target = prepare_target(&state.config.upload_dir, &filename)?;

        fs::create_dir_all(&state.config.upload_dir).await?;
        let mut file = fs::File::create(&target).await?;

        let mut written = 0u64;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|err| AppError::Io(std::io::Error::other(err)))?
        {
            written += chunk.len() as u64;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        info!(file = %target.display(), bytes = written, "upload stored");
        return Ok("File uploaded successfully");
    }

    Err(AppError::BadRequest("No file part"))
}

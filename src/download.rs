//! Single-file downloads.

use axum::body::Body;
use axum::extract::{Path as UrlPath, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use percent_encoding::{percent_encode, NON_ALPHANUMERIC};
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::error::AppError;
use crate::paths::resolve_within;
use crate::AppState;

// 1 MiB read buffer so large transfers don't drain in tiny frames.
const CHUNK_SIZE: usize = 1024 * 1024;

/// Content-Disposition carrying both the quoted filename and the RFC 5987
/// `filename*` form, so non-ASCII names survive every client.
pub fn attachment_disposition(filename: &str) -> String {
    let encoded = percent_encode(filename.as_bytes(), NON_ALPHANUMERIC);
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        filename.replace('"', "'"),
        encoded
    )
}

/// GET /download/{*path}
///
/// Only regular files are served; a directory target is a 404, never a
/// listing.
pub async fn download(
    State(state): State<AppState>,
    UrlPath(path): UrlPath<String>,
) -> Result<Response, AppError> {
    let target = resolve_within(&state.config.root_dir, &path)?;

    let meta = tokio::fs::metadata(&target)
        .await
        .map_err(|_| AppError::FileNotFound)?;
    if !meta.is_file() {
        return Err(AppError::FileNotFound);
    }

    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());
    let mime = mime_guess::from_path(&target).first_or_octet_stream();

    let file = tokio::fs::File::open(&target).await?;
    debug!(path = %path, size = meta.len(), "streaming download");

    let stream = ReaderStream::with_capacity(file, CHUNK_SIZE);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (header::CONTENT_LENGTH, meta.len().to_string()),
            (
                header::CONTENT_DISPOSITION,
                attachment_disposition(&file_name),
            ),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}

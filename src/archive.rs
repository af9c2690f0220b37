//! Zip packaging for whole-directory downloads.
//!
//! The archive is built completely in memory before any byte reaches the
//! client: a failed read mid-walk aborts the response instead of truncating
//! it. Fine for the modest trees this server fronts.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use async_zip::tokio::write::ZipFileWriter;
use async_zip::{Compression, ZipEntryBuilder};
use axum::extract::{Path as UrlPath, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::info;
use walkdir::WalkDir;

use crate::download::attachment_disposition;
use crate::error::AppError;
use crate::paths::{relative_of, resolve_within};
use crate::AppState;

/// One file destined for the archive: the entry name inside the zip plus the
/// absolute path it is read from.
struct ArchiveEntry {
    name: String,
    source: PathBuf,
}

/// Walk `dir` and collect every regular file below it. Entry names are
/// relative to `dir` itself, so the archived directory's own name never
/// prefixes them. The walk is sorted by file name, so the same tree always
/// yields the same entry order. Symlinked directories are not followed.
fn collect_entries(dir: &Path) -> Result<Vec<ArchiveEntry>, AppError> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|err| AppError::Io(err.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        entries.push(ArchiveEntry {
            name: relative_of(dir, entry.path()),
            source: entry.path().to_path_buf(),
        });
    }
    Ok(entries)
}

/// Build `<basename>.zip` for `dir`. Returns the archive filename and the
/// finished bytes; an empty tree yields a valid zero-entry archive.
pub async fn build_zip(dir: &Path) -> Result<(String, Vec<u8>), AppError> {
    let meta = tokio::fs::metadata(dir)
        .await
        .map_err(|_| AppError::DirectoryNotFound)?;
    if !meta.is_dir() {
        return Err(AppError::DirectoryNotFound);
    }

    let archive_name = format!(
        "{}.zip",
        dir.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "archive".to_string())
    );

    let walk_root = dir.to_path_buf();
    let entries = tokio::task::spawn_blocking(move || collect_entries(&walk_root))
        .await
        .map_err(|err| AppError::Io(std::io::Error::other(err)))??;

    let mut buffer = Cursor::new(Vec::new());
    let mut writer = ZipFileWriter::with_tokio(&mut buffer);
    for entry in &entries {
        let data = tokio::fs::read(&entry.source).await?;
        let builder = ZipEntryBuilder::new(entry.name.clone().into(), Compression::Deflate);
        writer.write_entry_whole(builder, &data).await?;
    }
    writer.close().await?;

    Ok((archive_name, buffer.into_inner()))
}

/// GET /download_directory/{*path}
pub async fn download_directory(
    State(state): State<AppState>,
    UrlPath(path): UrlPath<String>,
) -> Result<Response, AppError> {
    let dir = resolve_within(&state.config.root_dir, &path)?;
    let (archive_name, bytes) = build_zip(&dir).await?;

    info!(
        directory = %path,
        archive = %archive_name,
        size = bytes.len(),
        "built zip archive"
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_LENGTH, bytes.len().to_string()),
            (
                header::CONTENT_DISPOSITION,
                attachment_disposition(&archive_name),
            ),
        ],
        bytes,
    )
        .into_response())
}

//! Directory listings for the browse pages.

use std::path::Path;

use axum::extract::{Path as UrlPath, State};
use axum::response::Html;
use tracing::debug;

use crate::error::AppError;
use crate::paths::{parent_of, relative_of, resolve_within};
use crate::{html, AppState};

#[derive(Debug)]
pub struct FileEntry {
    pub name: String,
    pub size: u64,
}

/// One browse page worth of data, recomputed on every request.
#[derive(Debug)]
pub struct DirectoryListing {
    pub files: Vec<FileEntry>,
    pub dirs: Vec<String>,
    /// Path relative to the served root; empty at the root.
    pub current: String,
    /// `None` at the root (no "up" link).
    pub parent: Option<String>,
}

/// List the immediate children of `dir`. Entries are classified by
/// `metadata()`, which follows symlinks, so a link shows as its target's
/// type; a dangling link lands in the file column.
pub async fn list_directory(dir: &Path, relative: &str) -> Result<DirectoryListing, AppError> {
    let meta = tokio::fs::metadata(dir)
        .await
        .map_err(|_| AppError::DirectoryNotFound)?;
    if !meta.is_dir() {
        return Err(AppError::DirectoryNotFound);
    }

    let mut files = Vec::new();
    let mut dirs = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        match entry.metadata().await {
            Ok(meta) if meta.is_dir() => dirs.push(name),
            Ok(meta) => files.push(FileEntry {
                name,
                size: meta.len(),
            }),
            Err(_) => files.push(FileEntry { name, size: 0 }),
        }
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));
    dirs.sort();

    Ok(DirectoryListing {
        files,
        dirs,
        current: relative.to_string(),
        parent: parent_of(relative),
    })
}

/// GET / and GET /browse
pub async fn browse_root(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    render_listing(&state, String::new()).await
}

/// GET /browse/{*path}
pub async fn browse(
    State(state): State<AppState>,
    UrlPath(path): UrlPath<String>,
) -> Result<Html<String>, AppError> {
    render_listing(&state, path).await
}

async fn render_listing(state: &AppState, relative: String) -> Result<Html<String>, AppError> {
    let dir = resolve_within(&state.config.root_dir, &relative)?;
    // Re-derive the relative form so hrefs and the parent link come out
    // normalized even when the request path contained `.` or `..` segments.
    let normalized = relative_of(&state.config.root_dir, &dir);
    let listing = list_directory(&dir, &normalized).await?;

    let shown = if normalized.is_empty() { "/" } else { normalized.as_str() };
    debug!(
        path = shown,
        files = listing.files.len(),
        dirs = listing.dirs.len(),
        "listed directory"
    );

    Ok(Html(html::listing_page(&listing)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    #[tokio::test]
    async fn classifies_files_and_directories() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("a.txt"), "a").unwrap();
        std::fs::write(tmp.path().join("b.bin"), [0u8; 10]).unwrap();
        std::fs::create_dir(tmp.path().join("sub")).unwrap();

        let listing = list_directory(tmp.path(), "").await.unwrap();

        let files: HashSet<_> = listing.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(files, HashSet::from(["a.txt", "b.bin"]));
        assert_eq!(listing.dirs, vec!["sub".to_string()]);
        assert_eq!(listing.parent, None);
    }

    #[tokio::test]
    async fn reports_sizes() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("payload"), [7u8; 123]).unwrap();

        let listing = list_directory(tmp.path(), "").await.unwrap();
        assert_eq!(listing.files[0].size, 123);
    }

    #[tokio::test]
    async fn missing_directory_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let result = list_directory(&tmp.path().join("gone"), "gone").await;
        assert!(matches!(result, Err(AppError::DirectoryNotFound)));
    }

    #[tokio::test]
    async fn file_path_is_not_listable() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("note.txt");
        std::fs::write(&file, "x").unwrap();

        let result = list_directory(&file, "note.txt").await;
        assert!(matches!(result, Err(AppError::DirectoryNotFound)));
    }

    #[tokio::test]
    async fn single_segment_listing_parents_to_root() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("docs")).unwrap();

        let listing = list_directory(&tmp.path().join("docs"), "docs").await.unwrap();
        assert_eq!(listing.parent, Some(String::new()));
        assert_ne!(listing.parent.as_deref(), Some("docs"));
    }
}

//! Path containment for client-supplied subpaths.
//!
//! Every filesystem operation in this server runs on a path produced by
//! [`resolve_within`]. The check is pure path arithmetic: the target does not
//! need to exist, and no symlinks are followed here.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use tracing::warn;

use crate::error::AppError;

/// Join `relative` onto `base` and prove the result stays inside `base`.
///
/// `relative` uses `/` separators and may name nested subdirectories. A
/// leading `/` is tolerated and treated as relative, `.` segments are
/// dropped, and `..` segments are resolved lexically: one that
/// stays inside the base succeeds with the normalized path, one that would
/// pop past the base fails. An empty `relative` resolves to `base` itself.
pub fn resolve_within(base: &Path, relative: &str) -> Result<PathBuf, AppError> {
    let trimmed = relative.trim_start_matches('/');

    let mut kept: Vec<&OsStr> = Vec::new();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(name) => {
                if name.to_string_lossy().contains('\0') {
                    warn!(?name, "path component contains NUL byte");
                    return Err(AppError::Traversal);
                }
                kept.push(name);
            }
            Component::ParentDir => {
                if kept.pop().is_none() {
                    warn!(path = relative, "traversal attempt escapes base directory");
                    return Err(AppError::Traversal);
                }
            }
            Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) => {
                warn!(path = relative, "absolute component in relative path");
                return Err(AppError::Traversal);
            }
        }
    }

    let mut resolved = base.to_path_buf();
    for name in kept {
        resolved.push(name);
    }

    // Component-wise containment, not a substring match: /basefoo must not
    // pass for /base.
    if !resolved.starts_with(base) {
        warn!(path = relative, "resolved path left base directory");
        return Err(AppError::Traversal);
    }

    Ok(resolved)
}

/// The `/`-separated form of `full` relative to `base`, used for archive
/// entry names and hrefs. Empty when `full` is `base` itself or outside it.
pub fn relative_of(base: &Path, full: &Path) -> String {
    let Ok(relative) = full.strip_prefix(base) else {
        return String::new();
    };

    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Parent of a relative path: `None` for the root itself (no "up" link), the
/// empty string for a single segment, otherwise everything before the last
/// segment. Never yields the input back, so "up" cannot self-loop.
pub fn parent_of(relative: &str) -> Option<String> {
    if relative.is_empty() {
        return None;
    }

    match relative.rsplit_once('/') {
        Some((parent, _)) => Some(parent.to_string()),
        None => Some(String::new()),
    }
}

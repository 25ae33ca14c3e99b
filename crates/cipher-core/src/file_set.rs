//! File-set operations over a project's `FileMap`.
//!
//! Every operation borrows the current map and returns a new one, so a
//! rejected operation leaves the caller's state untouched. Each successful
//! operation also reports which path should be active afterwards:
//!
//! - create / rename select the new path
//! - delete keeps the current active path unless it was the deleted one, in
//!   which case the first remaining visible path is selected

use crate::error::FileSetError;
use crate::template::{DEFAULT_ACTIVE_FILE, placeholder_content};
use crate::types::{FileEntry, FileMap};

/// Result of a successful file-set operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSetChange {
    pub files: FileMap,
    pub active_path: String,
}

/// Turn user input into an absolute path: trims whitespace and prefixes `/`
/// to bare names. Empty input stays empty (and fails validation later).
pub fn normalize_path(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Check that `path` is usable as a file key.
pub fn validate_path(path: &str) -> Result<(), FileSetError> {
    let reject = |reason| {
        Err(FileSetError::InvalidPath {
            path: path.to_string(),
            reason,
        })
    };

    if path.is_empty() {
        return reject("path is empty");
    }
    let Some(rest) = path.strip_prefix('/') else {
        return reject("path must start with '/'");
    };
    if rest.is_empty() {
        return reject("path names no file");
    }
    if rest.ends_with('/') {
        return reject("path must not end with '/'");
    }
    for segment in rest.split('/') {
        match segment {
            "" => return reject("path contains an empty segment"),
            "." | ".." => return reject("path contains a relative segment"),
            _ => {}
        }
    }
    Ok(())
}

/// Check a whole map, e.g. one handed over by the editing collaborator.
pub fn validate_file_map(files: &FileMap) -> Result<(), FileSetError> {
    for path in files.keys() {
        validate_path(path)?;
    }
    if visible_count(files) == 0 {
        return Err(FileSetError::NoVisibleFiles);
    }
    Ok(())
}

/// Non-hidden paths in sorted order (what the file explorer shows).
pub fn visible_paths(files: &FileMap) -> Vec<&str> {
    files
        .iter()
        .filter(|(_, entry)| !entry.hidden)
        .map(|(path, _)| path.as_str())
        .collect()
}

pub fn visible_count(files: &FileMap) -> usize {
    files.values().filter(|entry| !entry.hidden).count()
}

/// Path to show when a project is first opened.
pub fn default_active_path(files: &FileMap) -> Option<String> {
    match files.get(DEFAULT_ACTIVE_FILE) {
        Some(entry) if !entry.hidden => Some(DEFAULT_ACTIVE_FILE.to_string()),
        _ => visible_paths(files).first().map(|p| p.to_string()),
    }
}

pub fn create_file(files: &FileMap, path: &str) -> Result<FileSetChange, FileSetError> {
    validate_path(path)?;
    if files.contains_key(path) {
        return Err(FileSetError::DuplicatePath(path.to_string()));
    }

    let mut next = files.clone();
    next.insert(
        path.to_string(),
        FileEntry::visible(placeholder_content(path)),
    );
    Ok(FileSetChange {
        files: next,
        active_path: path.to_string(),
    })
}

pub fn delete_file(
    files: &FileMap,
    path: &str,
    active_path: &str,
) -> Result<FileSetChange, FileSetError> {
    let Some(entry) = files.get(path) else {
        return Err(FileSetError::NotFound(path.to_string()));
    };
    if !entry.hidden && visible_count(files) <= 1 {
        return Err(FileSetError::LastFile(path.to_string()));
    }

    let mut next = files.clone();
    next.remove(path);

    let active_path = if active_path == path {
        // Non-empty: the guard above leaves at least one visible entry.
        visible_paths(&next)
            .first()
            .map(|p| p.to_string())
            .unwrap_or_default()
    } else {
        active_path.to_string()
    };

    Ok(FileSetChange {
        files: next,
        active_path,
    })
}

pub fn rename_file(
    files: &FileMap,
    old_path: &str,
    new_path: &str,
) -> Result<FileSetChange, FileSetError> {
    if !files.contains_key(old_path) {
        return Err(FileSetError::NotFound(old_path.to_string()));
    }
    if old_path == new_path {
        return Ok(FileSetChange {
            files: files.clone(),
            active_path: new_path.to_string(),
        });
    }
    validate_path(new_path)?;
    if files.contains_key(new_path) {
        return Err(FileSetError::DuplicatePath(new_path.to_string()));
    }

    let mut next = files.clone();
    if let Some(entry) = next.remove(old_path) {
        next.insert(new_path.to_string(), entry);
    }
    Ok(FileSetChange {
        files: next,
        active_path: new_path.to_string(),
    })
}

/// Replace a file's text, keeping its hidden flag.
pub fn update_content(
    files: &FileMap,
    path: &str,
    content: impl Into<String>,
) -> Result<FileMap, FileSetError> {
    let mut next = files.clone();
    match next.get_mut(path) {
        Some(entry) => entry.content = content.into(),
        None => return Err(FileSetError::NotFound(path.to_string())),
    }
    Ok(next)
}

//! Collecting documents from files and directories.

use crate::types::Document;
use qa_core::{AppError, AppResult};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Read every file named by `paths`. Directories are walked recursively in
/// path order, skipping hidden entries.
///
/// A file given directly is named after its file name; a file found by
/// walking a directory is named by its `/`-separated path below that
/// directory, so `v1/readme.md` and `v2/readme.md` stay distinct.
pub fn load_documents(paths: &[PathBuf]) -> AppResult<Vec<Document>> {
    let mut documents = Vec::new();

    for path in paths {
        if path.is_file() {
            documents.push(Document::from_path(path)?);
        } else if path.is_dir() {
            let files: Vec<PathBuf> = WalkDir::new(path)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()))
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .collect();

            tracing::debug!("Found {} files under {:?}", files.len(), path);
            for file in files {
                let name = relative_name(path, &file);
                documents.push(Document::read_as(&file, name)?);
            }
        } else {
            return Err(AppError::Input(format!("No such file or directory: {:?}", path)));
        }
    }

    Ok(documents)
}

fn relative_name(root: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(root).unwrap_or(file);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

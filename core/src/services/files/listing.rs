use std::path::{Path, PathBuf};

use crate::error::FilesError;

#[derive(Debug, Clone, Copy, Default)]
pub struct ListOptions {
    pub show_hidden: bool,
    pub create_missing_folder: bool,
    pub full_path: bool,
}

/// Sorted file names (or paths) directly inside `dir`.
pub async fn get_file_list<P: AsRef<Path>>(
    dir: P,
    options: ListOptions,
) -> Result<Vec<PathBuf>, FilesError> {
    list_entries(dir.as_ref(), options, false).await
}

/// Sorted folder names (or paths) directly inside `dir`.
pub async fn get_folder_list<P: AsRef<Path>>(
    dir: P,
    options: ListOptions,
) -> Result<Vec<PathBuf>, FilesError> {
    list_entries(dir.as_ref(), options, true).await
}

async fn list_entries(
    dir: &Path,
    options: ListOptions,
    folders: bool,
) -> Result<Vec<PathBuf>, FilesError> {
    if !dir.exists() {
        if options.create_missing_folder {
            tokio::fs::create_dir_all(dir).await?;
        }
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let is_dir = entry.file_type().await?.is_dir();
        if is_dir != folders {
            continue;
        }

        let name = entry.file_name();
        if !options.show_hidden && name.to_string_lossy().starts_with('.') {
            continue;
        }
        names.push(PathBuf::from(name));
    }
    names.sort();

    if options.full_path {
        names = names.into_iter().map(|name| dir.join(name)).collect();
    }

    Ok(names)
}

/// Recursively collect files under `dir` ending in `extension` whose name
/// contains `name_contains`.
pub async fn find_target_files<P: AsRef<Path>>(
    dir: P,
    extension: &str,
    name_contains: &str,
) -> Result<Vec<PathBuf>, FilesError> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(FilesError::NotADirectory(dir.to_owned()));
    }

    let mut found = Vec::new();
    let mut pending = vec![dir.to_owned()];

    while let Some(current) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&current).await?;
        let mut subdirs = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                subdirs.push(path);
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(extension) && name.contains(name_contains) {
                found.push(path);
            }
        }

        // keep a top-down walk order
        subdirs.sort();
        pending.extend(subdirs.into_iter().rev());
    }

    if found.is_empty() {
        return Err(FilesError::NoMatches {
            dir: dir.to_owned(),
            extension: extension.trim_start_matches('.').to_owned(),
        });
    }

    found.sort();
    Ok(found)
}

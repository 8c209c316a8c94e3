use std::path::Path;

use crate::error::FilesError;

/// Make sure `path` can be written to.
///
/// An existing file is only overwritten if `confirm_overwrite` agrees.
/// Otherwise the containing folder is created: the path itself when it has
/// no extension, its parent when it does.
pub fn check_save_path<P, F>(path: P, confirm_overwrite: F) -> Result<bool, FilesError>
where
    P: AsRef<Path>,
    F: FnOnce(&Path) -> bool,
{
    let path = path.as_ref();
    if path.exists() {
        tracing::debug!(path = %path.display(), "save path already exists");
        return Ok(confirm_overwrite(path));
    }

    let folder = if path.extension().is_none() {
        Some(path)
    } else {
        path.parent().filter(|dir| !dir.as_os_str().is_empty())
    };

    if let Some(folder) = folder {
        if !folder.exists() {
            std::fs::create_dir_all(folder)?;
            tracing::debug!(folder = %folder.display(), "created folder");
        }
    }

    Ok(true)
}

pub fn check_load_path<P: AsRef<Path>>(path: P) -> Result<(), FilesError> {
    let path = path.as_ref();
    if path.exists() {
        Ok(())
    } else {
        Err(FilesError::NotFound(path.to_owned()))
    }
}

/// Naming pieces of a path: `file.ext`, `file`, and the parent folder's name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathInfo {
    pub file_name: String,
    pub stem: String,
    pub folder_name: String,
}

impl PathInfo {
    pub fn of<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let lossy = |s: Option<&std::ffi::OsStr>| {
            s.map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        };

        Self {
            file_name: lossy(path.file_name()),
            stem: lossy(path.file_stem()),
            folder_name: lossy(path.parent().and_then(Path::file_name)),
        }
    }
}

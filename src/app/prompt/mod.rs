pub mod cli;
pub mod gui;

use std::path::{Path, PathBuf};

use core_vidtile::FilesError;

use cli::Selection;

#[derive(thiserror::Error, Debug)]
pub enum PromptError {
    #[error("not a valid selection (no default available)")]
    NoDefault,

    #[error("selection {0} is not in the list")]
    OutOfRange(String),

    #[error("unrecognized entry: {0}")]
    Unrecognized(String),

    #[error("nothing selected: {0}")]
    Cancelled(String),

    #[error(transparent)]
    Terminal(#[from] dialoguer::Error),

    #[error(transparent)]
    Files(#[from] FilesError),
}

/// Outcome of a file or folder list prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picked {
    pub full_path: PathBuf,
    pub name: String,
    pub created: bool,
}

impl Picked {
    fn from_selection(dir: &Path, selection: Selection) -> Self {
        let (name, created) = match selection {
            Selection::Existing { entry, .. } => (entry, false),
            Selection::Created(entry) => (entry, true),
        };
        Self {
            full_path: dir.join(&name),
            name,
            created,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picked_paths_live_in_the_listed_folder() {
        let picked = Picked::from_selection(
            Path::new("/videos"),
            Selection::Existing {
                index: 0,
                entry: "cam1.avi".into(),
            },
        );
        assert_eq!(picked.full_path, PathBuf::from("/videos/cam1.avi"));
        assert!(!picked.created);

        let picked = Picked::from_selection(Path::new("/videos"), Selection::Created("out".into()));
        assert_eq!(picked.full_path, PathBuf::from("/videos/out"));
        assert_eq!(picked.name, "out");
        assert!(picked.created);
    }
}

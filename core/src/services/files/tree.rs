use std::path::{Path, PathBuf};

use crate::error::FilesError;

/// Nested folder layout, e.g. `logs/{raw, processed/{daily}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderTree {
    pub name: String,
    pub children: Vec<FolderTree>,
}

impl FolderTree {
    pub fn leaf<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn node<S, I>(name: S, children: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = FolderTree>,
    {
        Self {
            name: name.into(),
            children: children.into_iter().collect(),
        }
    }

    /// Every folder path in the tree, parents before children.
    pub fn paths<P: AsRef<Path>>(&self, base: P) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        let mut pending = vec![(base.as_ref().join(&self.name), self)];

        while let Some((path, tree)) = pending.pop() {
            for child in tree.children.iter().rev() {
                pending.push((path.join(&child.name), child));
            }
            paths.push(path);
        }

        paths
    }

    /// Paths for a forest of top-level folders.
    pub fn forest_paths<P: AsRef<Path>>(base: P, forest: &[FolderTree]) -> Vec<PathBuf> {
        forest
            .iter()
            .flat_map(|tree| tree.paths(base.as_ref()))
            .collect()
    }
}

pub fn create_folders<I, P>(paths: I) -> Result<(), FilesError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    for path in paths {
        std::fs::create_dir_all(path.as_ref())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> Vec<FolderTree> {
        vec![
            FolderTree::node(
                "logs",
                [
                    FolderTree::leaf("raw"),
                    FolderTree::node("processed", [FolderTree::leaf("daily")]),
                ],
            ),
            FolderTree::leaf("videos"),
        ]
    }

    #[test]
    fn paths_are_depth_first() {
        let paths = FolderTree::forest_paths("/data", &layout());
        assert_eq!(
            paths,
            [
                PathBuf::from("/data/logs"),
                PathBuf::from("/data/logs/raw"),
                PathBuf::from("/data/logs/processed"),
                PathBuf::from("/data/logs/processed/daily"),
                PathBuf::from("/data/videos"),
            ]
        );
    }

    #[test]
    fn listing_paths_touches_nothing() {
        let base = std::env::temp_dir().join(format!("vidtile-tree-dry-{}", std::process::id()));
        let _ = FolderTree::forest_paths(&base, &layout());
        assert!(!base.exists());
    }

    #[test]
    fn folders_are_created_on_request() {
        let base = std::env::temp_dir().join(format!("vidtile-tree-{}", std::process::id()));
        create_folders(FolderTree::forest_paths(&base, &layout())).unwrap();

        assert!(base.join("logs/processed/daily").is_dir());
        assert!(base.join("videos").is_dir());

        std::fs::remove_dir_all(&base).unwrap();
    }
}

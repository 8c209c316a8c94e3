use std::{fmt, path::PathBuf};

use core_vidtile::services::video;

/// A video offered for selection.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Video {
    pub name: String,
    pub path: PathBuf,
    /// KiB
    pub size: usize,
    pub is_selected: bool,
}

impl From<&video::Video> for Video {
    fn from(value: &video::Video) -> Self {
        Self {
            name: value.name.to_owned(),
            path: value.path.to_owned(),
            size: value.size,
            is_selected: true,
        }
    }
}

impl fmt::Display for Video {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.size >= 1024 {
            write!(f, "{} ({:.1} MiB)", self.name, self.size as f64 / 1024.0)
        } else {
            write!(f, "{} ({} KiB)", self.name, self.size)
        }
    }
}

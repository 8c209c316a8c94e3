use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

const MEDIA_TYPE_VIDEOS: &[&str] = &[
    "mpeg", "mpg", "mp4", "m4v", "avi", "mov", "mkv", "ogg", "webm", "flv", "h264",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Video {
    pub name: String,
    pub path: PathBuf,
    /// KiB
    pub size: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct VideoService;

impl VideoService {
    /// Video files directly inside `dir`, sorted by name.
    pub async fn search_videos<P: AsRef<Path>>(dir: P) -> Result<Vec<Video>> {
        let dir = dir.as_ref();
        let mut videos = Vec::new();
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .with_context(|| format!("failed to read {}", dir.display()))?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let metadata = tokio::fs::metadata(&path).await?;

            if metadata.is_dir() || !Self::is_video(&path) {
                continue;
            }

            videos.push(Video {
                name: entry.file_name().to_string_lossy().into_owned(),
                path,
                size: (metadata.len() as f64 / 1024.0_f64).round() as usize,
            });
        }

        videos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(videos)
    }

    pub fn is_video(entry: &Path) -> bool {
        match entry.extension() {
            Some(ext) => MEDIA_TYPE_VIDEOS.contains(&ext.to_string_lossy().to_lowercase().as_str()),
            None => false,
        }
    }
}

use std::{fmt, path::PathBuf};

use crate::services::tiling::Dimensions;

/// Stream properties probed when a source is opened.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub frame_count: u64,
    pub frame_rate: f64,
    pub source_name: String,
    pub path: PathBuf,
}

impl VideoInfo {
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    pub fn duration_secs(&self) -> f64 {
        if self.frame_rate > 0.0 {
            self.frame_count as f64 / self.frame_rate
        } else {
            0.0
        }
    }

    pub fn folder(&self) -> String {
        self.path
            .parent()
            .map(|dir| dir.display().to_string())
            .unwrap_or_default()
    }
}

impl fmt::Display for VideoInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "********** Video Reader **********")?;
        writeln!(f, "File: {}", self.source_name)?;
        writeln!(f, "From: {}", self.folder())?;
        writeln!(f, "Dimensions: {}", self.dimensions())?;
        writeln!(f, "Framerate: {:.3}", self.frame_rate)?;
        writeln!(f, "Frame count: {}", self.frame_count)?;
        write!(f, "**********************************")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> VideoInfo {
        VideoInfo {
            width: 640,
            height: 480,
            frame_count: 300,
            frame_rate: 30.0,
            source_name: "cam.avi".into(),
            path: PathBuf::from("/videos/cam.avi"),
        }
    }

    #[test]
    fn duration_follows_rate() {
        assert_eq!(info().duration_secs(), 10.0);
        let still = VideoInfo {
            frame_rate: 0.0,
            ..info()
        };
        assert_eq!(still.duration_secs(), 0.0);
    }

    #[test]
    fn summary_lists_the_fields() {
        let text = info().to_string();
        assert!(text.contains("File: cam.avi"));
        assert!(text.contains("From: /videos"));
        assert!(text.contains("Dimensions: 640 x 480"));
        assert!(text.contains("Frame count: 300"));
    }
}

use std::path::PathBuf;

use ffmpeg_next as ffmpeg;

#[derive(thiserror::Error, Debug)]
pub enum TilingError {
    #[error("no sources to tile")]
    NoSources,

    #[error("grid must have at least one row and one column (got {rows}x{columns})")]
    EmptyGrid { rows: u32, columns: u32 },

    #[error("couldn't parse dimensions: {0:?}")]
    InvalidDimensions(String),

    #[error("{frames} frames don't fit in a {rows}x{columns} grid")]
    TooManyFrames { frames: usize, rows: u32, columns: u32 },

    #[error("tile is {actual_width}x{actual_height}, expected {width}x{height}")]
    TileMismatch {
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

#[derive(thiserror::Error, Debug)]
pub enum VideoError {
    #[error("couldn't find video: {}", .0.display())]
    NotFound(PathBuf),

    #[error("no video stream in {}", .0.display())]
    NoVideoStream(PathBuf),

    #[error("video source is closed: {}", .0.display())]
    Closed(PathBuf),

    #[error("invalid codec tag: {0:?}")]
    InvalidFourCc(String),

    #[error("no encoder available for codec tag {0}")]
    EncoderNotFound(String),

    #[error("frame is {actual_width}x{actual_height}, recorder expects {width}x{height}")]
    FrameSize {
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("frame buffer doesn't match {width}x{height}")]
    BufferSize { width: u32, height: u32 },

    #[error("frame rate must be positive (got {0})")]
    InvalidFrameRate(f64),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Ffmpeg(#[from] ffmpeg::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum FilesError {
    #[error("path doesn't exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("top directory doesn't exist: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("no .{extension} files found in {}", .dir.display())]
    NoMatches { dir: PathBuf, extension: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("session is already closed")]
    Closed,

    #[error("expected {expected} sample sequences, got {actual}")]
    PlanMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Tiling(#[from] TilingError),

    #[error(transparent)]
    Video(#[from] VideoError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_name_the_problem() {
        assert!(TilingError::NoSources.to_string().contains("no sources"));
        assert!(VideoError::NotFound("a.mp4".into())
            .to_string()
            .contains("a.mp4"));
        assert!(FilesError::NoMatches {
            dir: "/tmp".into(),
            extension: "log".into(),
        }
        .to_string()
        .contains(".log"));
    }

    #[test]
    fn session_error_wraps_sources() {
        let err = SessionError::from(TilingError::EmptyGrid { rows: 0, columns: 2 });
        assert!(err.to_string().contains("0x2"));
    }
}

use image::RgbImage;

use crate::{
    error::VideoError,
    services::video::{VideoInfo, VideoReader, VideoRecorder},
};

/// Sequential frame input.
pub trait FrameSource {
    fn info(&self) -> &VideoInfo;
    /// `Ok(None)` once no frames are left.
    fn read(&mut self) -> Result<Option<RgbImage>, VideoError>;
    fn release(&mut self);
}

/// Frame output. `close` must be idempotent.
pub trait FrameSink {
    /// Returns whether the frame was kept.
    fn write(&mut self, frame: &RgbImage) -> Result<bool, VideoError>;
    fn close(&mut self) -> Result<(), VideoError>;
}

impl FrameSource for VideoReader {
    fn info(&self) -> &VideoInfo {
        VideoReader::info(self)
    }

    fn read(&mut self) -> Result<Option<RgbImage>, VideoError> {
        VideoReader::read(self)
    }

    fn release(&mut self) {
        VideoReader::release(self)
    }
}

impl FrameSink for VideoRecorder {
    fn write(&mut self, frame: &RgbImage) -> Result<bool, VideoError> {
        // composites are already sized to the plan
        VideoRecorder::write(self, frame, false)
    }

    fn close(&mut self) -> Result<(), VideoError> {
        VideoRecorder::close(self)
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn info(&self) -> &VideoInfo {
        (**self).info()
    }

    fn read(&mut self) -> Result<Option<RgbImage>, VideoError> {
        (**self).read()
    }

    fn release(&mut self) {
        (**self).release()
    }
}

impl<K: FrameSink + ?Sized> FrameSink for Box<K> {
    fn write(&mut self, frame: &RgbImage) -> Result<bool, VideoError> {
        (**self).write(frame)
    }

    fn close(&mut self) -> Result<(), VideoError> {
        (**self).close()
    }
}

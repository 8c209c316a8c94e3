use image::RgbImage;

use super::traits::FrameSource;
use crate::error::VideoError;

/// Walks a source forward to requested frame indices.
pub(crate) struct SourceCursor<S> {
    source: S,
    next_index: u64,
    last: Option<(u64, RgbImage)>,
    exhausted: bool,
}

impl<S: FrameSource> SourceCursor<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            next_index: 0,
            last: None,
            exhausted: false,
        }
    }

    /// Frame at `target`, decoding forward as needed.
    ///
    /// A target at or behind the last decoded frame returns that frame again.
    /// `None` means the source ran out first.
    pub fn frame_at(&mut self, target: u64) -> Result<Option<&RgbImage>, VideoError> {
        let behind = matches!(&self.last, Some((index, _)) if *index >= target);

        if !behind {
            if self.exhausted {
                return Ok(None);
            }

            loop {
                let Some(frame) = self.source.read()? else {
                    self.exhausted = true;
                    tracing::warn!(
                        source = %self.source.info().source_name,
                        frame = self.next_index,
                        target,
                        "source ended before target frame"
                    );
                    return Ok(None);
                };

                let index = self.next_index;
                self.next_index += 1;
                self.last = Some((index, frame));
                if index >= target {
                    break;
                }
            }
        }

        Ok(self.last.as_ref().map(|(_, frame)| frame))
    }

    /// Most recently decoded frame, if any. After the source runs out this
    /// is its final frame.
    pub fn held(&self) -> Option<&RgbImage> {
        self.last.as_ref().map(|(_, frame)| frame)
    }

    pub fn release(&mut self) {
        self.source.release();
        self.last = None;
    }
}

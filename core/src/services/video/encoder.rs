use std::{
    fmt,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use ffmpeg_next as ffmpeg;
use ffmpeg::{codec, encoder, format, software::scaling, util::frame, Packet, Rational};
use image::{imageops, RgbImage};
use time::{macros::format_description, OffsetDateTime};

use super::fourcc::FourCc;
use crate::{error::VideoError, services::tiling::Dimensions};

const SEPARATOR: &str = "************************************";

#[derive(Debug, Clone)]
pub struct RecorderConfig {
    pub path: PathBuf,
    pub frame_rate: f64,
    /// Taken from the first written frame when unset.
    pub frame_size: Option<Dimensions>,
    pub codec: FourCc,
    pub enabled: bool,
}

impl RecorderConfig {
    pub fn new<P: Into<PathBuf>>(path: P, frame_rate: f64) -> Self {
        Self {
            path: path.into(),
            frame_rate,
            frame_size: None,
            codec: FourCc::default(),
            enabled: true,
        }
    }

    pub fn frame_size(mut self, size: Dimensions) -> Self {
        self.frame_size = Some(size);
        self
    }

    pub fn codec(mut self, codec: FourCc) -> Self {
        self.codec = codec;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

struct EncodeState {
    output: format::context::Output,
    encoder: encoder::video::Encoder,
    scaler: scaling::Context,
    stream_index: usize,
    frame_time_base: Rational,
    stream_time_base: Rational,
    next_pts: i64,
}

impl EncodeState {
    fn create(config: &RecorderConfig, size: Dimensions) -> Result<Self, VideoError> {
        ffmpeg::init()?;

        if let Some(dir) = config.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }

        let codec = encoder::find(config.codec.codec_id()?)
            .ok_or_else(|| VideoError::EncoderNotFound(config.codec.to_string()))?;
        let pixel_format = config.codec.pixel_format();

        // 4:2:0 chroma needs even sides
        let encoded = Dimensions::new((size.width & !1).max(2), (size.height & !1).max(2));
        if encoded != size {
            tracing::warn!(from = %size, to = %encoded, "frame size rounded down to even sides");
        }

        let mut output = format::output(&config.path)?;
        let global_header = output
            .format()
            .flags()
            .contains(format::Flags::GLOBAL_HEADER);

        let frame_rate = Rational::from(config.frame_rate);
        let frame_time_base = frame_rate.invert();

        let mut stream = output.add_stream(codec)?;
        let stream_index = stream.index();

        let mut video = codec::context::Context::from_parameters(stream.parameters())?
            .encoder()
            .video()?;
        video.set_width(encoded.width);
        video.set_height(encoded.height);
        video.set_format(pixel_format);
        video.set_time_base(frame_time_base);
        video.set_frame_rate(Some(frame_rate));
        if global_header {
            video.set_flags(codec::Flags::GLOBAL_HEADER);
        }

        let encoder = video.open_as(codec)?;
        stream.set_parameters(&encoder);
        stream.set_time_base(frame_time_base);

        output.write_header()?;
        let stream_time_base = output
            .stream(stream_index)
            .map(|stream| stream.time_base())
            .unwrap_or(frame_time_base);

        let scaler = scaling::Context::get(
            format::Pixel::RGB24,
            size.width,
            size.height,
            pixel_format,
            encoded.width,
            encoded.height,
            scaling::Flags::BILINEAR,
        )?;

        tracing::debug!(
            path = %config.path.display(),
            codec = %config.codec,
            size = %encoded,
            fps = config.frame_rate,
            "created video writer"
        );

        Ok(Self {
            output,
            encoder,
            scaler,
            stream_index,
            frame_time_base,
            stream_time_base,
            next_pts: 0,
        })
    }

    fn encode(&mut self, image: &RgbImage) -> Result<(), VideoError> {
        let rgb_frame = image_to_frame(image);
        let mut converted = frame::Video::empty();
        self.scaler.run(&rgb_frame, &mut converted)?;

        converted.set_pts(Some(self.next_pts));
        self.next_pts += 1;

        self.encoder.send_frame(&converted)?;
        self.drain()
    }

    fn drain(&mut self) -> Result<(), VideoError> {
        let mut packet = Packet::empty();
        while self.encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(self.stream_index);
            packet.rescale_ts(self.frame_time_base, self.stream_time_base);
            packet.write_interleaved(&mut self.output)?;
        }
        Ok(())
    }

    fn finish(mut self) -> Result<(), VideoError> {
        self.encoder.send_eof()?;
        self.drain()?;
        self.output.write_trailer()?;
        Ok(())
    }
}

/// Video file writer with lazy sizing, optional resizing and timelapse.
///
/// The underlying file is flushed and closed by [`VideoRecorder::close`] or,
/// failing that, when the recorder is dropped.
pub struct VideoRecorder {
    config: RecorderConfig,
    state: Option<EncodeState>,
    offered: u64,
    written: u64,
    timelapse: Option<u32>,
    started: Instant,
    started_at: OffsetDateTime,
    elapsed: Option<Duration>,
    closed: bool,
}

impl VideoRecorder {
    pub fn new(config: RecorderConfig) -> Result<Self, VideoError> {
        if config.enabled {
            if !(config.frame_rate > 0.0) {
                return Err(VideoError::InvalidFrameRate(config.frame_rate));
            }
            config.codec.codec_id()?;
        }

        let mut recorder = Self {
            config,
            state: None,
            offered: 0,
            written: 0,
            timelapse: None,
            started: Instant::now(),
            started_at: OffsetDateTime::now_local().unwrap_or_else(|err| {
                tracing::debug!("no local time offset, using UTC: {err}");
                OffsetDateTime::now_utc()
            }),
            elapsed: None,
            closed: false,
        };

        if let (true, Some(size)) = (recorder.config.enabled, recorder.config.frame_size) {
            recorder.state = Some(EncodeState::create(&recorder.config, size)?);
        }

        Ok(recorder)
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn frame_size(&self) -> Option<Dimensions> {
        self.config.frame_size
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    /// Keep only every `factor`-th frame passed to [`VideoRecorder::write`].
    pub fn set_timelapse(&mut self, factor: u32) {
        self.offered = 0;
        self.timelapse = Some(factor.max(1));
    }

    /// Returns whether the frame ended up in the file.
    pub fn write(&mut self, frame: &RgbImage, auto_resize: bool) -> Result<bool, VideoError> {
        if !self.config.enabled {
            return Ok(false);
        }
        if self.closed {
            return Err(VideoError::Closed(self.config.path.clone()));
        }

        if let Some(factor) = self.timelapse {
            let skip = self.offered % factor as u64 != 0;
            self.offered += 1;
            if skip {
                return Ok(false);
            }
        }

        let size = *self
            .config
            .frame_size
            .get_or_insert_with(|| Dimensions::new(frame.width(), frame.height()));

        let resized;
        let frame = if frame.dimensions() != (size.width, size.height) {
            if !auto_resize {
                return Err(VideoError::FrameSize {
                    width: size.width,
                    height: size.height,
                    actual_width: frame.width(),
                    actual_height: frame.height(),
                });
            }
            resized = imageops::resize(
                frame,
                size.width,
                size.height,
                imageops::FilterType::Triangle,
            );
            &resized
        } else {
            frame
        };

        if self.state.is_none() {
            self.state = Some(EncodeState::create(&self.config, size)?);
        }
        if let Some(state) = self.state.as_mut() {
            state.encode(frame)?;
            self.written += 1;
        }

        Ok(true)
    }

    /// Flush and close the file. Safe to call more than once.
    pub fn close(&mut self) -> Result<(), VideoError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.elapsed = Some(self.started.elapsed());

        if let Some(state) = self.state.take() {
            state.finish()?;
            tracing::info!(
                path = %self.config.path.display(),
                frames = self.written,
                "recording closed"
            );
        }

        Ok(())
    }

    pub fn release(&mut self) -> Result<(), VideoError> {
        self.close()
    }

    pub fn report_start(&self) -> RecordingReport {
        if !self.config.enabled {
            return RecordingReport::disabled();
        }

        RecordingReport {
            message: "Recording started".into(),
            path: Some(self.config.path.clone()),
            codec: Some(self.config.codec),
            started_at: Some(self.started_at),
            elapsed: None,
            frames: None,
        }
    }

    /// `None` for disabled recorders.
    pub fn report_end(&self) -> Option<RecordingReport> {
        if !self.config.enabled {
            return None;
        }

        Some(RecordingReport {
            message: "Recording finished!".into(),
            path: None,
            codec: None,
            started_at: None,
            elapsed: Some(self.elapsed.unwrap_or_else(|| self.started.elapsed())),
            frames: Some(self.written),
        })
    }
}

impl Drop for VideoRecorder {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            tracing::error!(
                path = %self.config.path.display(),
                "failed to finish recording: {err}"
            );
        }
    }
}

/// Banner printed around a recording.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingReport {
    pub message: String,
    pub path: Option<PathBuf>,
    pub codec: Option<FourCc>,
    pub started_at: Option<OffsetDateTime>,
    pub elapsed: Option<Duration>,
    pub frames: Option<u64>,
}

impl RecordingReport {
    fn disabled() -> Self {
        Self {
            message: "RECORDING DISABLED".into(),
            path: None,
            codec: None,
            started_at: None,
            elapsed: None,
            frames: None,
        }
    }
}

impl fmt::Display for RecordingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{SEPARATOR}")?;
        writeln!(f, "{}", self.message)?;
        if let Some(path) = &self.path {
            writeln!(f, "  Path: {}", path.display())?;
        }
        if let Some(codec) = &self.codec {
            writeln!(f, "  Codec: {codec}")?;
        }
        if let Some(started_at) = self.started_at {
            let stamp = started_at
                .format(format_description!(
                    "[year]/[month]/[day] [hour]:[minute]:[second]"
                ))
                .map_err(|_| fmt::Error)?;
            writeln!(f, "  Time: {stamp}")?;
        }
        if let Some(frames) = self.frames {
            writeln!(f, "  Frames: {frames}")?;
        }
        if let Some(elapsed) = self.elapsed {
            writeln!(f, "  Elapsed: {:.1}s", elapsed.as_secs_f64())?;
        }
        write!(f, "{SEPARATOR}")
    }
}

/// Copy an image into a freshly allocated RGB24 frame, honoring its stride.
fn image_to_frame(image: &RgbImage) -> frame::Video {
    let (width, height) = image.dimensions();
    let mut rgb_frame = frame::Video::new(format::Pixel::RGB24, width, height);
    let row_len = width as usize * 3;
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data_mut(0);

    for (row, pixels) in image.as_raw().chunks_exact(row_len).enumerate() {
        let start = row * stride;
        data[start..start + row_len].copy_from_slice(pixels);
    }

    rgb_frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::video::decoder::frame_to_image;
    use image::Rgb;

    #[test]
    fn disabled_recorder_drops_frames() {
        let config = RecorderConfig::new("/nowhere/out.avi", 30.0).enabled(false);
        let mut recorder = VideoRecorder::new(config).unwrap();
        let frame = RgbImage::new(8, 8);

        assert!(!recorder.write(&frame, true).unwrap());
        assert_eq!(recorder.written(), 0);
        assert_eq!(recorder.report_start().message, "RECORDING DISABLED");
        assert!(recorder.report_end().is_none());
        recorder.close().unwrap();
    }

    #[test]
    fn invalid_settings_are_rejected_up_front() {
        let zero_rate = RecorderConfig::new("out.avi", 0.0);
        assert!(matches!(
            VideoRecorder::new(zero_rate),
            Err(VideoError::InvalidFrameRate(_))
        ));

        let unknown = RecorderConfig::new("out.avi", 30.0).codec("ABCD".parse().unwrap());
        assert!(matches!(
            VideoRecorder::new(unknown),
            Err(VideoError::EncoderNotFound(_))
        ));
    }

    #[test]
    fn image_survives_the_frame_copy() {
        let mut image = RgbImage::new(5, 3);
        image.put_pixel(4, 2, Rgb([1, 2, 3]));
        image.put_pixel(0, 1, Rgb([7, 8, 9]));

        let copy = frame_to_image(&image_to_frame(&image)).unwrap();
        assert_eq!(copy, image);
    }

    #[test]
    fn report_lists_what_is_known() {
        let report = RecordingReport {
            message: "Recording started".into(),
            path: Some("/tmp/tiled.avi".into()),
            codec: Some(FourCc::X264),
            started_at: Some(time::macros::datetime!(2024-03-05 14:07:09 UTC)),
            elapsed: None,
            frames: None,
        };
        let text = report.to_string();

        assert!(text.starts_with(SEPARATOR));
        assert!(text.contains("  Path: /tmp/tiled.avi"));
        assert!(text.contains("  Codec: X264"));
        assert!(text.contains("  Time: 2024/03/05 14:07:09"));
        assert!(!text.contains("Frames"));

        let done = RecordingReport {
            message: "Recording finished!".into(),
            path: None,
            codec: None,
            started_at: None,
            elapsed: Some(Duration::from_millis(2500)),
            frames: Some(12),
        };
        let text = done.to_string();
        assert!(text.contains("  Frames: 12"));
        assert!(text.contains("  Elapsed: 2.5s"));
        assert!(!text.contains("Time:"));
    }
}

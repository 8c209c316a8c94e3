use std::{
    fmt,
    path::{Path, PathBuf},
};

use ffmpeg_next as ffmpeg;
use ffmpeg::{
    codec::{self, threading},
    format::{self, Pixel},
    media::Type,
    software::scaling,
    util::frame,
    Rational,
};
use image::RgbImage;

use super::info::VideoInfo;
use crate::error::VideoError;

const AV_TIME_BASE: f64 = 1_000_000.0;

struct DecodeState {
    input: format::context::Input,
    decoder: ffmpeg::decoder::Video,
    scaler: scaling::Context,
    stream_index: usize,
    eof_sent: bool,
}

impl DecodeState {
    fn open(path: &Path) -> Result<(Self, VideoInfo), VideoError> {
        ffmpeg::init()?;
        let input = format::input(&path)?;

        let (stream_index, frame_rate, frame_count, decoder) = {
            let stream = input
                .streams()
                .best(Type::Video)
                .ok_or_else(|| VideoError::NoVideoStream(path.to_owned()))?;

            let frame_rate = rate_to_f64(stream.avg_frame_rate())
                .or_else(|| rate_to_f64(stream.rate()))
                .unwrap_or(0.0);

            let frame_count = if stream.frames() > 0 {
                stream.frames() as u64
            } else {
                // container doesn't store a count, estimate from the duration
                let duration = if stream.duration() > 0 {
                    stream.duration() as f64 * f64::from(stream.time_base())
                } else {
                    input.duration().max(0) as f64 / AV_TIME_BASE
                };
                (duration * frame_rate).round() as u64
            };

            let mut context = codec::context::Context::from_parameters(stream.parameters())?;
            let mut threads = threading::Config::kind(threading::Type::Frame);
            threads.count = num_cpus::get();
            context.set_threading(threads);
            let decoder = context.decoder().video()?;

            (stream.index(), frame_rate, frame_count, decoder)
        };

        let scaler = scaling::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            scaling::Flags::BILINEAR,
        )?;

        let info = VideoInfo {
            width: decoder.width(),
            height: decoder.height(),
            frame_count,
            frame_rate,
            source_name: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path: path.to_owned(),
        };

        let state = Self {
            input,
            decoder,
            scaler,
            stream_index,
            eof_sent: false,
        };

        Ok((state, info))
    }

    /// Push the next video packet (or EOF) into the decoder.
    fn feed(&mut self) -> Result<(), VideoError> {
        let stream_index = self.stream_index;
        let packet = self
            .input
            .packets()
            .find_map(|(stream, packet)| (stream.index() == stream_index).then_some(packet));

        match packet {
            Some(packet) => {
                if let Err(err) = self.decoder.send_packet(&packet) {
                    tracing::warn!("skipping undecodable packet: {err}");
                }
            }
            None => {
                self.decoder.send_eof()?;
                self.eof_sent = true;
            }
        }

        Ok(())
    }

    fn convert(&mut self, decoded: &frame::Video) -> Result<RgbImage, VideoError> {
        let mut rgb_frame = frame::Video::empty();
        self.scaler.run(decoded, &mut rgb_frame)?;
        frame_to_image(&rgb_frame)
    }
}

/// Sequential reader over the best video stream of a file.
pub struct VideoReader {
    info: VideoInfo,
    state: Option<DecodeState>,
    position: u64,
}

impl VideoReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, VideoError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(VideoError::NotFound(path.to_owned()));
        }

        let (state, info) = DecodeState::open(path)?;
        tracing::debug!(
            path = %path.display(),
            width = info.width,
            height = info.height,
            frames = info.frame_count,
            fps = info.frame_rate,
            "opened video"
        );

        Ok(Self {
            info,
            state: Some(state),
            position: 0,
        })
    }

    /// Open just long enough to read the stream properties.
    pub fn probe<P: AsRef<Path>>(path: P) -> Result<VideoInfo, VideoError> {
        let mut reader = Self::open(path)?;
        reader.release();
        Ok(reader.info)
    }

    pub fn info(&self) -> &VideoInfo {
        &self.info
    }

    pub fn path(&self) -> &PathBuf {
        &self.info.path
    }

    /// Next frame, or `None` once the source is exhausted.
    pub fn read(&mut self) -> Result<Option<RgbImage>, VideoError> {
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| VideoError::Closed(self.info.path.clone()))?;

        let mut decoded = frame::Video::empty();
        loop {
            if state.decoder.receive_frame(&mut decoded).is_ok() {
                let image = state.convert(&decoded)?;
                self.position += 1;
                return Ok(Some(image));
            }

            if state.eof_sent {
                return Ok(None);
            }

            state.feed()?;
        }
    }

    pub fn release(&mut self) {
        if self.state.take().is_some() {
            tracing::debug!(path = %self.info.path.display(), "released video");
        }
    }

    pub fn close(&mut self) {
        self.release();
    }

    pub fn reopen(&mut self) -> Result<(), VideoError> {
        self.release();
        let (state, info) = DecodeState::open(&self.info.path)?;
        self.state = Some(state);
        self.info = info;
        self.position = 0;
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.state.is_some()
    }

    /// Index of the next frame `read` will return.
    pub fn current_frame(&self) -> u64 {
        self.position
    }

    /// Decodes forward to `index`; seeking backwards restarts the stream.
    pub fn set_current_frame(&mut self, index: u64) -> Result<(), VideoError> {
        if index < self.position || !self.is_open() {
            self.reopen()?;
        }

        while self.position < index {
            if self.read()?.is_none() {
                break;
            }
        }

        Ok(())
    }

    pub fn set_current_progress(&mut self, fraction: f64) -> Result<(), VideoError> {
        let last = self.info.frame_count.saturating_sub(1) as f64;
        let index = (last * fraction.clamp(0.0, 1.0)).round() as u64;
        self.set_current_frame(index)
    }

    pub fn current_progress(&self) -> f64 {
        match self.info.frame_count {
            0 | 1 => 0.0,
            count => self.position as f64 / (count - 1) as f64,
        }
    }

    pub fn current_time_secs(&self) -> f64 {
        if self.info.frame_rate > 0.0 {
            self.position as f64 / self.info.frame_rate
        } else {
            0.0
        }
    }
}

impl fmt::Display for VideoReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.info, f)
    }
}

fn rate_to_f64(rate: Rational) -> Option<f64> {
    (rate.numerator() > 0 && rate.denominator() > 0).then(|| f64::from(rate))
}

/// Copy an RGB24 frame into an image, dropping the row padding.
pub(crate) fn frame_to_image(frame: &frame::Video) -> Result<RgbImage, VideoError> {
    let (width, height) = (frame.width(), frame.height());
    let row_len = width as usize * 3;
    let stride = frame.stride(0);

    let mut pixels = Vec::with_capacity(row_len * height as usize);
    for row in frame.data(0).chunks(stride).take(height as usize) {
        let row = row
            .get(..row_len)
            .ok_or(VideoError::BufferSize { width, height })?;
        pixels.extend_from_slice(row);
    }

    RgbImage::from_raw(width, height, pixels).ok_or(VideoError::BufferSize { width, height })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_reported() {
        let err = VideoReader::open("/definitely/not/here.mp4").err().unwrap();
        assert!(matches!(err, VideoError::NotFound(_)));
    }

    #[test]
    fn frame_rows_skip_padding() {
        let mut frame = frame::Video::new(Pixel::RGB24, 3, 2);
        let stride = frame.stride(0);
        let data = frame.data_mut(0);
        for row in 0..2 {
            for byte in 0..9 {
                data[row * stride + byte] = (row * 10 + byte) as u8;
            }
        }

        let image = frame_to_image(&frame).unwrap();
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(image.get_pixel(0, 0).0, [0, 1, 2]);
        assert_eq!(image.get_pixel(2, 1).0, [16, 17, 18]);
    }

    #[test]
    fn invalid_rates_are_ignored() {
        assert_eq!(rate_to_f64(Rational::new(0, 1)), None);
        assert_eq!(rate_to_f64(Rational::new(30, 0)), None);
        assert_eq!(rate_to_f64(Rational::new(30, 1)), Some(30.0));
    }
}

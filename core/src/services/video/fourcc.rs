use std::{fmt, str::FromStr};

use ffmpeg_next as ffmpeg;
use ffmpeg::{codec, format::Pixel};
use serde::{Deserialize, Serialize};

use crate::error::VideoError;

/// Four-character code naming the output codec, e.g. `X264` or `MJPG`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FourCc([u8; 4]);

impl FourCc {
    pub const X264: FourCc = FourCc(*b"X264");
    pub const MJPG: FourCc = FourCc(*b"MJPG");

    pub fn as_str(&self) -> &str {
        // only ascii is ever stored
        std::str::from_utf8(&self.0).unwrap_or("????")
    }

    pub fn codec_id(&self) -> Result<codec::Id, VideoError> {
        let upper = self.0.to_ascii_uppercase();
        let id = match upper.as_slice() {
            b"X264" | b"H264" | b"AVC1" => codec::Id::H264,
            b"MJPG" => codec::Id::MJPEG,
            b"XVID" | b"DIVX" | b"MP4V" | b"FMP4" => codec::Id::MPEG4,
            b"FFV1" => codec::Id::FFV1,
            _ => return Err(VideoError::EncoderNotFound(self.to_string())),
        };
        Ok(id)
    }

    /// Pixel format handed to the encoder.
    pub fn pixel_format(&self) -> Pixel {
        match self.codec_id() {
            Ok(codec::Id::MJPEG) => Pixel::YUVJ420P,
            _ => Pixel::YUV420P,
        }
    }
}

impl Default for FourCc {
    fn default() -> Self {
        Self::X264
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FourCc {
    type Err = VideoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes: [u8; 4] = s
            .as_bytes()
            .try_into()
            .map_err(|_| VideoError::InvalidFourCc(s.to_owned()))?;

        if !bytes.iter().all(|b| b.is_ascii_graphic()) {
            return Err(VideoError::InvalidFourCc(s.to_owned()));
        }

        Ok(Self(bytes))
    }
}

impl TryFrom<String> for FourCc {
    type Error = VideoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FourCc> for String {
    fn from(value: FourCc) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tags_map_to_encoders() {
        assert_eq!(FourCc::X264.codec_id().unwrap(), codec::Id::H264);
        assert_eq!("avc1".parse::<FourCc>().unwrap().codec_id().unwrap(), codec::Id::H264);
        assert_eq!(FourCc::MJPG.codec_id().unwrap(), codec::Id::MJPEG);
        assert_eq!("XVID".parse::<FourCc>().unwrap().codec_id().unwrap(), codec::Id::MPEG4);
    }

    #[test]
    fn unknown_tag_has_no_encoder() {
        let tag: FourCc = "ABCD".parse().unwrap();
        assert!(matches!(tag.codec_id(), Err(VideoError::EncoderNotFound(_))));
    }

    #[test]
    fn tags_must_be_four_printable_chars() {
        assert!("X26".parse::<FourCc>().is_err());
        assert!("X2645".parse::<FourCc>().is_err());
        assert!("X2 4".parse::<FourCc>().is_err());
        assert_eq!("mjpg".parse::<FourCc>().unwrap().to_string(), "mjpg");
    }

    #[test]
    fn mjpeg_uses_full_range_yuv() {
        assert_eq!(FourCc::MJPG.pixel_format(), Pixel::YUVJ420P);
        assert_eq!(FourCc::X264.pixel_format(), Pixel::YUV420P);
    }
}

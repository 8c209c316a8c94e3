pub(crate) mod decoder;
pub(crate) mod encoder;
pub(crate) mod fourcc;
pub(crate) mod info;
pub(crate) mod service;

pub use decoder::VideoReader;
pub use encoder::{RecorderConfig, RecordingReport, VideoRecorder};
pub use fourcc::FourCc;
pub use info::VideoInfo;
pub use service::{Video, VideoService};

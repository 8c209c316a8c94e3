pub(crate) mod cursor;
pub(crate) mod session;
pub(crate) mod traits;

pub use session::{
    EndReason, ExhaustedPolicy, Progress, SessionOptions, SessionState, SessionSummary, TileSession,
};
pub use traits::{FrameSink, FrameSource};

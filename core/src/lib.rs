pub mod error;
pub mod services;

pub use error::{FilesError, SessionError, TilingError, VideoError};

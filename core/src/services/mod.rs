pub mod files;
pub mod record;
pub mod tiling;
pub mod video;

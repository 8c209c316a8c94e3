pub const APP_NAME: &str = "vidtile";
pub const APP_ID: &str = "com.github.vidtile.Vidtile";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod info;
pub mod settings;
pub mod setup;

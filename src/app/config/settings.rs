use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use core_vidtile::services::{
    record::ExhaustedPolicy,
    tiling::{Dimensions, Divider, ResizeFilter, DEFAULT_MAX_OUTPUT},
    video::FourCc,
};

use super::info::APP_NAME;

/// `~/.config/vidtile/settings.toml`, or the platform equivalent.
pub static SETTINGS_PATH: Lazy<Option<PathBuf>> = Lazy::new(|| {
    let config_dir = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("APPDATA").map(PathBuf::from))
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
    Some(config_dir.join(APP_NAME).join("settings.toml"))
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub fps: f64,
    pub columns: u32,
    pub max_output: Dimensions,
    pub codec: FourCc,
    pub output_name: String,
    pub search_dir: Option<PathBuf>,
    pub filter: ResizeFilter,
    pub on_exhausted: ExhaustedPolicy,
    pub dividers: bool,
    pub divider: Divider,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fps: 30.0,
            columns: 2,
            max_output: DEFAULT_MAX_OUTPUT,
            codec: FourCc::default(),
            output_name: "tiled.avi".into(),
            search_dir: None,
            filter: ResizeFilter::default(),
            on_exhausted: ExhaustedPolicy::default(),
            dividers: false,
            divider: Divider::default(),
        }
    }
}

impl Settings {
    /// Read `path`, or the default settings file when `path` is `None`.
    ///
    /// A missing default file yields the built-in defaults; a missing explicit
    /// file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_owned(),
            None => match SETTINGS_PATH.as_ref() {
                Some(path) if path.exists() => path.clone(),
                _ => {
                    tracing::debug!("no settings file, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read settings {}", path.display()))?;
        let settings = Self::parse(&text)
            .with_context(|| format!("invalid settings in {}", path.display()))?;

        tracing::info!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn divider(&self) -> Option<Divider> {
        self.dividers.then_some(self.divider)
    }
}

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::job::validate_quality;
use crate::convert::PixelFormatChoice;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub quality: f32,
    pub lossless: bool,
    pub pixel_format: PixelFormatChoice,
    pub parallel_workers: usize,
    pub cache_dir: PathBuf,
    pub use_cache: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            quality: 75.0,
            lossless: false,
            pixel_format: PixelFormatChoice::Auto,
            parallel_workers: 0,
            cache_dir: PathBuf::from(".cache"),
            use_cache: true,
        }
    }
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        let settings: Settings = serde_yml::from_str(yaml).map_err(|e| {
            crate::error::BridgeError::config(format!("Failed to parse settings YAML: {e}"))
        })?;
        validate_quality(settings.quality)?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}

use std::path::PathBuf;

use super::job::Job;
use super::settings::Settings;
use crate::convert::PixelFormatChoice;

#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub quality: f32,
    pub lossless: bool,
    pub pixel_format: PixelFormatChoice,
    pub cache_dir: PathBuf,
    pub use_cache: bool,
}

impl MergedConfig {
    /// Job values win over settings wherever the job sets them.
    pub fn new(settings: &Settings, job: &Job) -> Self {
        MergedConfig {
            quality: job.quality.unwrap_or(settings.quality),
            lossless: job.lossless.unwrap_or(settings.lossless),
            pixel_format: job.pixel_format.unwrap_or(settings.pixel_format),
            cache_dir: settings.cache_dir.clone(),
            use_cache: settings.use_cache,
        }
    }
}

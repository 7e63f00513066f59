// ジョブ単位: 入力読込 -> bridge でエンコード/デコード -> 出力書込

use std::fs;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use tracing::{debug, info, warn};

use crate::bridge::{EncodeMode, Features, get_features};
use crate::cache::hash::{CacheSettings, compute_cache_key};
use crate::cache::store::{CacheStore, CachedEncode};
use crate::convert::{EncodeOptions, PixelFormatChoice, decode_image, encode_image};
use crate::error::BridgeError;

/// Configuration for a single job.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub quality: f32,
    pub lossless: bool,
    pub pixel_format: PixelFormatChoice,
    /// Encode cache location; `None` disables caching.
    pub cache_dir: Option<PathBuf>,
}

impl JobConfig {
    pub fn encode_options(&self) -> EncodeOptions {
        let mode = if self.lossless {
            EncodeMode::Lossless
        } else {
            EncodeMode::Lossy {
                quality: self.quality,
            }
        };
        EncodeOptions {
            mode,
            pixel_format: self.pixel_format,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    /// Any image file -> `.webp`.
    Encode,
    /// WebP file -> any other image format.
    Decode,
}

/// Result of processing a single job.
#[derive(Debug, Clone)]
pub struct JobResult {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub kind: JobKind,
    pub width: u32,
    pub height: u32,
    pub bytes_written: usize,
    pub cache_hit: bool,
}

/// A `.webp` output means encode; anything else means decode.
pub fn job_kind(output_path: &Path) -> JobKind {
    let is_webp = output_path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("webp"));
    if is_webp {
        JobKind::Encode
    } else {
        JobKind::Decode
    }
}

pub fn run_job(config: &JobConfig) -> crate::error::Result<JobResult> {
    let result = match job_kind(&config.output_path) {
        JobKind::Encode => run_encode(config),
        JobKind::Decode => run_decode(config),
    }?;

    info!(
        input = %result.input_path.display(),
        output = %result.output_path.display(),
        kind = ?result.kind,
        width = result.width,
        height = result.height,
        bytes = result.bytes_written,
        cache_hit = result.cache_hit,
        "job finished"
    );
    Ok(result)
}

fn run_encode(config: &JobConfig) -> crate::error::Result<JobResult> {
    let input = fs::read(&config.input_path).map_err(|e| {
        BridgeError::job(format!(
            "failed to read {}: {e}",
            config.input_path.display()
        ))
    })?;

    let cache_settings = CacheSettings {
        quality: config.quality,
        lossless: config.lossless,
        pixel_format: config.pixel_format,
    };
    let cache = config
        .cache_dir
        .as_ref()
        .map(|dir| (CacheStore::new(dir), compute_cache_key(&input, &cache_settings)));

    if let Some((store, key)) = &cache {
        match store.retrieve(key) {
            Ok(Some(hit)) => {
                debug!(key = %key, "encode cache hit");
                write_output(&config.output_path, &hit.webp)?;
                return Ok(encode_result(config, &hit, true));
            }
            Ok(None) => {}
            Err(e) => warn!(key = %key, error = %e, "unreadable cache entry, encoding again"),
        }
    }

    let image = image::load_from_memory(&input)?;
    let webp = encode_image(&image, &config.encode_options())?;
    let features = get_features(&webp[..], webp.len())?;
    let entry = CachedEncode { webp, features };

    write_output(&config.output_path, &entry.webp)?;

    // Cache failures do not fail the job.
    if let Some((store, key)) = &cache
        && let Err(e) = store.store(key, &entry)
    {
        warn!(key = %key, error = %e, "failed to store encode result in cache");
    }

    Ok(encode_result(config, &entry, false))
}

fn encode_result(config: &JobConfig, entry: &CachedEncode, cache_hit: bool) -> JobResult {
    let Features { width, height, .. } = entry.features;
    JobResult {
        input_path: config.input_path.clone(),
        output_path: config.output_path.clone(),
        kind: JobKind::Encode,
        width,
        height,
        bytes_written: entry.webp.len(),
        cache_hit,
    }
}

fn run_decode(config: &JobConfig) -> crate::error::Result<JobResult> {
    let data = fs::read(&config.input_path).map_err(|e| {
        BridgeError::job(format!(
            "failed to read {}: {e}",
            config.input_path.display()
        ))
    })?;

    let mut image = decode_image(&data)?;
    // JPEG has no alpha channel.
    if is_jpeg(&config.output_path) && image.color().has_alpha() {
        image = DynamicImage::ImageRgb8(image.to_rgb8());
    }

    create_parent_dir(&config.output_path)?;
    image.save(&config.output_path)?;
    let bytes_written = fs::metadata(&config.output_path)?.len() as usize;

    Ok(JobResult {
        input_path: config.input_path.clone(),
        output_path: config.output_path.clone(),
        kind: JobKind::Decode,
        width: image.width(),
        height: image.height(),
        bytes_written,
        cache_hit: false,
    })
}

fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"))
}

fn create_parent_dir(path: &Path) -> crate::error::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn write_output(path: &Path, bytes: &[u8]) -> crate::error::Result<()> {
    create_parent_dir(path)?;
    fs::write(path, bytes)?;
    Ok(())
}

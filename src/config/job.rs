use serde::Deserialize;

use crate::convert::PixelFormatChoice;

#[derive(Debug, Clone, Deserialize)]
pub struct JobFile {
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    pub input: String,
    pub output: String,
    #[serde(default, deserialize_with = "deserialize_quality")]
    pub quality: Option<f32>,
    pub lossless: Option<bool>,
    pub pixel_format: Option<PixelFormatChoice>,
}

impl JobFile {
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        serde_yml::from_str(yaml).map_err(|e| {
            crate::error::BridgeError::config(format!("Failed to parse job YAML: {e}"))
        })
    }
}

/// Check that a quality factor lies within libwebp's 0-100 scale.
pub fn validate_quality(quality: f32) -> crate::error::Result<f32> {
    if quality.is_finite() && (0.0..=100.0).contains(&quality) {
        Ok(quality)
    } else {
        Err(crate::error::BridgeError::config(format!(
            "quality must be within 0-100, got {quality}"
        )))
    }
}

/// Used through serde's `deserialize_with` so that an out-of-range quality
/// fails while the job file is being read.
fn deserialize_quality<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let quality = Option::<f32>::deserialize(deserializer)?;
    quality
        .map(|q| validate_quality(q).map_err(serde::de::Error::custom))
        .transpose()
}

// SHA-256（入力画像バイト列 + エンコード設定）

use sha2::{Digest, Sha256};

use crate::convert::PixelFormatChoice;

/// Settings that change the encoded output and therefore belong in the key.
pub struct CacheSettings {
    pub quality: f32,
    pub lossless: bool,
    pub pixel_format: PixelFormatChoice,
}

/// Settings as canonical JSON (keys in alphabetical order).
fn settings_to_canonical_json(settings: &CacheSettings) -> String {
    // serde_json::Map は BTreeMap ベースなのでキーはソート済み
    let mut map = serde_json::Map::new();
    map.insert("lossless".into(), serde_json::json!(settings.lossless));
    map.insert("pixel_format".into(), serde_json::json!(settings.pixel_format.as_str()));
    map.insert("quality".into(), serde_json::json!(settings.quality));
    serde_json::Value::Object(map).to_string()
}

/// Cache key for encoding `input` with `settings`, as lowercase hex.
pub fn compute_cache_key(input: &[u8], settings: &CacheSettings) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input);
    hasher.update(settings_to_canonical_json(settings).as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_json_is_sorted_by_key() {
        let settings = CacheSettings {
            quality: 75.0,
            lossless: false,
            pixel_format: PixelFormatChoice::Auto,
        };

        let json = settings_to_canonical_json(&settings);

        assert_eq!(
            json,
            "{\"lossless\":false,\"pixel_format\":\"auto\",\"quality\":75.0}"
        );
    }

    #[test]
    fn test_settings_json_lossless_rgba() {
        let settings = CacheSettings {
            quality: 100.0,
            lossless: true,
            pixel_format: PixelFormatChoice::Rgba,
        };

        let json = settings_to_canonical_json(&settings);

        assert_eq!(
            json,
            "{\"lossless\":true,\"pixel_format\":\"rgba\",\"quality\":100.0}"
        );
    }
}

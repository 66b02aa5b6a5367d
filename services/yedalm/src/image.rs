//! Resized-image URLs for images kept in hosted storage

use crate::config::ImagesConfig;

const STORAGE_HOST: &str = "supabase.co";
const OBJECT_PATH: &str = "/object/public/";
const RENDER_PATH: &str = "/render/image/public/";

/// URL that serves `src` resized to `width` at `quality`.
///
/// Images outside hosted storage are returned unchanged. A quality of `0`
/// falls back to the default.
pub fn render_url(src: &str, width: u32, quality: u8) -> String {
    if !src.contains(STORAGE_HOST) {
        return src.to_string();
    }
    let quality = if quality == 0 {
        crate::config::default_image_quality()
    } else {
        quality
    };

    let base = if src.contains("/render/image/") {
        src.to_string()
    } else {
        src.replace(OBJECT_PATH, RENDER_PATH)
    };
    format!("{}?width={}&quality={}", base, width, quality)
}

/// [`render_url`] with the configured sizing
pub fn render_configured(src: &str, images: &ImagesConfig) -> String {
    render_url(src, images.width, images.quality)
}

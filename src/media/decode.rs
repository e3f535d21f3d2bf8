use std::path::{Path, PathBuf};

use anyhow::Context;
use image::RgbaImage;

use crate::foundation::error::{ReelError, ReelResult};

/// Decode any format the `image` crate recognizes into straight RGBA8.
pub fn decode_image(bytes: &[u8]) -> ReelResult<RgbaImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| ReelError::decode(format!("decode image from memory: {e}")))?;
    Ok(dyn_img.to_rgba8())
}

pub fn load_image_file(path: &Path) -> ReelResult<RgbaImage> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("read image '{}'", path.display()))?;
    decode_image(&bytes)
}

/// Map a media URL onto a local path. Only `file://` URLs and bare paths are
/// readable; other schemes are rejected.
pub fn local_path(url: &str) -> ReelResult<PathBuf> {
    if let Some(rest) = url.strip_prefix("file://") {
        return Ok(PathBuf::from(rest));
    }
    if let Some((scheme, _)) = url.split_once("://") {
        return Err(ReelError::decode(format!(
            "unsupported media url scheme '{scheme}' ({url})"
        )));
    }
    if url.is_empty() {
        return Err(ReelError::decode("media url is empty"));
    }
    Ok(PathBuf::from(url))
}

#[cfg(test)]
#[path = "../../tests/unit/media/decode.rs"]
mod tests;

//! Re-encoding of rendered PNG images into WebP and AVIF.
//!
//! | Step | Implementation |
//! |------|----------------|
//! | Decode PNG | `image` crate |
//! | Encode → WebP | `webp` crate (libwebp, lossy, quality 80) |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6, quality 80) |
//!
//! Dimensions are fixed at render time, so no resizing happens here.

use image::codecs::avif::AvifEncoder;
use image::{DynamicImage, ImageFormat};
use tracing::debug;

use super::error::RenderError;
use super::types::ExportFormat;

pub const WEBP_QUALITY: f32 = 80.0;
pub const AVIF_QUALITY: u8 = 80;
pub const AVIF_SPEED: u8 = 6;

type EncodeFn = fn(&[u8]) -> Result<Vec<u8>, RenderError>;

fn decode_png(data: &[u8]) -> Result<DynamicImage, RenderError> {
    image::load_from_memory_with_format(data, ImageFormat::Png).map_err(|e| RenderError::Decode {
        reason: e.to_string(),
    })
}

/// Converts PNG bytes to lossy WebP.
pub fn to_webp(png: &[u8]) -> Result<Vec<u8>, RenderError> {
    let rgba = decode_png(png)?.to_rgba8();
    let encoder = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height());
    let encoded = encoder
        .encode_simple(false, WEBP_QUALITY)
        .map_err(|e| RenderError::Encode {
            codec: "WebP",
            reason: format!("{:?}", e),
        })?;

    debug!("PNG ({} bytes) -> WebP ({} bytes)", png.len(), encoded.len());
    Ok(encoded.to_vec())
}

/// Converts PNG bytes to AVIF.
pub fn to_avif(png: &[u8]) -> Result<Vec<u8>, RenderError> {
    let img = DynamicImage::ImageRgba8(decode_png(png)?.to_rgba8());

    let mut encoded = Vec::new();
    let encoder = AvifEncoder::new_with_speed_quality(&mut encoded, AVIF_SPEED, AVIF_QUALITY);
    img.write_with_encoder(encoder)
        .map_err(|e| RenderError::Encode {
            codec: "AVIF",
            reason: e.to_string(),
        })?;

    debug!("PNG ({} bytes) -> AVIF ({} bytes)", png.len(), encoded.len());
    Ok(encoded)
}

/// Re-encodes rendered PNG bytes for formats OpenSCAD cannot produce.
///
/// Native formats are returned untouched. Encoding runs on the blocking
/// pool since AV1 in particular is CPU heavy.
pub async fn reencode(format: ExportFormat, png: Vec<u8>) -> Result<Vec<u8>, RenderError> {
    let encode: EncodeFn = match format {
        ExportFormat::Webp => to_webp,
        ExportFormat::Avif => to_avif,
        _ => return Ok(png),
    };

    tokio::task::spawn_blocking(move || encode(&png))
        .await
        .map_err(|e| RenderError::Encode {
            codec: format.as_str(),
            reason: e.to_string(),
        })?
}

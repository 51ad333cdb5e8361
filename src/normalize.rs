//! Decode, bound and re-encode source photos.
//!
//! Listing photos are frequently straight off a camera. Before they go into
//! a document they are decoded, scaled so neither side exceeds
//! [`NormalizeOptions::max_dimension`], and re-encoded as baseline JPEG at a
//! low fixed quality so a brochure with dozens of photos stays small.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};

use crate::error::ImageError;

pub const MAX_DIMENSION: u32 = 1200;
/// 0.5 on the 0-1 scale
pub const JPEG_QUALITY: u8 = 50;

#[derive(Debug, Clone, Copy)]
pub struct NormalizeOptions {
    pub max_dimension: u32,
    pub quality: u8,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        NormalizeOptions {
            max_dimension: MAX_DIMENSION,
            quality: JPEG_QUALITY,
        }
    }
}

/// An encoded raster ready to be placed on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAsset {
    pub url: String,
    pub width: u32,
    pub height: u32,
    /// baseline JPEG bytes
    pub data: Vec<u8>,
}

/// Target size under the larger-dimension bound. Images already inside the
/// bound keep their size.
pub fn bounded_size(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width <= max && height <= max {
        return (width, height);
    }
    let scaled = |num: u32, den: u32| -> u32 {
        ((num as f64 * max as f64 / den as f64).round() as u32).max(1)
    };
    if width > height {
        (max, scaled(height, width))
    } else {
        (scaled(width, height), max)
    }
}

/// Decode `bytes` and flatten any transparency onto white.
pub fn decode(url: &str, bytes: &[u8]) -> Result<RgbImage, ImageError> {
    let img = image::load_from_memory(bytes).map_err(|source| ImageError::Decode {
        url: url.to_string(),
        source,
    })?;
    Ok(flatten_on_white(img))
}

/// Decode and scale down to the configured bound.
pub fn decode_bounded(
    url: &str,
    bytes: &[u8],
    options: &NormalizeOptions,
) -> Result<RgbImage, ImageError> {
    let img = decode(url, bytes)?;
    let (w, h) = img.dimensions();
    let (tw, th) = bounded_size(w, h, options.max_dimension);
    if (tw, th) == (w, h) {
        return Ok(img);
    }
    log::debug!("downscaling {} from {}x{} to {}x{}", url, w, h, tw, th);
    Ok(image::imageops::resize(&img, tw, th, FilterType::Triangle))
}

pub fn encode_jpeg(url: &str, img: &RgbImage, quality: u8) -> Result<ImageAsset, ImageError> {
    let mut data = Vec::with_capacity((img.width() * img.height()) as usize / 4);
    JpegEncoder::new_with_quality(&mut data, quality.clamp(1, 100))
        .encode_image(img)
        .map_err(|source| ImageError::Encode {
            url: url.to_string(),
            source,
        })?;
    Ok(ImageAsset {
        url: url.to_string(),
        width: img.width(),
        height: img.height(),
        data,
    })
}

/// Full normalization without cropping: decode, bound, re-encode.
pub fn normalize(
    url: &str,
    bytes: &[u8],
    options: &NormalizeOptions,
) -> Result<ImageAsset, ImageError> {
    let img = decode_bounded(url, bytes, options)?;
    encode_jpeg(url, &img, options.quality)
}

fn flatten_on_white(img: DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.into_rgb8();
    }
    let rgba = img.into_rgba8();
    let (w, h) = rgba.dimensions();
    RgbImage::from_fn(w, h, |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let blend = |c: u8| -> u8 {
            let a = a as u32;
            ((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8
        };
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}

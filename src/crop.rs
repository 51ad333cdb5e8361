//! Centre-crop to a target aspect ratio, with optional rounded corners.
//!
//! Every placed photo fills its slot exactly: the source is cropped to the
//! slot's width/height ratio instead of being letterboxed.

use image::RgbImage;

/// corner radius as a share of the shorter output side
pub const CORNER_RADIUS_SHARE: f32 = 0.05;

/// Source region to keep, in source pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl CropRect {
    pub fn aspect_ratio(&self) -> f32 {
        self.width / self.height
    }
}

/// Largest centred region of a `width` x `height` image with the given
/// width/height ratio. Wider sources lose equal strips left and right,
/// taller ones top and bottom.
pub fn crop_rect(width: u32, height: u32, target_ratio: f32) -> CropRect {
    let (w, h) = (width as f32, height as f32);
    if w / h > target_ratio {
        let desired = h * target_ratio;
        CropRect {
            x: (w - desired) / 2.0,
            y: 0.0,
            width: desired,
            height: h,
        }
    } else {
        let desired = w / target_ratio;
        CropRect {
            x: 0.0,
            y: (h - desired) / 2.0,
            width: w,
            height: desired,
        }
    }
}

/// Cut the crop region out of `img` onto a fresh buffer, then whiten the
/// corners outside a rounded rectangle when `rounded` is set.
pub fn crop_to_ratio(img: &RgbImage, target_ratio: f32, rounded: bool) -> RgbImage {
    let rect = crop_rect(img.width(), img.height(), target_ratio);
    let x = (rect.x.round() as u32).min(img.width().saturating_sub(1));
    let y = (rect.y.round() as u32).min(img.height().saturating_sub(1));
    let w = (rect.width.round() as u32).clamp(1, img.width() - x);
    let h = (rect.height.round() as u32).clamp(1, img.height() - y);
    let mut out = image::imageops::crop_imm(img, x, y, w, h).to_image();
    if rounded {
        round_corners(&mut out);
    }
    out
}

/// Paint everything outside a rounded rectangle white, anti-aliasing the
/// arc by pixel coverage.
pub fn round_corners(img: &mut RgbImage) {
    let (w, h) = img.dimensions();
    let radius = w.min(h) as f32 * CORNER_RADIUS_SHARE;
    if radius < 0.5 {
        return;
    }
    let span = radius.ceil() as u32;
    let (wf, hf) = (w as f32, h as f32);
    for py in (0..span.min(h)).chain(h.saturating_sub(span).max(span)..h) {
        for px in (0..span.min(w)).chain(w.saturating_sub(span).max(span)..w) {
            let cx = px as f32 + 0.5;
            let cy = py as f32 + 0.5;
            // centre of the arc owning this corner
            let ax = if cx < wf / 2.0 { radius } else { wf - radius };
            let ay = if cy < hf / 2.0 { radius } else { hf - radius };
            let outside_x = if cx < wf / 2.0 { cx < ax } else { cx > ax };
            let outside_y = if cy < hf / 2.0 { cy < ay } else { cy > ay };
            if !(outside_x && outside_y) {
                continue;
            }
            let dist = ((cx - ax).powi(2) + (cy - ay).powi(2)).sqrt();
            let coverage = (radius - dist + 0.5).clamp(0.0, 1.0);
            if coverage >= 1.0 {
                continue;
            }
            let pixel = img.get_pixel_mut(px, py);
            for c in pixel.0.iter_mut() {
                *c = (*c as f32 * coverage + 255.0 * (1.0 - coverage)).round() as u8;
            }
        }
    }
}

//! Mark segmentation
//!
//! Converts RGB pixels to the 8-bit HSV model (hue halved to 0..180) and
//! marks every pixel that falls inside any configured range. Red needs two
//! ranges because it straddles the hue wrap.

use image::{GrayImage, Luma, RgbImage};

use super::types::HsvRange;

/// Mask foreground value
pub const MASK_ON: u8 = 255;

/// Per-pixel color match, 0 or 255, same size as its source image
#[derive(Debug, Clone, PartialEq)]
pub struct MarkMask {
    pixels: GrayImage,
}

impl MarkMask {
    /// All-zero mask
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            pixels: GrayImage::new(width, height),
        }
    }

    pub fn from_gray(pixels: GrayImage) -> Self {
        Self { pixels }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn is_set(&self, x: u32, y: u32) -> bool {
        self.pixels.get_pixel(x, y).0[0] > 0
    }

    /// Number of foreground pixels
    pub fn count(&self) -> usize {
        self.pixels.pixels().filter(|p| p.0[0] > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.pixels.pixels().any(|p| p.0[0] > 0)
    }

    /// Pixel-wise saturating add of two same-sized masks
    pub fn union(mut self, other: &MarkMask) -> MarkMask {
        debug_assert_eq!(self.dimensions(), other.dimensions());
        for (a, b) in self.pixels.pixels_mut().zip(other.pixels.pixels()) {
            a.0[0] = a.0[0].saturating_add(b.0[0]);
        }
        self
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.pixels
    }

    pub fn into_gray(self) -> GrayImage {
        self.pixels
    }
}

/// Build the mark mask for `image`, one sub-mask per range, OR-ed together
pub fn segment(image: &RgbImage, ranges: &[HsvRange]) -> MarkMask {
    let (width, height) = image.dimensions();
    let hsv: Vec<[u8; 3]> = image
        .pixels()
        .map(|p| rgb_to_hsv8(p.0[0], p.0[1], p.0[2]))
        .collect();

    ranges
        .iter()
        .map(|range| in_range(&hsv, width, height, range))
        .fold(MarkMask::empty(width, height), |acc, m| acc.union(&m))
}

fn in_range(hsv: &[[u8; 3]], width: u32, height: u32, range: &HsvRange) -> MarkMask {
    let mut mask = GrayImage::new(width, height);
    for (pixel, value) in mask.pixels_mut().zip(hsv) {
        if range.contains(*value) {
            *pixel = Luma([MASK_ON]);
        }
    }
    MarkMask::from_gray(mask)
}

/// Convert RGB to 8-bit HSV: H in 0..=180 (degrees / 2), S and V in 0..=255
pub fn rgb_to_hsv8(r: u8, g: u8, b: u8) -> [u8; 3] {
    let rf = r as f32;
    let gf = g as f32;
    let bf = b as f32;

    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let d = max - min;

    let s = if max == 0.0 { 0.0 } else { 255.0 * d / max };

    let mut h = if d == 0.0 {
        0.0
    } else if max == rf {
        60.0 * (gf - bf) / d
    } else if max == gf {
        120.0 + 60.0 * (bf - rf) / d
    } else {
        240.0 + 60.0 * (rf - gf) / d
    };
    if h < 0.0 {
        h += 360.0;
    }

    [
        (h / 2.0).round().min(180.0) as u8,
        s.round() as u8,
        max as u8,
    ]
}

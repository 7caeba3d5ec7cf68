//! Common types for the strike module

use image::Rgb;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

// ============================================================
// Constants
// ============================================================

/// Low-end red band (hue 0..=10 on the 0..180 scale)
pub const RED_LOW: HsvRange = HsvRange::new([0, 50, 50], [10, 255, 255]);

/// High-end red band (hue 170..=180), covers the wrap at 360 degrees
pub const RED_HIGH: HsvRange = HsvRange::new([170, 50, 50], [180, 255, 255]);

/// Horizontal erase margin in pixels
pub const DEFAULT_MARGIN_X: u32 = 2;

/// Vertical erase margin in pixels (covers overstrike above and below the line)
pub const DEFAULT_MARGIN_Y: u32 = 18;

/// Page background fill
pub const FILL_WHITE: Rgb<u8> = Rgb([255, 255, 255]);

// ============================================================
// Error Types
// ============================================================

/// Strikethrough removal error types
#[derive(Debug, Error)]
pub enum StrikeError {
    #[error("Failed to read image {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode image {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("Failed to write image {path}: {reason}")]
    Write { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, StrikeError>;

// ============================================================
// Core Data Structures
// ============================================================

/// Inclusive HSV bounds in the 8-bit model (H: 0..=180, S/V: 0..=255)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    /// Both red bands
    pub fn red() -> Vec<HsvRange> {
        vec![RED_LOW, RED_HIGH]
    }

    /// Check if an 8-bit HSV triple lies inside the bounds
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|c| hsv[c] >= self.lower[c] && hsv[c] <= self.upper[c])
    }
}

/// Axis-aligned bounding rectangle of one connected mark
///
/// `x`/`y` are signed so that margin expansion can run past the top-left
/// corner before clipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge
    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= self.x as i64 && x < self.right() && y >= self.y as i64 && y < self.bottom()
    }
}

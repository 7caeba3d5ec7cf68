//! Page processor
//!
//! Loads one page image, removes red strike marks and writes the result.
//! Each call owns its own buffers, so pages can be processed in any order
//! or concurrently.

use image::{ImageFormat, ImageReader, Rgb, RgbImage};
use serde::Serialize;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, instrument};

use super::erase::erase;
use super::regions::extract_regions;
use super::segment::segment;
use super::types::{
    HsvRange, Region, Result, StrikeError, DEFAULT_MARGIN_X, DEFAULT_MARGIN_Y, FILL_WHITE,
};

// ============================================================
// Options
// ============================================================

/// Options for strike mark removal
#[derive(Debug, Clone, PartialEq)]
pub struct StrikeOptions {
    /// Color bands treated as marks
    pub ranges: Vec<HsvRange>,

    /// Horizontal erase margin
    pub margin_x: u32,

    /// Vertical erase margin
    pub margin_y: u32,

    /// Fill color for erased rectangles
    pub fill: Rgb<u8>,
}

impl Default for StrikeOptions {
    fn default() -> Self {
        Self {
            ranges: HsvRange::red(),
            margin_x: DEFAULT_MARGIN_X,
            margin_y: DEFAULT_MARGIN_Y,
            fill: FILL_WHITE,
        }
    }
}

impl StrikeOptions {
    /// Create a builder
    pub fn builder() -> StrikeOptionsBuilder {
        StrikeOptionsBuilder::default()
    }
}

/// Builder for StrikeOptions
#[derive(Debug, Default)]
pub struct StrikeOptionsBuilder {
    options: StrikeOptions,
}

impl StrikeOptionsBuilder {
    #[must_use]
    pub fn ranges(mut self, ranges: Vec<HsvRange>) -> Self {
        self.options.ranges = ranges;
        self
    }

    #[must_use]
    pub fn margin_x(mut self, margin: u32) -> Self {
        self.options.margin_x = margin;
        self
    }

    #[must_use]
    pub fn margin_y(mut self, margin: u32) -> Self {
        self.options.margin_y = margin;
        self
    }

    #[must_use]
    pub fn fill(mut self, fill: [u8; 3]) -> Self {
        self.options.fill = Rgb(fill);
        self
    }

    #[must_use]
    pub fn build(self) -> StrikeOptions {
        self.options
    }
}

// ============================================================
// Report
// ============================================================

/// What happened to one page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageReport {
    /// Detected regions, before margin expansion
    pub regions: Vec<Region>,

    /// Pixels matching a mark color
    pub marked_pixels: usize,

    /// Image dimensions
    pub image_size: (u32, u32),
}

impl PageReport {
    pub fn has_marks(&self) -> bool {
        !self.regions.is_empty()
    }
}

// ============================================================
// Strike Remover
// ============================================================

/// Strike mark removal processor
pub struct StrikeRemover;

impl StrikeRemover {
    /// Remove red strike marks from `input`, writing the cleaned page to `output`
    pub fn process_page(input: &Path, output: &Path) -> Result<()> {
        Self::process_page_with(input, output, &StrikeOptions::default()).map(|_| ())
    }

    /// Same as [`StrikeRemover::process_page`] with explicit options
    #[instrument(skip(input, output, options), fields(input = %input.display(), output = %output.display()))]
    pub fn process_page_with(
        input: &Path,
        output: &Path,
        options: &StrikeOptions,
    ) -> Result<PageReport> {
        let mut image = Self::load(input)?;
        let report = Self::remove_in_place(&mut image, options);
        Self::save(&image, output)?;

        debug!(
            regions = report.regions.len(),
            marked_pixels = report.marked_pixels,
            "Page cleaned"
        );
        Ok(report)
    }

    /// Remove strike marks from an RGB image in place
    pub fn remove_in_place(image: &mut RgbImage, options: &StrikeOptions) -> PageReport {
        let mask = segment(image, &options.ranges);
        let marked_pixels = mask.count();
        let regions = extract_regions(&mask);

        erase(
            image,
            &regions,
            options.fill,
            options.margin_x,
            options.margin_y,
        );

        PageReport {
            regions,
            marked_pixels,
            image_size: image.dimensions(),
        }
    }

    /// Read and decode an image as RGB
    pub fn load(path: &Path) -> Result<RgbImage> {
        let bytes = std::fs::read(path).map_err(|source| StrikeError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let decode_err = |reason: String| StrikeError::Decode {
            path: path.to_path_buf(),
            reason,
        };

        let image = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| decode_err(e.to_string()))?
            .decode()
            .map_err(|e| decode_err(e.to_string()))?;

        Ok(image.to_rgb8())
    }

    /// Encode and write an image, PNG unless the extension says otherwise
    pub fn save(image: &RgbImage, path: &Path) -> Result<()> {
        let format = ImageFormat::from_path(path).unwrap_or(ImageFormat::Png);
        image
            .save_with_format(path, format)
            .map_err(|e| StrikeError::Write {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }
}

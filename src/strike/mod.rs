//! Strikethrough removal module
//!
//! Removes red strikethrough marks from rasterized document pages.
//!
//! # Algorithm
//!
//! 1. Convert pixels to 8-bit HSV and build a mask from the red bands
//!    ([`segment`])
//! 2. Trace outer borders of the mask and take their bounding boxes
//!    ([`regions`])
//! 3. Grow each box by a margin and fill it with the page color
//!    ([`erase`])
//!
//! # Example
//!
//! ```rust,no_run
//! use strikeout_pdf::StrikeRemover;
//! use std::path::Path;
//!
//! StrikeRemover::process_page(
//!     Path::new("original_page_1.png"),
//!     Path::new("processed_page_1.png"),
//! )
//! .unwrap();
//! ```

pub mod erase;
mod processor;
pub mod regions;
pub mod segment;
mod types;

// Re-export public API
pub use erase::erase;
pub use processor::{PageReport, StrikeOptions, StrikeOptionsBuilder, StrikeRemover};
pub use regions::{extract_components, extract_regions, MarkComponent};
pub use segment::{rgb_to_hsv8, segment, MarkMask};
pub use types::{
    HsvRange, Region, Result, StrikeError, DEFAULT_MARGIN_X, DEFAULT_MARGIN_Y, FILL_WHITE,
    RED_HIGH, RED_LOW,
};

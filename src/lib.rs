//! strikeout-pdf - remove red strikethrough marks from PDF pages
//!
//! # Modules
//!
//! - [`strike`] - mask, region and erase stages for one page image
//! - [`rasterize`] - PDF to per-page PNG rendering
//! - [`document`] - whole-document processing in a scoped workspace
//! - [`config`] - config file loading and CLI overrides
//! - [`cli`] - command-line definitions
//! - `web` - upload UI (feature `web`)

pub mod cli;
pub mod config;
pub mod document;
pub mod rasterize;
pub mod strike;

#[cfg(feature = "web")]
pub mod web;

// CLI
pub use cli::{exit_codes, Cli, Commands, ConvertArgs, EraseArgs, PageArgs};
#[cfg(feature = "web")]
pub use cli::ServeArgs;

// Config
pub use config::{CliOverrides, Config, ConfigError};

// Document
pub use document::{
    DocumentError, DocumentProcessor, DocumentResult, NoopProgress, PageOutcome, PageResult,
    ProgressCallback, Workspace,
};

// Rasterizer
pub use rasterize::{PopplerRasterizer, RasterizeError, Rasterizer, DEFAULT_DPI};

// Strike removal
pub use strike::{
    HsvRange, MarkMask, PageReport, Region, StrikeError, StrikeOptions, StrikeOptionsBuilder,
    StrikeRemover,
};

// Web
#[cfg(feature = "web")]
pub use web::{ServerConfig, WebServer};

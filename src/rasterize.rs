//! PDF rasterization
//!
//! Renders every page of a PDF to a PNG file. The default backend shells out
//! to Poppler's `pdftoppm`; the [`Rasterizer`] trait lets callers swap in a
//! different renderer.

use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Default render resolution
pub const DEFAULT_DPI: u32 = 300;

/// Page file prefix used inside the render directory
const PAGE_PREFIX: &str = "page";

/// Rasterization error types
#[derive(Debug, Error)]
pub enum RasterizeError {
    #[error("Rendering tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid PDF document {path}: {reason}")]
    InvalidDocument { path: PathBuf, reason: String },

    #[error("PDF document has no pages: {0}")]
    EmptyDocument(PathBuf),

    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RasterizeError>;

/// Renders a paginated document into one image per page
pub trait Rasterizer: Send + Sync {
    /// Render `pdf` into `out_dir`, returning page image paths in page order
    fn rasterize(&self, pdf: &Path, out_dir: &Path, dpi: u32) -> Result<Vec<PathBuf>>;
}

/// `pdftoppm` backed rasterizer
#[derive(Debug, Clone)]
pub struct PopplerRasterizer {
    tool: String,
}

impl Default for PopplerRasterizer {
    fn default() -> Self {
        Self {
            tool: "pdftoppm".to_string(),
        }
    }
}

impl PopplerRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different `pdftoppm` binary
    pub fn with_tool(tool: impl Into<String>) -> Self {
        Self { tool: tool.into() }
    }

    /// Check whether the render tool is on PATH
    pub fn is_available(&self) -> bool {
        which::which(&self.tool).is_ok()
    }

    /// Number of pages in `pdf`
    pub fn page_count(pdf: &Path) -> Result<usize> {
        let doc = lopdf::Document::load(pdf).map_err(|e| RasterizeError::InvalidDocument {
            path: pdf.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(doc.get_pages().len())
    }
}

impl Rasterizer for PopplerRasterizer {
    #[instrument(skip(self, pdf), fields(pdf = %pdf.display()))]
    fn rasterize(&self, pdf: &Path, out_dir: &Path, dpi: u32) -> Result<Vec<PathBuf>> {
        let pages = Self::page_count(pdf)?;
        if pages == 0 {
            return Err(RasterizeError::EmptyDocument(pdf.to_path_buf()));
        }

        let tool = which::which(&self.tool)
            .map_err(|_| RasterizeError::ToolNotFound(self.tool.clone()))?;

        std::fs::create_dir_all(out_dir)?;
        info!(pages, dpi, "Rendering PDF pages");

        let output = Command::new(&tool)
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-png")
            .arg(pdf)
            .arg(out_dir.join(PAGE_PREFIX))
            .output()?;

        if !output.status.success() {
            return Err(RasterizeError::ToolFailed {
                tool: self.tool.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let rendered = collect_pages(out_dir, PAGE_PREFIX)?;
        debug!(rendered = rendered.len(), "Collected rendered pages");
        Ok(rendered)
    }
}

/// Collect `<prefix>-<n>.png` files sorted by page number
///
/// `pdftoppm` zero-pads page numbers depending on the page count, so the
/// number is parsed rather than sorted lexically.
pub fn collect_pages(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let mut pages: Vec<(u32, PathBuf)> = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if let Some(number) = page_number(&path, prefix) {
            pages.push((number, path));
        }
    }

    pages.sort_by_key(|(n, _)| *n);
    Ok(pages.into_iter().map(|(_, p)| p).collect())
}

fn page_number(path: &Path, prefix: &str) -> Option<u32> {
    if !path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("png")) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    stem.strip_prefix(prefix)?.strip_prefix('-')?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_page_number_parsing() {
        assert_eq!(page_number(Path::new("/x/page-1.png"), "page"), Some(1));
        assert_eq!(page_number(Path::new("/x/page-007.png"), "page"), Some(7));
        assert_eq!(page_number(Path::new("/x/page-7.jpg"), "page"), None);
        assert_eq!(page_number(Path::new("/x/other-7.png"), "page"), None);
        assert_eq!(page_number(Path::new("/x/page-abc.png"), "page"), None);
    }

    #[test]
    fn test_collect_pages_numeric_order() {
        let dir = tempdir().unwrap();
        for name in ["page-10.png", "page-2.png", "page-1.png", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let pages = collect_pages(dir.path(), "page").unwrap();
        let names: Vec<_> = pages
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["page-1.png", "page-2.png", "page-10.png"]);
    }

    #[test]
    fn test_invalid_document() {
        let dir = tempdir().unwrap();
        let pdf = dir.path().join("bad.pdf");
        std::fs::write(&pdf, b"not a pdf").unwrap();

        let result = PopplerRasterizer::new().rasterize(&pdf, dir.path(), DEFAULT_DPI);
        assert!(matches!(
            result,
            Err(RasterizeError::InvalidDocument { .. })
        ));
    }

    #[test]
    fn test_missing_tool() {
        let rasterizer = PopplerRasterizer::with_tool("definitely-not-a-real-pdftoppm");
        assert!(!rasterizer.is_available());
    }
}

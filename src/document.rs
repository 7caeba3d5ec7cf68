//! Document processing
//!
//! Rasterizes a PDF into a scoped workspace, then cleans every page and
//! writes `original_page_N.png` / `processed_page_N.png` pairs to the
//! output directory. Pages are independent, so they run on the rayon pool
//! and a failing page never stops the others.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::TempDir;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::rasterize::{PopplerRasterizer, RasterizeError, Rasterizer, DEFAULT_DPI};
use crate::strike::{PageReport, StrikeOptions, StrikeRemover};

/// Document processing error types
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Rasterization failed: {0}")]
    Rasterize(#[from] RasterizeError),

    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DocumentError>;

// ============================================================
// Workspace
// ============================================================

/// Per-request scratch directory, removed when dropped
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a uniquely named directory under the system temp dir
    pub fn new() -> std::io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("strikeout-").tempdir()?;
        Ok(Self { dir })
    }

    /// Create a uniquely named directory under `root`
    pub fn in_dir(root: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(root)?;
        let dir = tempfile::Builder::new().prefix("job-").tempdir_in(root)?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Keep the directory on disk and return its path
    pub fn keep(self) -> PathBuf {
        self.dir.keep()
    }
}

// ============================================================
// Progress
// ============================================================

/// Progress callback for per-page reporting
pub trait ProgressCallback: Sync {
    /// Called once the page count is known
    fn on_start(&self, _total_pages: usize) {}

    /// Called when a page starts processing (1-based)
    fn on_page_start(&self, _page: usize) {}

    /// Called when a page finishes, successfully or not
    fn on_page_done(&self, _page: usize, _outcome: &PageOutcome) {}
}

/// Progress callback that ignores everything
pub struct NoopProgress;

impl ProgressCallback for NoopProgress {}

// ============================================================
// Results
// ============================================================

/// Result of one page
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PageOutcome {
    Cleaned { report: PageReport },
    Failed { error: String },
}

impl PageOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, PageOutcome::Cleaned { .. })
    }
}

/// One before/after page pair
#[derive(Debug, Clone, Serialize)]
pub struct PageResult {
    /// Page number (1-based)
    pub page: usize,
    pub original_path: PathBuf,
    pub processed_path: PathBuf,
    pub outcome: PageOutcome,
}

/// Result of a whole document
#[derive(Debug, Clone, Serialize)]
pub struct DocumentResult {
    pub pages: Vec<PageResult>,
    pub processed_at: DateTime<Utc>,
    pub elapsed_seconds: f64,
}

impl DocumentResult {
    pub fn succeeded(&self) -> usize {
        self.pages.iter().filter(|p| p.outcome.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.pages.len() - self.succeeded()
    }

    pub fn total_regions(&self) -> usize {
        self.pages
            .iter()
            .map(|p| match &p.outcome {
                PageOutcome::Cleaned { report } => report.regions.len(),
                PageOutcome::Failed { .. } => 0,
            })
            .sum()
    }
}

/// File name of the untouched page image
pub fn original_page_name(page: usize) -> String {
    format!("original_page_{}.png", page)
}

/// File name of the cleaned page image
pub fn processed_page_name(page: usize) -> String {
    format!("processed_page_{}.png", page)
}

// ============================================================
// Document Processor
// ============================================================

/// Rasterizes a document and removes strike marks from every page
pub struct DocumentProcessor {
    rasterizer: Box<dyn Rasterizer>,
    options: StrikeOptions,
    dpi: u32,
    threads: Option<usize>,
}

impl Default for DocumentProcessor {
    fn default() -> Self {
        Self::new(StrikeOptions::default())
    }
}

impl DocumentProcessor {
    /// Processor using `pdftoppm` at the default resolution
    pub fn new(options: StrikeOptions) -> Self {
        Self {
            rasterizer: Box::new(PopplerRasterizer::new()),
            options,
            dpi: DEFAULT_DPI,
            threads: None,
        }
    }

    #[must_use]
    pub fn with_rasterizer(mut self, rasterizer: Box<dyn Rasterizer>) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    #[must_use]
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Limit page parallelism; `None` uses the global rayon pool
    #[must_use]
    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    pub fn options(&self) -> &StrikeOptions {
        &self.options
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    pub fn process(&self, pdf: &Path, out_dir: &Path) -> Result<DocumentResult> {
        self.process_with_progress(pdf, out_dir, &NoopProgress)
    }

    #[instrument(skip(self, pdf, progress), fields(pdf = %pdf.display()))]
    pub fn process_with_progress(
        &self,
        pdf: &Path,
        out_dir: &Path,
        progress: &dyn ProgressCallback,
    ) -> Result<DocumentResult> {
        let start = Instant::now();
        let workspace = Workspace::new()?;
        let rendered = self
            .rasterizer
            .rasterize(pdf, &workspace.path().join("render"), self.dpi)?;

        std::fs::create_dir_all(out_dir)?;
        progress.on_start(rendered.len());
        info!(pages = rendered.len(), "Removing strike marks");

        let pages = match self.threads {
            Some(n) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n.max(1))
                    .build()
                    .map_err(|e| DocumentError::ThreadPool(e.to_string()))?;
                pool.install(|| self.process_pages(&rendered, out_dir, progress))
            }
            None => self.process_pages(&rendered, out_dir, progress),
        };

        let result = DocumentResult {
            pages,
            processed_at: Utc::now(),
            elapsed_seconds: start.elapsed().as_secs_f64(),
        };
        info!(
            succeeded = result.succeeded(),
            failed = result.failed(),
            regions = result.total_regions(),
            "Document done"
        );
        Ok(result)
    }

    fn process_pages(
        &self,
        rendered: &[PathBuf],
        out_dir: &Path,
        progress: &dyn ProgressCallback,
    ) -> Vec<PageResult> {
        rendered
            .par_iter()
            .enumerate()
            .map(|(i, source)| {
                let page = i + 1;
                progress.on_page_start(page);
                let result = self.process_one(page, source, out_dir);
                progress.on_page_done(page, &result.outcome);
                result
            })
            .collect()
    }

    fn process_one(&self, page: usize, source: &Path, out_dir: &Path) -> PageResult {
        let original_path = out_dir.join(original_page_name(page));
        let processed_path = out_dir.join(processed_page_name(page));

        let outcome = std::fs::copy(source, &original_path)
            .map_err(|e| format!("Failed to save original page: {}", e))
            .and_then(|_| {
                StrikeRemover::process_page_with(&original_path, &processed_path, &self.options)
                    .map_err(|e| e.to_string())
            });

        let outcome = match outcome {
            Ok(report) => PageOutcome::Cleaned { report },
            Err(error) => {
                warn!(page, %error, "Page failed");
                PageOutcome::Failed { error }
            }
        };

        PageResult {
            page,
            original_path,
            processed_path,
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    /// Writes synthetic pages instead of rendering a PDF
    struct FakeRasterizer {
        pages: Vec<Option<RgbImage>>,
    }

    impl Rasterizer for FakeRasterizer {
        fn rasterize(
            &self,
            _pdf: &Path,
            out_dir: &Path,
            _dpi: u32,
        ) -> crate::rasterize::Result<Vec<PathBuf>> {
            std::fs::create_dir_all(out_dir)?;
            let mut paths = Vec::new();
            for (i, page) in self.pages.iter().enumerate() {
                let path = out_dir.join(format!("page-{}.png", i + 1));
                match page {
                    Some(img) => img.save(&path).unwrap(),
                    None => std::fs::write(&path, b"broken").unwrap(),
                }
                paths.push(path);
            }
            Ok(paths)
        }
    }

    fn struck_page() -> RgbImage {
        let mut img = RgbImage::from_pixel(120, 80, Rgb([255, 255, 255]));
        for x in 20..100 {
            for y in 40..42 {
                img.put_pixel(x, y, Rgb([255, 0, 0]));
            }
        }
        img
    }

    #[derive(Default)]
    struct CountingProgress {
        started: AtomicUsize,
        done: AtomicUsize,
    }

    impl ProgressCallback for CountingProgress {
        fn on_page_start(&self, _page: usize) {
            self.started.fetch_add(1, Ordering::Relaxed);
        }

        fn on_page_done(&self, _page: usize, _outcome: &PageOutcome) {
            self.done.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn test_page_names() {
        assert_eq!(original_page_name(1), "original_page_1.png");
        assert_eq!(processed_page_name(12), "processed_page_12.png");
    }

    #[test]
    fn test_workspace_removed_on_drop() {
        let root = tempdir().unwrap();
        let ws = Workspace::in_dir(root.path()).unwrap();
        let path = ws.path().to_path_buf();
        std::fs::write(path.join("scratch.png"), b"x").unwrap();
        assert!(path.exists());
        drop(ws);
        assert!(!path.exists());
    }

    #[test]
    fn test_workspaces_are_distinct() {
        let root = tempdir().unwrap();
        let a = Workspace::in_dir(root.path()).unwrap();
        let b = Workspace::in_dir(root.path()).unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_workspace_keep() {
        let root = tempdir().unwrap();
        let kept = Workspace::in_dir(root.path()).unwrap().keep();
        assert!(kept.exists());
    }

    #[test]
    fn test_process_document() {
        let out = tempdir().unwrap();
        let processor = DocumentProcessor::default()
            .with_rasterizer(Box::new(FakeRasterizer {
                pages: vec![Some(struck_page()), Some(struck_page())],
            }))
            .with_threads(Some(2));

        let progress = CountingProgress::default();
        let result = processor
            .process_with_progress(Path::new("doc.pdf"), out.path(), &progress)
            .unwrap();

        assert_eq!(result.pages.len(), 2);
        assert_eq!(result.succeeded(), 2);
        assert_eq!(result.total_regions(), 2);
        assert_eq!(progress.started.load(Ordering::Relaxed), 2);
        assert_eq!(progress.done.load(Ordering::Relaxed), 2);

        for page in &result.pages {
            assert!(page.original_path.exists());
            assert!(page.processed_path.exists());
            let cleaned = image::open(&page.processed_path).unwrap().to_rgb8();
            assert_eq!(*cleaned.get_pixel(50, 40), Rgb([255, 255, 255]));
            let original = image::open(&page.original_path).unwrap().to_rgb8();
            assert_eq!(*original.get_pixel(50, 40), Rgb([255, 0, 0]));
        }
        assert_eq!(result.pages[0].page, 1);
        assert_eq!(result.pages[1].page, 2);
    }

    #[test]
    fn test_failed_page_does_not_stop_others() {
        let out = tempdir().unwrap();
        let processor = DocumentProcessor::default().with_rasterizer(Box::new(FakeRasterizer {
            pages: vec![Some(struck_page()), None, Some(struck_page())],
        }));

        let result = processor.process(Path::new("doc.pdf"), out.path()).unwrap();

        assert_eq!(result.pages.len(), 3);
        assert_eq!(result.succeeded(), 2);
        assert_eq!(result.failed(), 1);
        assert!(!result.pages[1].outcome.is_ok());
        assert!(result.pages[2].processed_path.exists());
    }

    #[test]
    fn test_outcome_serialize() {
        let outcome = PageOutcome::Failed {
            error: "boom".to_string(),
        };
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"status\":\"failed\""));
    }
}

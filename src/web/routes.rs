//! HTTP routes for the web server
//!
//! `GET /` serves the upload page, `POST /upload` cleans an uploaded PDF and
//! answers with an HTML fragment, `GET /api/health` reports tool status.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json},
    routing::{get, post},
    Router,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::document::{DocumentProcessor, DocumentResult, PageOutcome, Workspace};
use crate::rasterize::PopplerRasterizer;

const INDEX_HTML: &str = include_str!("index.html");

/// Name of the uploaded document inside the request workspace
const UPLOAD_FILE: &str = "upload.pdf";

/// Directory for rendered and cleaned pages inside the request workspace
const PAGES_DIR: &str = "pages";

/// Application state shared across handlers
pub struct AppState {
    pub processor: Arc<DocumentProcessor>,
    pub version: String,
}

impl AppState {
    pub fn new(processor: DocumentProcessor) -> Self {
        Self {
            processor: Arc::new(processor),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Build the router
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/upload", post(upload))
        .route("/api/health", get(health_check))
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub pdftoppm: bool,
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        pdftoppm: PopplerRasterizer::new().is_available(),
    })
}

/// Clean an uploaded PDF and return the before/after page pairs
async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Html<String>, AppError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            let filename = safe_file_name(field.file_name());
            let data = field.bytes().await?;
            upload = Some((filename, data.to_vec()));
        }
    }

    let (filename, data) =
        upload.ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;
    if data.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
    }

    let request_id = Uuid::new_v4();
    info!(%request_id, %filename, bytes = data.len(), "Upload received");

    let processor = state.processor.clone();
    let html = tokio::task::spawn_blocking(move || -> Result<String, AppError> {
        // Dropped at the end of this closure, taking every file with it
        let workspace = Workspace::new()?;
        let pdf_path = workspace.path().join(UPLOAD_FILE);
        std::fs::write(&pdf_path, &data)?;

        let result = processor
            .process(&pdf_path, &workspace.path().join(PAGES_DIR))
            .map_err(|e| AppError::Processing(e.to_string()))?;
        render_pages(&result)
    })
    .await
    .map_err(|e| AppError::Internal(format!("Task panic: {}", e)))??;

    info!(%request_id, "Upload processed");
    Ok(Html(html))
}

/// Client-supplied name reduced to its final path component, for logs
fn safe_file_name(name: Option<&str>) -> String {
    name.and_then(|n| Path::new(n).file_name())
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("upload.pdf")
        .to_string()
}

fn png_data_uri(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(bytes)))
}

/// Render the result fragment with images inlined as data URIs
pub fn render_pages(result: &DocumentResult) -> Result<String, AppError> {
    let mut html = String::from(r#"<div class="pages-container">"#);
    let stamp = result.processed_at.format("%Y-%m-%d %H:%M:%S UTC");

    for page in &result.pages {
        let n = page.page;
        match &page.outcome {
            PageOutcome::Cleaned { report } => {
                let original = png_data_uri(&page.original_path)?;
                let processed = png_data_uri(&page.processed_path)?;
                html.push_str(&format!(
                    r#"
    <div class="page-section">
        <h2>Page {n}</h2>
        <p class="page-meta">{regions} mark(s) removed, processed {stamp}</p>
        <div class="image-comparison">
            <div class="image-container">
                <h3>Original</h3>
                <img src="{original}" alt="Original page {n}">
            </div>
            <div class="image-container">
                <h3>Processed</h3>
                <img src="{processed}" alt="Processed page {n}">
            </div>
        </div>
        <div class="download-section">
            <a href="{processed}" download="processed_page_{n}.png" class="download-button">Download processed page</a>
        </div>
    </div>"#,
                    regions = report.regions.len(),
                ));
            }
            PageOutcome::Failed { error } => {
                warn!(page = n, %error, "Page failed");
                html.push_str(&format!(
                    r#"
    <div class="page-section">
        <h2>Page {n}</h2>
        <div class="error">Failed to process page: {}</div>
    </div>"#,
                    escape_html(error)
                ));
            }
        }
    }

    html.push_str("\n</div>");
    Ok(html)
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// API error type, rendered as an HTML error fragment
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Processing(String),
    Internal(String),
    /// Rejected request body, keeping the status the extractor chose
    Rejected(StatusCode, String),
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        AppError::Rejected(e.status(), e.body_text())
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Processing(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Rejected(status, msg) => (status, msg),
        };

        let body = format!(
            r#"<div class="error">An error occurred while processing: {}</div>"#,
            escape_html(&message)
        );
        (status, Html(body)).into_response()
    }
}

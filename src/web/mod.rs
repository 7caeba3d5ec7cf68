//! Web server module for strikeout-pdf
//!
//! Upload a PDF in the browser and get back before/after images of every
//! page with the red strike marks removed.
//!
//! # Usage
//!
//! Enable the `web` feature and use the `serve` subcommand:
//!
//! ```bash
//! cargo build --features web
//! strikeout-pdf serve --port 8080
//! ```
//!
//! Every upload runs in its own [`Workspace`](crate::Workspace), so
//! concurrent requests never see or delete each other's files. Page images
//! are returned inline and the workspace is gone once the response is built.

mod routes;
mod server;

pub use routes::{api_routes, AppState};
pub use server::{ServerConfig, WebServer};

/// Default server port
pub const DEFAULT_PORT: u16 = 8080;

/// Default bind address
pub const DEFAULT_BIND: &str = "127.0.0.1";

/// Default upload limit in bytes (100 MB)
pub const DEFAULT_UPLOAD_LIMIT: usize = 100 * 1024 * 1024;

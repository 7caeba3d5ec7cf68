//! Command-line interface definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::CliOverrides;

/// Process exit codes
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const INPUT_NOT_FOUND: i32 = 2;
    pub const PARTIAL_FAILURE: i32 = 3;
}

#[derive(Debug, Parser)]
#[command(name = "strikeout-pdf", version, about = "Remove red strikethrough marks from PDF pages")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Clean a single page image
    Page(PageArgs),
    /// Rasterize a PDF and clean every page
    Convert(ConvertArgs),
    /// Show tool availability and config locations
    Info,
    /// Start the web UI
    #[cfg(feature = "web")]
    Serve(ServeArgs),
}

/// Options shared by commands that erase marks
#[derive(Debug, Clone, Args)]
pub struct EraseArgs {
    /// Horizontal erase margin in pixels
    #[arg(long)]
    pub margin_x: Option<u32>,

    /// Vertical erase margin in pixels
    #[arg(long)]
    pub margin_y: Option<u32>,

    /// Config file (defaults to ./strikeout.toml or the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Args)]
pub struct PageArgs {
    /// Input page image
    pub input: PathBuf,

    /// Output image path
    pub output: PathBuf,

    #[command(flatten)]
    pub erase: EraseArgs,
}

#[derive(Debug, Clone, Args)]
pub struct ConvertArgs {
    /// Input PDF
    pub input: PathBuf,

    /// Output directory for page images
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// Render resolution
    #[arg(long)]
    pub dpi: Option<u32>,

    /// Worker threads (defaults to all CPUs)
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Suppress the progress bar
    #[arg(short, long)]
    pub quiet: bool,

    #[command(flatten)]
    pub erase: EraseArgs,
}

#[cfg(feature = "web")]
#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value_t = crate::web::DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind to
    #[arg(short, long, default_value = crate::web::DEFAULT_BIND)]
    pub bind: String,

    /// Upload limit in MB
    #[arg(long, default_value_t = 100)]
    pub upload_limit: usize,

    #[command(flatten)]
    pub erase: EraseArgs,
}

impl EraseArgs {
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            margin_x: self.margin_x,
            margin_y: self.margin_y,
            ..CliOverrides::new()
        }
    }
}

impl ConvertArgs {
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            dpi: self.dpi,
            threads: self.threads,
            ..self.erase.overrides()
        }
    }
}

//! strikeout-pdf - remove red strikethrough marks from PDF pages
//!
//! CLI entry point

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use strikeout_pdf::{
    exit_codes, Cli, Commands, Config, ConvertArgs, DocumentProcessor, EraseArgs, PageArgs,
    PageOutcome, PopplerRasterizer, ProgressCallback, StrikeRemover,
};
use tracing_subscriber::EnvFilter;

#[cfg(feature = "web")]
use strikeout_pdf::{ServeArgs, ServerConfig, WebServer};

fn main() {
    let cli = Cli::parse();

    let verbose = match &cli.command {
        Commands::Page(args) => args.erase.verbose,
        Commands::Convert(args) => args.erase.verbose,
        Commands::Info => 0,
        #[cfg(feature = "web")]
        Commands::Serve(args) => args.erase.verbose.max(1),
    };
    init_tracing(verbose);

    let result = match cli.command {
        Commands::Page(args) => run_page(&args),
        Commands::Convert(args) => run_convert(&args),
        Commands::Info => run_info(),
        #[cfg(feature = "web")]
        Commands::Serve(args) => run_serve(&args),
    };

    std::process::exit(match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit_codes::GENERAL_ERROR
        }
    });
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Load the config file named on the command line, or the default one
fn load_config(erase: &EraseArgs) -> Config {
    match &erase.config {
        Some(path) => Config::load_from_path(path).unwrap_or_else(|e| {
            eprintln!("Warning: Failed to load config file: {}", e);
            Config::default()
        }),
        None => Config::load().unwrap_or_default(),
    }
}

// ============ Progress Bar ============

struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new(quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(0)
        };
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} pages {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        Self { bar }
    }
}

impl ProgressCallback for BarProgress {
    fn on_start(&self, total_pages: usize) {
        self.bar.set_length(total_pages as u64);
    }

    fn on_page_done(&self, page: usize, outcome: &PageOutcome) {
        if let PageOutcome::Failed { error } = outcome {
            self.bar.println(format!("Page {} failed: {}", page, error));
        }
        self.bar.inc(1);
    }
}

// ============ Page Command ============

fn run_page(args: &PageArgs) -> anyhow::Result<i32> {
    if !args.input.exists() {
        eprintln!("Error: Input path does not exist: {}", args.input.display());
        return Ok(exit_codes::INPUT_NOT_FOUND);
    }

    let config = load_config(&args.erase).merge_with_cli(&args.erase.overrides());
    let report = StrikeRemover::process_page_with(&args.input, &args.output, &config.to_options())
        .with_context(|| format!("Failed to process {}", args.input.display()))?;

    println!(
        "{}: {} mark(s) removed -> {}",
        args.input.display(),
        report.regions.len(),
        args.output.display()
    );
    Ok(exit_codes::SUCCESS)
}

// ============ Convert Command ============

fn run_convert(args: &ConvertArgs) -> anyhow::Result<i32> {
    if !args.input.is_file() {
        eprintln!("Error: Input file does not exist: {}", args.input.display());
        return Ok(exit_codes::INPUT_NOT_FOUND);
    }

    let config = load_config(&args.erase).merge_with_cli(&args.overrides());
    let processor = DocumentProcessor::new(config.to_options())
        .with_dpi(config.dpi)
        .with_threads(config.threads);

    let progress = BarProgress::new(args.quiet || args.json);
    let result = processor
        .process_with_progress(&args.input, &args.output, &progress)
        .with_context(|| format!("Failed to process {}", args.input.display()))?;
    progress.bar.finish_and_clear();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if !args.quiet {
        for page in &result.pages {
            if let PageOutcome::Cleaned { report } = &page.outcome {
                println!(
                    "  Page {}: {} mark(s) -> {}",
                    page.page,
                    report.regions.len(),
                    page.processed_path.display()
                );
            }
        }
        println!(
            "Pages: {} ok, {} failed, {:.2}s",
            result.succeeded(),
            result.failed(),
            result.elapsed_seconds
        );
    }

    Ok(if result.failed() > 0 {
        exit_codes::PARTIAL_FAILURE
    } else {
        exit_codes::SUCCESS
    })
}

// ============ Info Command ============

fn run_info() -> anyhow::Result<i32> {
    println!("strikeout-pdf v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("System Information:");
    println!("  Platform: {}", std::env::consts::OS);
    println!("  Arch: {}", std::env::consts::ARCH);
    println!("  CPUs: {}", num_cpus::get());

    println!();
    println!("PDF Rendering:");
    check_tool_with_version("pdftoppm", "Poppler", &["-v"]);
    if !PopplerRasterizer::new().is_available() {
        println!("  (install poppler-utils to enable `convert`)");
    }

    println!();
    println!("Config File Locations:");
    for path in Config::search_paths() {
        let marker = if path.is_file() { "found" } else { "absent" };
        println!("  {} ({})", path.display(), marker);
    }

    Ok(exit_codes::SUCCESS)
}

fn check_tool_with_version(cmd: &str, name: &str, version_args: &[&str]) {
    match which::which(cmd) {
        Ok(path) => println!("  {}: {}", name, tool_version(&path, version_args)),
        Err(_) => println!("  {}: Not found", name),
    }
}

/// First line of the tool's version output, falling back to its path
fn tool_version(path: &Path, version_args: &[&str]) -> String {
    let found = || format!("{} (found)", path.display());
    let Ok(output) = std::process::Command::new(path).args(version_args).output() else {
        return found();
    };
    // pdftoppm prints its version on stderr
    let text = if output.stdout.is_empty() {
        String::from_utf8_lossy(&output.stderr).to_string()
    } else {
        String::from_utf8_lossy(&output.stdout).to_string()
    };
    match text.lines().next().map(str::trim) {
        Some(line) if !line.is_empty() && line.len() < 80 => {
            format!("{} ({})", line, path.display())
        }
        _ => found(),
    }
}

// ============ Serve Command (Web Server) ============

#[cfg(feature = "web")]
fn run_serve(args: &ServeArgs) -> anyhow::Result<i32> {
    let config = load_config(&args.erase).merge_with_cli(&args.erase.overrides());
    let processor = DocumentProcessor::new(config.to_options())
        .with_dpi(config.dpi)
        .with_threads(config.threads);

    let server_config = ServerConfig::default()
        .with_port(args.port)
        .with_bind(&args.bind)
        .with_upload_limit(args.upload_limit * 1024 * 1024);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let server = WebServer::with_config(server_config, processor);
        server.run().await.map_err(|e| anyhow::anyhow!("{}", e))
    })?;

    Ok(exit_codes::SUCCESS)
}

//! Server binary for lesson-planner.
//!
//! A thin shim over the library crate that maps CLI flags and environment
//! variables to `GenerationConfig` / `ServerConfig` and serves the API.

use anyhow::{Context, Result};
use clap::Parser;
use lesson_planner::{
    resolve_client, AppState, GenerationConfig, LessonPlanner, PdfTextExtractor, ServerConfig,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"ENDPOINTS:
  GET  /               health check
  POST /api/upload     multipart form, file field "pdf"  → {"text": ...}
  POST /api/generate   {"pdfText": ..., "answers": {...}} → {"lessonPlan": ...}

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY        Google Gemini API key (required for generation)
  PORT                  Listen port (default 5000)
  LESSON_PLANNER_MODEL  Override model ID
  RUST_LOG              tracing filter, overrides --verbose/--quiet

  A .env file in the working directory is loaded before flags are parsed.

Without GEMINI_API_KEY the server still starts; every generate request
then returns the fallback template."#;

/// Serve the lesson planner backend.
#[derive(Parser, Debug)]
#[command(
    name = "lesson-planner",
    version,
    about = "Lesson plan generator backend: PDF upload, text extraction and LLM generation",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Interface to bind.
    #[arg(long, env = "LESSON_PLANNER_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Listen port.
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    port: u16,

    /// LLM model ID.
    #[arg(long, env = "LESSON_PLANNER_MODEL", default_value = lesson_planner::config::DEFAULT_MODEL)]
    model: String,

    /// Directory where uploads are staged during extraction.
    #[arg(long, env = "LESSON_PLANNER_UPLOAD_DIR", default_value = "uploads")]
    upload_dir: PathBuf,

    /// Largest accepted upload in MiB.
    #[arg(long, env = "LESSON_PLANNER_MAX_UPLOAD_MB", default_value_t = 20)]
    max_upload_mb: usize,

    /// Generation attempts per request, including the first.
    #[arg(long, env = "LESSON_PLANNER_MAX_ATTEMPTS", default_value_t = 5)]
    max_attempts: u32,

    /// Per-call generation timeout in seconds.
    #[arg(long, env = "LESSON_PLANNER_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Return HTTP 500 instead of the template plan when generation fails.
    #[arg(long, env = "LESSON_PLANNER_NO_FALLBACK")]
    no_fallback: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is not an error.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let generation = GenerationConfig::builder()
        .model(cli.model.clone())
        .max_attempts(cli.max_attempts)
        .api_timeout_ms(cli.api_timeout.saturating_mul(1000))
        .fallback_enabled(!cli.no_fallback)
        .build()
        .context("Invalid generation configuration")?;

    let server = ServerConfig::builder()
        .host(cli.host.clone())
        .port(cli.port)
        .upload_dir(cli.upload_dir.clone())
        .max_upload_bytes(cli.max_upload_mb.saturating_mul(1024 * 1024))
        .build()
        .context("Invalid server configuration")?;

    tokio::fs::create_dir_all(&server.upload_dir)
        .await
        .with_context(|| format!("Failed to create upload dir {:?}", server.upload_dir))?;

    info!(
        "Starting lesson-planner: model={}, max_attempts={}, fallback={}",
        generation.model, generation.max_attempts, generation.fallback_enabled
    );

    // ── Wire and serve ───────────────────────────────────────────────────
    let client = resolve_client(&generation);
    let planner = LessonPlanner::new(client, generation);
    let extractor = Arc::new(PdfTextExtractor::new(&server.upload_dir));

    lesson_planner::serve(&server, AppState::new(planner, extractor))
        .await
        .context("Server failed")?;

    Ok(())
}

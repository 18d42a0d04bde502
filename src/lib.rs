//! # lesson-planner
//!
//! Backend for a lesson planning form: extract text from an uploaded PDF,
//! then ask a hosted LLM to turn that text and five teacher answers into a
//! lesson plan.
//!
//! ## Request Flow
//!
//! ```text
//! POST /api/upload    multipart pdf ──▶ stage ──▶ lopdf ──▶ {"text"}
//! POST /api/generate  {pdfText, answers}
//!                      │
//!                      ├─ 1. Prompt    instruction + text + answers JSON
//!                      ├─ 2. Generate  up to 5 attempts, 429/500/503 retried
//!                      ├─ 3. Backoff   retryDelay + 2 s, else 5 s · 2ⁿ
//!                      └─ 4. Fallback  deterministic template on failure
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lesson_planner::{
//!     resolve_client, AppState, GenerationConfig, LessonPlanner, PdfTextExtractor,
//!     ServerConfig,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credential read from GEMINI_API_KEY
//!     let generation = GenerationConfig::default();
//!     let server = ServerConfig::default();
//!     let planner = LessonPlanner::new(resolve_client(&generation), generation);
//!     let extractor = Arc::new(PdfTextExtractor::new(&server.upload_dir));
//!     lesson_planner::serve(&server, AppState::new(planner, extractor)).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `lesson-planner` binary (clap + anyhow + tracing-subscriber + dotenvy) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod answers;
pub mod config;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use answers::AnswerSet;
pub use config::{GenerationConfig, GenerationConfigBuilder, ServerConfig, ServerConfigBuilder};
pub use error::{GenerationError, PlannerError};
pub use generate::LessonPlanner;
pub use output::{GenerationResult, FALLBACK_NOTE};
pub use pipeline::extract::{PdfTextExtractor, TextExtractor};
pub use pipeline::fallback::fallback_lesson_plan;
pub use pipeline::llm::{resolve_client, GenerationClient, ProviderClient, UnconfiguredClient};
pub use pipeline::retry::{RetryPolicy, Sleeper, TokioSleeper};
pub use server::{router, serve, AppState};

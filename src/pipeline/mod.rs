//! Pipeline stages behind the two HTTP endpoints.
//!
//! ## Data Flow
//!
//! ```text
//! upload:   bytes ──▶ extract ──▶ text
//! generate: text + answers ──▶ llm (retry) ──▶ plan
//!                                   └─ exhausted ──▶ fallback
//! ```
//!
//! 1. [`extract`]  — stage the upload on disk and read its text; parsing runs
//!    in `spawn_blocking` because lopdf is synchronous
//! 2. [`llm`]      — the generation client seam and its provider-backed impl
//! 3. [`retry`]    — error classification and backoff delay computation
//! 4. [`fallback`] — deterministic template used when generation is unavailable

pub mod extract;
pub mod fallback;
pub mod llm;
pub mod retry;

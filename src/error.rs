//! Error types for the lesson-planner library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`PlannerError`] — **Request-fatal**: the current request cannot be
//!   answered normally (missing input, unreadable PDF, generation surfaced as
//!   a hard failure). Returned as `Err(PlannerError)` from the extraction and
//!   generation entry points and mapped to an HTTP status by the server.
//!
//! * [`GenerationError`] — **Per-attempt**: a single call to the generation
//!   API failed. It is classified as retryable or not and consumed by the
//!   retry loop in [`crate::generate`]; callers only see it wrapped in
//!   [`PlannerError::GenerationFailed`] when fallback is disabled.
//!
//! Nothing here is fatal to the process. Every failure is scoped to one
//! request/response cycle.

use crate::pipeline::retry;
use std::time::Duration;
use thiserror::Error;

/// All request-scoped errors returned by the lesson-planner library.
#[derive(Debug, Error)]
pub enum PlannerError {
    // ── Client input errors ───────────────────────────────────────────────
    /// The upload request carried no `pdf` file part.
    #[error("No file uploaded")]
    MissingFile,

    /// The multipart body could not be read.
    #[error("Malformed upload: {detail}")]
    MalformedUpload { detail: String },

    /// The generate request is missing `pdfText` or `answers`.
    #[error("Missing pdfText or answers")]
    MissingGenerationInput,

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The uploaded bytes do not start with the PDF magic number.
    #[error("Uploaded file is not a valid PDF (first bytes: {magic:?})")]
    NotAPdf { magic: Vec<u8> },

    /// The PDF structure could not be parsed or its text could not be read.
    #[error("PDF is corrupt or unreadable: {detail}")]
    CorruptPdf { detail: String },

    /// The PDF is encrypted; text extraction is not attempted.
    #[error("PDF is encrypted and cannot be read")]
    EncryptedPdf,

    /// Staging the upload on disk failed.
    #[error("Failed to stage upload: {source}")]
    Staging {
        #[source]
        source: std::io::Error,
    },

    // ── Generation errors ─────────────────────────────────────────────────
    /// Generation failed and fallback is disabled.
    #[error("Generation failed after {attempts} attempt(s): {source}")]
    GenerationFailed {
        attempts: u32,
        #[source]
        source: GenerationError,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlannerError {
    /// `true` when the caller sent a bad request (maps to HTTP 400).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PlannerError::MissingFile
                | PlannerError::MalformedUpload { .. }
                | PlannerError::MissingGenerationInput
        )
    }

    /// `true` for failures raised while reading the uploaded PDF.
    pub fn is_extraction_error(&self) -> bool {
        matches!(
            self,
            PlannerError::NotAPdf { .. }
                | PlannerError::CorruptPdf { .. }
                | PlannerError::EncryptedPdf
                | PlannerError::Staging { .. }
        )
    }
}

/// A single failed call to the generation API.
///
/// Construct from a raw upstream message with [`GenerationError::from_message`],
/// which applies the retry classification in [`crate::pipeline::retry`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    /// Rate limit (429), overload (503), server error (500), or a message that
    /// carries an explicit `retryDelay`.
    #[error("{message}")]
    Retryable {
        message: String,
        /// Server-suggested wait, parsed from the error payload.
        retry_after: Option<Duration>,
    },

    /// Any other upstream failure: bad request, auth, missing model, ….
    #[error("{message}")]
    NonRetryable { message: String },

    /// The call did not complete within the per-call timeout.
    #[error("Generation call timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },
}

impl GenerationError {
    /// Classify a raw upstream error message.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        if retry::is_retryable_message(&message) {
            let retry_after = retry::parse_suggested_delay(&message);
            GenerationError::Retryable {
                message,
                retry_after,
            }
        } else {
            GenerationError::NonRetryable { message }
        }
    }

    /// Whether the retry loop should try again after this error.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, GenerationError::NonRetryable { .. })
    }

    /// The server-suggested delay, if the upstream payload carried one.
    pub fn suggested_delay(&self) -> Option<Duration> {
        match self {
            GenerationError::Retryable { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

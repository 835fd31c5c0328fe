//! Error types for the pdfquiz library.
//!
//! Each pipeline stage owns its error type, and [`QuizgenError`] gathers them
//! for callers that drive the whole flow:
//!
//! * [`ExtractionError`]: the upload itself is unusable (not a PDF, no text).
//!   Always the client's fault: HTTP 400.
//! * [`GenerationError`]: the language-model call failed or answered with
//!   something that does not match the declared quiz schema. A missing API key
//!   is a configuration fault, everything else a provider fault: HTTP 500.
//! * [`PersistenceError`]: the datastore refused a read or write. `NotFound`
//!   maps to 404, the rest to a generic 500.
//!
//! Use [`QuizgenError::status_code`] to map any of them onto HTTP.

use thiserror::Error;

/// The uploaded document could not be turned into text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Zero-byte upload.
    #[error("The uploaded file is empty.")]
    EmptyUpload,

    /// The bytes do not start with the `%PDF` magic.
    #[error("The uploaded file is not a PDF (first bytes: {magic:?}).")]
    NotAPdf { magic: Vec<u8> },

    /// Header/trailer/xref is corrupt and cannot be parsed.
    #[error("The PDF could not be parsed: {detail}")]
    CorruptPdf { detail: String },

    /// Password-protected documents are not supported.
    #[error("The PDF is encrypted; upload an unprotected copy.")]
    Encrypted,

    /// Parsed fine, but every page came back empty (e.g. a scanned document).
    #[error("No extractable text found in the PDF ({pages} pages scanned).")]
    NoExtractableText { pages: usize },
}

/// The quiz could not be generated.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The provider credential is missing. Never retried.
    #[error("LLM provider '{provider}' is not configured: {hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The provider call returned an error.
    #[error("LLM API error: {message}")]
    Api { message: String },

    /// The provider call did not complete within the configured timeout.
    #[error("LLM call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The model answered with text that is not a JSON quiz.
    #[error("Malformed quiz returned by the model: {detail}")]
    MalformedOutput { detail: String },

    /// The model answered with JSON that violates the declared quiz schema.
    #[error("Quiz returned by the model does not match the schema: {}", errors.join("; "))]
    SchemaViolation { errors: Vec<String> },
}

impl GenerationError {
    /// `true` when the failure is caused by deployment configuration rather
    /// than by the provider.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::ProviderNotConfigured { .. })
    }
}

/// The datastore refused an operation.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// All errors surfaced by the pdfquiz library.
#[derive(Debug, Error)]
pub enum QuizgenError {
    // ── Client errors ─────────────────────────────────────────────────────
    /// The request itself is malformed (missing field, bad body).
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    // ── Provider errors ───────────────────────────────────────────────────
    #[error(transparent)]
    Generation(#[from] GenerationError),

    // ── Storage errors ────────────────────────────────────────────────────
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    // ── Input errors (CLI) ────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: std::path::PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl QuizgenError {
    /// HTTP status code for this error.
    ///
    /// Kept as a plain `u16` so the library error type does not depend on
    /// the web framework; the server converts it.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::Extraction(_) => 400,
            Self::Persistence(PersistenceError::NotFound { .. }) => 404,
            Self::FileNotFound { .. } => 404,
            Self::DownloadFailed { .. } | Self::DownloadTimeout { .. } => 502,
            Self::Generation(_)
            | Self::Persistence(_)
            | Self::InvalidConfig(_)
            | Self::Internal(_) => 500,
        }
    }

    /// Message safe to hand back to the client.
    ///
    /// Generation errors are surfaced verbatim; database internals are not.
    pub fn public_message(&self) -> String {
        match self {
            Self::Persistence(PersistenceError::Database(_)) => {
                "Failed to access the quiz database.".to_string()
            }
            Self::Internal(_) => "Internal server error.".to_string(),
            other => other.to_string(),
        }
    }
}

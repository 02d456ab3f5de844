// src/infra/errors.rs — Error types for ideaforge

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForgeError {
    // Seed errors (fatal at startup)
    #[error(
        "Seed file not found: {}. Set IDEAFORGE_SEED_FILE or pass --seed with a JSONL file (one candidate per line).",
        path.display()
    )]
    SeedMissing { path: PathBuf },

    #[error("Seed file contains no candidates: {}", path.display())]
    SeedEmpty { path: PathBuf },

    #[error("Invalid JSON on line {line} of {}: {message}", path.display())]
    SeedMalformed {
        path: PathBuf,
        line: usize,
        message: String,
    },

    // Generation document
    #[error("Generation document is structurally invalid: {0}")]
    InvalidDocument(String),

    // LLM utility
    #[error("Provider '{provider}' error: {message}")]
    Provider {
        provider: String,
        message: String,
        retriable: bool,
    },

    #[error("No provider configured. Set OPENAI_API_KEY to use the drafting utility.")]
    NoProvider,

    // Infra
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ForgeError {
    /// Startup errors the caller cannot recover from by reseeding.
    pub fn is_fatal_seed_error(&self) -> bool {
        matches!(
            self,
            ForgeError::SeedMissing { .. }
                | ForgeError::SeedEmpty { .. }
                | ForgeError::SeedMalformed { .. }
        )
    }
}

/// Failure modes of the handoff suspension point.
#[derive(Error, Debug)]
pub enum HandoffError {
    #[error("Handoff wait was cancelled")]
    Cancelled,

    #[error("Confirmation channel closed before the human confirmed")]
    ChannelClosed,

    #[error("IO error while waiting for confirmation: {0}")]
    Io(#[from] std::io::Error),
}

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("quantity for '{category}' must be zero or positive (got {quantity})")]
    InvalidInput { category: String, quantity: f64 },

    #[error("recipient name is required before a quotation can be generated")]
    MissingRecipient,

    #[error("category '{0}' is not in the tariff table")]
    CategoryNotFound(String),

    #[error("failed to render quotation: {0}")]
    Render(#[from] tera::Error),

    #[error("missing {kind} (expected under {path:?})")]
    AssetMissing { kind: &'static str, path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, QuoteError>;

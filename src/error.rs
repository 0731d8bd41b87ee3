//! Error types for the budget agents

use thiserror::Error;

/// Result type alias for budget agent operations
pub type Result<T> = std::result::Result<T, BudgetError>;

#[derive(Error, Debug)]
pub enum BudgetError {

    // =============================
    // Core Pipeline Errors
    // =============================

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Text generation error: {0}")]
    GenerationError(String),

    /// The text generator answered but returned nothing usable
    #[error("No usable content from text generator: {0}")]
    NoContent(String),

    #[error("Cost of living lookup error: {0}")]
    CostOfLivingError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

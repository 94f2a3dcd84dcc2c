//! Error handling for SurfScan-RS
//!
//! This module defines the error type shared by every component and a
//! Result alias for use throughout the crate.
//!
//! Two conditions are *not* errors: starting a session while
//! another one is running (the engine cancels the old one first) and
//! cancelling a session that already terminated (a no-op).

use thiserror::Error;

/// Main error type for SurfScan-RS operations
#[derive(Error, Debug)]
pub enum ScanError {
    /// Grid size must be at least one cell
    #[error("Invalid grid dimension: size must be positive, got {size}")]
    InvalidDimension { size: usize },

    /// Two grids that must agree on size do not
    #[error("Dimension mismatch: expected {expected}x{expected}, got {actual}x{actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Cross-section row outside the grid
    #[error("Invalid row index {row}: must lie in [0, {}]", .size.saturating_sub(1))]
    InvalidRowIndex { row: usize, size: usize },

    /// Cell address outside the grid
    #[error("Cell ({row}, {col}) is outside a {size}x{size} grid")]
    CellOutOfBounds { row: usize, col: usize, size: usize },

    /// Present heights must be finite
    #[error("Non-finite height at ({row}, {col})")]
    InvalidHeight { row: usize, col: usize },

    /// Stream batch size of zero
    #[error("Invalid batch size {0}: must be at least 1")]
    InvalidBatchSize(usize),

    /// Noise amplitude that is negative or not finite
    #[error("Invalid noise amplitude {0}: must be finite and non-negative")]
    InvalidNoiseAmplitude(f64),

    /// Malformed CSV input
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to channel communication
    #[error("Channel error: {0}")]
    Channel(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ScanError>,
    },
}

impl ScanError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ScanError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with all context layers removed
    pub fn root(&self) -> &ScanError {
        match self {
            ScanError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Result type alias for SurfScan-RS operations
pub type Result<T> = std::result::Result<T, ScanError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ScanError::Io(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| ScanError::Io(e).with_context(f()))
    }
}

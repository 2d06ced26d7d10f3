//! Error types for ConvLSTM cells and layers.

use thiserror::Error;

/// Errors raised while building or running a ConvLSTM.
///
/// Nothing inside the crate recovers from these: a failing step aborts the
/// whole sequence and the error is handed back to the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConvLstmError {
    /// The caller asked for behaviour the layer does not implement, such as
    /// chaining an explicit initial state across calls.
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(&'static str),

    /// A tensor did not have the shape the configuration requires.
    #[error("shape mismatch in {context}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        context: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// Construction parameters that can never produce a working cell.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl ConvLstmError {
    pub(crate) fn shape(
        context: &'static str,
        expected: impl Into<Vec<usize>>,
        actual: impl Into<Vec<usize>>,
    ) -> Self {
        Self::ShapeMismatch {
            context,
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ConvLstmError>;

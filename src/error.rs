//! Error kinds returned by the signal core.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignalError {
    #[error("computation requested on an empty series")]
    EmptySeries,

    #[error("insufficient history: need at least {required} points, have {available}")]
    InsufficientHistory { required: usize, available: usize },

    #[error("misaligned series: {reason}")]
    MisalignedSeries { reason: String },

    #[error("invalid input at index {index}: {reason}")]
    InvalidInput { index: usize, reason: String },

    #[error("unsupported combination: {what}")]
    Unsupported { what: String },
}

impl SignalError {
    pub fn invalid(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            index,
            reason: reason.into(),
        }
    }

    pub fn misaligned(reason: impl Into<String>) -> Self {
        Self::MisalignedSeries {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SignalError>;

/// Fails with `InvalidInput` on the first non-finite value.
pub(crate) fn ensure_finite(values: &[f64], what: &str) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(SignalError::invalid(
            index,
            format!("{} produced a non-finite value ({})", what, values[index]),
        )),
        None => Ok(()),
    }
}

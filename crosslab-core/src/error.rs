//! Error taxonomy for the signal pipeline.
//!
//! Two kinds reach the caller:
//! - [`InvalidArgument`]: a precondition was violated. Detected before any
//!   computation; no partial result is produced.
//! - [`DataError`]: the loader could not supply data. Surfaced unchanged and
//!   never retried here.

use chrono::NaiveDate;
use thiserror::Error;

use crate::data::DataError;
use crate::domain::WindowRole;

/// Precondition violations for engine and request inputs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidArgument {
    #[error("series is empty")]
    EmptySeries,

    #[error("{role} window must be >= 1")]
    ZeroWindow { role: WindowRole },

    #[error("{role} window {value} is outside the allowed range [{min}, {max}]")]
    WindowOutOfRange {
        role: WindowRole,
        value: usize,
        min: usize,
        max: usize,
    },

    #[error("dates are not strictly ascending at index {index}: {previous} then {current}")]
    NonAscendingDates {
        index: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error("close at index {index} ({date}) must be a positive finite number, got {close}")]
    InvalidClose {
        index: usize,
        date: NaiveDate,
        close: f64,
    },

    #[error("start date {start} is after end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("symbol must not be empty")]
    EmptySymbol,
}

/// Everything the loader → engine pipeline can fail with.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] InvalidArgument),

    #[error("data unavailable: {0}")]
    DataUnavailable(#[from] DataError),
}

impl EngineError {
    /// Short category label for display ("INPUT" / "DATA").
    pub fn category(&self) -> &'static str {
        match self {
            EngineError::InvalidArgument(_) => "INPUT",
            EngineError::DataUnavailable(_) => "DATA",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_input() {
        let err = InvalidArgument::WindowOutOfRange {
            role: WindowRole::Long,
            value: 250,
            min: 1,
            max: 200,
        };
        assert_eq!(
            err.to_string(),
            "long window 250 is outside the allowed range [1, 200]"
        );

        let err = InvalidArgument::ZeroWindow {
            role: WindowRole::Short,
        };
        assert_eq!(err.to_string(), "short window must be >= 1");
    }

    #[test]
    fn data_errors_pass_through_unchanged() {
        let source = DataError::SymbolNotFound {
            symbol: "NOPE".into(),
        };
        let expected = source.to_string();
        let err: EngineError = source.into();
        assert_eq!(err.category(), "DATA");
        match err {
            EngineError::DataUnavailable(inner) => assert_eq!(inner.to_string(), expected),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn invalid_argument_category() {
        let err: EngineError = InvalidArgument::EmptySeries.into();
        assert_eq!(err.category(), "INPUT");
        assert_eq!(err.to_string(), "invalid argument: series is empty");
    }
}

//! Comparison Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A comparison error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for comparison operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// An exclusion pattern is not a valid shell glob.
    #[display("invalid exclusion pattern `{_0}`")]
    InvalidPattern(#[error(not(source))] String),
    /// A change kind name was not recognised.
    #[display("unknown change kind `{_0}`")]
    UnknownKind(#[error(not(source))] String),
    /// Records were left without a change after classification. Always a
    /// bug in the classifier, never a property of the input.
    #[display("classification left {old} old and {new} new records unpaired")]
    Unpaired { old: usize, new: usize },
    /// Writing the report failed.
    #[display("could not write report")]
    Report,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::InvalidPattern("[".to_string()).to_string(), "invalid exclusion pattern `[`");
        assert_eq!(
            ErrorKind::Unpaired { old: 1, new: 0 }.to_string(),
            "classification left 1 old and 0 new records unpaired"
        );
    }

    #[test]
    fn error_kind_retryable() {
        assert!(ErrorKind::Report.is_retryable());
        assert!(!ErrorKind::Unpaired { old: 0, new: 1 }.is_retryable());
    }
}

//! Error and warning types for log parsing.

use std::fmt;

use thiserror::Error;

/// Malformed or incomplete log text.
///
/// Fatal for the parse call that produced it: no partial datasets are
/// returned alongside.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// Input was empty or whitespace only.
    #[error("empty input: no family separator can be located")]
    EmptyInput,

    /// A section header could not be located.
    #[error("family separator not found: missing header {header:?}")]
    SeparatorNotFound { header: String },

    /// A record line carried a token that is not a finite number.
    #[error("{family} record at line {line}: invalid number {token:?} for {field}")]
    InvalidNumber {
        family: String,
        line: usize,
        field: String,
        token: String,
    },

    /// A record line had an empty trial value list.
    #[error("{family} record at line {line}: trial value list is empty")]
    EmptyTrialList { family: String, line: usize },
}

/// A family section parsed cleanly but contained no records.
///
/// Not an error: renderers should skip or report the family instead of
/// drawing an empty figure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyResultWarning {
    pub family: String,
}

impl fmt::Display for EmptyResultWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no records found for family {}", self.family)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_problem() {
        let err = FormatError::SeparatorNotFound {
            header: "Delta实验结果:".into(),
        };
        assert!(err.to_string().contains("family separator not found"));

        let err = FormatError::InvalidNumber {
            family: "Delta".into(),
            line: 3,
            field: "delta_min".into(),
            token: "abc".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("line 3"));
        assert!(msg.contains("\"abc\""));
    }

    #[test]
    fn test_warning_display() {
        let w = EmptyResultWarning { family: "Epsilon".into() };
        assert_eq!(w.to_string(), "no records found for family Epsilon");
    }
}

//! STEP read failures.

use thiserror::Error;

/// Why a STEP file could not be turned into a [`crate::Shape`].
#[derive(Error, Debug)]
pub enum StepError {
    /// The file could not be read.
    #[error("cannot read file: {0}")]
    Io(#[from] std::io::Error),

    /// Bytes that do not form a valid Part 21 token.
    #[error("syntax error at {line}:{col}: {message}")]
    Lexer {
        /// 1-based line.
        line: usize,
        /// 1-based column.
        col: usize,
        /// What went wrong.
        message: String,
    },

    /// Tokens that do not form a valid exchange structure.
    #[error("malformed {}: {message}", entity_id.map_or_else(|| "file".to_string(), |id| format!("entity #{id}")))]
    Parser {
        /// Offending entity, when known.
        entity_id: Option<u64>,
        /// What went wrong.
        message: String,
    },

    /// A `#id` reference to an entity the file does not define.
    #[error("dangling reference to #{0}")]
    MissingEntity(u64),

    /// An entity whose values cannot describe real geometry.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// An entity of the wrong type where a specific one is required.
    #[error("expected {expected}, found {actual}")]
    TypeMismatch {
        /// Required type.
        expected: String,
        /// Type found.
        actual: String,
    },

    /// No solid and no shell anywhere in the file.
    #[error("file contains no solids or shells")]
    NoShape,
}

impl StepError {
    pub(crate) fn lexer(line: usize, col: usize, message: impl Into<String>) -> Self {
        Self::Lexer {
            line,
            col,
            message: message.into(),
        }
    }

    pub(crate) fn parser(entity_id: Option<u64>, message: impl Into<String>) -> Self {
        Self::Parser {
            entity_id,
            message: message.into(),
        }
    }

    pub(crate) fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// Result alias for STEP reading.
pub type Result<T> = std::result::Result<T, StepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            StepError::parser(Some(12), "duplicate entity ID").to_string(),
            "malformed entity #12: duplicate entity ID"
        );
        assert_eq!(
            StepError::parser(None, "missing DATA section").to_string(),
            "malformed file: missing DATA section"
        );
        assert_eq!(StepError::lexer(3, 7, "bad char").to_string(), "syntax error at 3:7: bad char");
        assert_eq!(StepError::MissingEntity(5).to_string(), "dangling reference to #5");
    }
}

use std::fmt;

use thiserror::Error;

/// Every problem found while validating a policy, reform or assumption
/// file. Messages are collected so a caller sees all of them at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    messages: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// `Ok(())` when nothing was recorded, otherwise the whole report as a
    /// validation error.
    pub fn into_result(self) -> Result<(), PolicyError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(PolicyError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, message) in self.messages.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "ERROR: {message}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("{0}")]
    Validation(ValidationReport),

    #[error("tax year {year} is outside the supported range {first}..={last}")]
    YearOutOfRange { year: i32, first: i32, last: i32 },

    #[error("policy parameter '{name}' has no value for {year}")]
    MissingParameter { name: String, year: i32 },

    #[error("invalid {what} JSON: {source}")]
    Json {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum DataError {
    #[error("expected {expected} filing units after computation, found {actual}")]
    RowCountMismatch { expected: usize, actual: usize },

    #[error("record {recid} has MARS={code}; filing status must be 1..=5")]
    InvalidFilingStatus { recid: i64, code: i64 },

    #[error("unknown variable '{0}' is not in the record variable universe")]
    UnknownVariable(String),

    #[error("line {line}, column '{column}': {reason}")]
    Malformed {
        line: usize,
        column: String,
        reason: String,
    },

    #[error("input has no header row")]
    MissingHeader,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failure of a whole calculation run.
#[derive(Debug, Error)]
pub enum TaxCalcError {
    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Data(#[from] DataError),
}

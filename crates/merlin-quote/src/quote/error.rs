use super::registry::RegistryError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// One structural problem found while authenticating a quote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub field: String,
    pub expected: String,
    pub received: String,
}

impl Violation {
    pub fn new(
        field: impl Into<String>,
        expected: impl Into<String>,
        received: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
            received: received.into(),
        }
    }
}

/// Every violation found for one candidate, in check order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationFailure {
    pub fingerprint: String,
    pub violations: Vec<Violation>,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self
            .violations
            .iter()
            .map(|violation| violation.field.as_str())
            .collect();
        write!(
            f,
            "{} violation(s) in {}",
            self.violations.len(),
            fields.join(", ")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuoteError {
    #[error("unknown industry '{slug}'")]
    UnknownIndustry { slug: String },
    #[error("quote failed validation: {0}")]
    Validation(ValidationFailure),
    #[error("calculation for {fingerprint} was superseded by newer input")]
    Superseded { fingerprint: String },
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl QuoteError {
    pub fn violations(&self) -> Option<&[Violation]> {
        match self {
            QuoteError::Validation(failure) => Some(&failure.violations),
            _ => None,
        }
    }
}

impl From<ValidationFailure> for QuoteError {
    fn from(value: ValidationFailure) -> Self {
        Self::Validation(value)
    }
}

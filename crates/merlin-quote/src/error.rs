use crate::config::ConfigError;
use crate::quote::{MappingAuditError, PriceSheetError, QuoteError, RegistryError};
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Quote(QuoteError),
    Registry(RegistryError),
    MappingAudit(MappingAuditError),
    PriceSheet(PriceSheetError),
    /// The offline mapping audit found unmapped or dangling entries.
    MappingViolations(usize),
    /// Malformed operator input, such as a `key=value` pair on the command line.
    Input(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Quote(err) => write!(f, "quote error: {}", err),
            AppError::Registry(err) => write!(f, "registry error: {}", err),
            AppError::MappingAudit(err) => write!(f, "mapping audit error: {}", err),
            AppError::PriceSheet(err) => write!(f, "price sheet error: {}", err),
            AppError::MappingViolations(count) => {
                write!(f, "mapping audit found {} violation(s)", count)
            }
            AppError::Input(message) => write!(f, "invalid input: {}", message),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Quote(err) => Some(err),
            AppError::Registry(err) => Some(err),
            AppError::MappingAudit(err) => Some(err),
            AppError::PriceSheet(err) => Some(err),
            AppError::MappingViolations(_) | AppError::Input(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Quote(QuoteError::UnknownIndustry { .. }) => StatusCode::NOT_FOUND,
            AppError::Quote(QuoteError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Quote(QuoteError::Superseded { .. }) => StatusCode::CONFLICT,
            AppError::Input(_) => StatusCode::BAD_REQUEST,
            AppError::Quote(QuoteError::Registry(_))
            | AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Registry(_)
            | AppError::MappingAudit(_)
            | AppError::PriceSheet(_)
            | AppError::MappingViolations(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<QuoteError> for AppError {
    fn from(value: QuoteError) -> Self {
        Self::Quote(value)
    }
}

impl From<RegistryError> for AppError {
    fn from(value: RegistryError) -> Self {
        Self::Registry(value)
    }
}

impl From<MappingAuditError> for AppError {
    fn from(value: MappingAuditError) -> Self {
        Self::MappingAudit(value)
    }
}

impl From<PriceSheetError> for AppError {
    fn from(value: PriceSheetError) -> Self {
        Self::PriceSheet(value)
    }
}

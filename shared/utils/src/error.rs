use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum PatentwatchError {
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Ingestion error: {message}")]
    Ingestion { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Email delivery error: {message}")]
    EmailDelivery { message: String },

    #[error("Persistence error: {message}")]
    Persistence { message: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl PatentwatchError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn ingestion(message: impl Into<String>) -> Self {
        Self::Ingestion {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn email_delivery(message: impl Into<String>) -> Self {
        Self::EmailDelivery {
            message: message.into(),
        }
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Ingestion { .. } => "INGESTION_ERROR",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::EmailDelivery { .. } => "EMAIL_DELIVERY_ERROR",
            Self::Persistence { .. } => "PERSISTENCE_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Internal { .. } => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::Ingestion { .. } => 422,
            Self::Configuration { .. } => 500,
            Self::EmailDelivery { .. } => 502,
            Self::Persistence { .. } => 500,
            Self::NotFound { .. } => 404,
            Self::Internal { .. } => 500,
        }
    }
}

pub type PatentwatchResult<T> = Result<T, PatentwatchError>;

/// Failure modes of one email send attempt.
///
/// Recoverable by the next cycle, never fatal to the process. The variant
/// tells the operator whether to fix credentials, connectivity, or read the
/// detail; none of them carries the secret credential.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    #[error("authentication failed: check the sender account and authorization code")]
    Auth,

    #[error("connection failed: check the SMTP host and port")]
    Connect,

    #[error("send failed: {0}")]
    Other(String),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub message: String,
}

impl From<PatentwatchError> for ErrorResponse {
    fn from(error: PatentwatchError) -> Self {
        Self {
            error: error.to_string(),
            code: error.error_code().to_string(),
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for PatentwatchError {
    fn from(error: serde_json::Error) -> Self {
        Self::persistence(error.to_string())
    }
}

impl From<std::io::Error> for PatentwatchError {
    fn from(error: std::io::Error) -> Self {
        Self::persistence(error.to_string())
    }
}

//! # Error Handling
//!
//! Every fallible operation in this crate returns [`CrudError`]. Variants are grouped into
//! an [`ErrorKind`] so callers can route errors (for example to an HTTP status) without
//! inspecting message text:
//!
//! | kind | variants | HTTP |
//! |---|---|---|
//! | `Configuration` | `MetaNotFound`, `OptionNotFound` | 500 |
//! | `Validation` | `Validation`, `PrefixNotAllowed`, `InvalidSortDirection`, `UnknownColumn` | 400 / 422 |
//! | `NotFound` | `NotFound` | 404 |
//! | `Integrity` | `Create`, `Update` | 409 |
//! | `Unsupported` | `UnsupportedOperator`, `NotImplemented` | 400 |
//! | `Database` | `Database` | 500 |
//!
//! Parameters that reference columns outside an allow-list are never reported as errors;
//! they are dropped before a statement is built.
//!
//! ## Logging
//!
//! Internal details (database errors, configuration problems) are logged with `tracing`
//! when the error is turned into a response and are never sent to the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;

/// Coarse classification of a [`CrudError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Validation,
    NotFound,
    Integrity,
    Unsupported,
    Database,
}

#[derive(Debug, thiserror::Error)]
pub enum CrudError {
    /// No configuration section exists for the named controller.
    #[error("Configuration for controller <{controller}> not found.")]
    MetaNotFound { controller: String },

    /// A required controller option was never supplied.
    #[error("Option <{option}> not set in controller configuration.")]
    OptionNotFound { option: String },

    /// Input failed deserialization or validation.
    #[error("{}", .errors.join("; "))]
    Validation { errors: Vec<String> },

    /// An operator-prefixed parameter used a prefix outside the supported set.
    #[error("Prefix <{prefix}> not allowed.")]
    PrefixNotAllowed { prefix: String },

    #[error("Field <{field}> contain value <{value}>. But must contain value <asc> or <desc>.")]
    InvalidSortDirection { field: String, value: String },

    #[error("Column <{column}> does not exist.")]
    UnknownColumn { column: String },

    #[error("Operator <{operator}> is not supported.")]
    UnsupportedOperator { operator: String },

    #[error("Expression <{0}> not implemented.")]
    NotImplemented(String),

    #[error("{resource} with ID '{id}' not found")]
    NotFound { resource: String, id: String },

    /// The storage layer rejected an insert; the transaction was rolled back.
    #[error("Failed to create {resource}: {message}")]
    Create { resource: String, message: String },

    /// The storage layer rejected an update; the transaction was rolled back.
    #[error("Failed to update {resource}: {message}")]
    Update { resource: String, message: String },

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl CrudError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            errors: vec![message.into()],
        }
    }

    pub fn not_found(resource: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.to_string(),
        }
    }

    pub fn unknown_column(column: impl Into<String>) -> Self {
        Self::UnknownColumn {
            column: column.into(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MetaNotFound { .. } | Self::OptionNotFound { .. } => ErrorKind::Configuration,
            Self::Validation { .. }
            | Self::PrefixNotAllowed { .. }
            | Self::InvalidSortDirection { .. }
            | Self::UnknownColumn { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Create { .. } | Self::Update { .. } => ErrorKind::Integrity,
            Self::UnsupportedOperator { .. } | Self::NotImplemented(_) => ErrorKind::Unsupported,
            Self::Database(_) => ErrorKind::Database,
        }
    }

    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            _ => match self.kind() {
                ErrorKind::Validation | ErrorKind::Unsupported => StatusCode::BAD_REQUEST,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Integrity => StatusCode::CONFLICT,
                ErrorKind::Configuration | ErrorKind::Database => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    /// Message safe to show to API clients.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::Configuration => "Service is misconfigured".to_string(),
            ErrorKind::Database => "A database error occurred".to_string(),
            ErrorKind::Integrity => match self {
                Self::Create { resource, .. } => format!("Could not create {resource}"),
                Self::Update { resource, .. } => format!("Could not update {resource}"),
                _ => self.to_string(),
            },
            _ => self.to_string(),
        }
    }

    fn log_internal(&self) {
        match self.kind() {
            ErrorKind::Configuration | ErrorKind::Database => {
                tracing::error!(error = %self, "Internal error occurred");
            }
            ErrorKind::Integrity => {
                tracing::warn!(error = %self, "Write rejected by storage");
            }
            _ => {
                tracing::debug!(error = %self, status = %self.status_code(), "API error");
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<String>>,
}

impl IntoResponse for CrudError {
    fn into_response(self) -> Response {
        self.log_internal();

        let body = match &self {
            Self::Validation { errors } => ErrorResponse {
                error: "Validation failed".to_string(),
                details: Some(errors.clone()),
            },
            _ => ErrorResponse {
                error: self.user_message(),
                details: None,
            },
        };

        (self.status_code(), Json(body)).into_response()
    }
}

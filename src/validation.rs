//! Validation Support
//!
//! Input payloads are deserialized with serde and then checked with [`Validatable`].
//! [`load`] runs both steps and reports every failure as one [`CrudError::Validation`].
//!
//! # Example
//!
//! ```rust,ignore
//! use querycrate::validation::{Validatable, ValidationError, ValidationErrors, ensure_utc};
//!
//! #[derive(serde::Deserialize)]
//! pub struct ParentCreate {
//!     pub first: String,
//!     pub created_at: Option<chrono::DateTime<chrono::FixedOffset>>,
//! }
//!
//! impl Validatable for ParentCreate {
//!     fn validate(&self) -> Result<(), ValidationErrors> {
//!         let mut errors = ValidationErrors::new();
//!         if self.first.is_empty() {
//!             errors.add(ValidationError::new("first", "must not be empty"));
//!         }
//!         if let Some(created_at) = &self.created_at
//!             && let Err(e) = ensure_utc("created_at", created_at)
//!         {
//!             errors.add(e);
//!         }
//!         errors.result()
//!     }
//! }
//! ```

use chrono::{DateTime, FixedOffset};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::fmt;

use crate::errors::CrudError;

/// Validation error with field name and message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Collection of validation errors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// # Errors
    ///
    /// Returns `self` when at least one error was collected.
    pub fn result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed with {} error(s):", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  - {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl From<ValidationErrors> for CrudError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation {
            errors: errors.errors.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Trait for payloads that need checks beyond what deserialization enforces.
pub trait Validatable {
    /// # Errors
    ///
    /// Returns every failed check.
    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

impl Validatable for Value {}

/// Deserialize `raw` into `T` and validate it.
///
/// # Errors
///
/// Returns [`CrudError::Validation`] for malformed input or failed checks.
pub fn load<T: DeserializeOwned + Validatable>(raw: Value) -> Result<T, CrudError> {
    let loaded: T = serde_json::from_value(raw).map_err(|e| CrudError::validation(e.to_string()))?;
    loaded.validate()?;
    Ok(loaded)
}

/// Timestamps accepted from clients must carry a UTC offset.
///
/// # Errors
///
/// Returns a [`ValidationError`] naming `field` and the offending offset.
pub fn ensure_utc(field: &str, value: &DateTime<FixedOffset>) -> Result<(), ValidationError> {
    if value.offset().local_minus_utc() == 0 {
        Ok(())
    } else {
        Err(ValidationError::new(
            field,
            format!(
                "Field <{field}> must be datetime with UTC timezone, but timezone: <{}>",
                value.offset()
            ),
        ))
    }
}

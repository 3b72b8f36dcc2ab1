use serde::Serialize;
use thiserror::Error;

/// Errors raised by the application store
#[derive(Debug, Error, Clone, PartialEq, Serialize)]
pub enum StoreError {
    #[error("Record not found: {0} with ID {1}")]
    NotFound(String, String),

    #[error("Store is unavailable: {0}")]
    Unavailable(String),

    #[error("Store rejected the record: {0}")]
    Rejected(String),

    #[error("Store error: {0}")]
    Other(String),
}

/// Domain-level errors
#[derive(Debug, Error, Clone, Serialize)]
pub enum DomainError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Entity not found: {0} with ID {1}")]
    EntityNotFound(String, String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Export error: {0}")]
    Export(String),
}

/// Service-level errors (what a caller of the form engine sees)
#[derive(Debug, Error, Clone, Serialize)]
pub enum ServiceError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("No insurance type selected")]
    NoCategorySelected,

    #[error("Form is not ready: {0}")]
    NotReady(String),

    #[error("Unknown form field: {0}")]
    UnknownField(String),

    #[error("Field {field} does not accept that value (expected {expected})")]
    ValueMismatch { field: String, expected: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Validation failures.
///
/// The rendered text of each variant is what the form shows inline under the field,
/// so the wording is part of the contract with the UI.
#[derive(Debug, Error, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("{label} is required")]
    Required {
        field: String,
        label: String,
    },

    #[error("Please enter a valid email")]
    InvalidEmail {
        field: String,
    },

    #[error("Please enter a valid number")]
    InvalidNumber {
        field: String,
    },

    #[error("Minimum value is {}", fmt_bound(*.min))]
    BelowMinimum {
        field: String,
        min: f64,
    },

    #[error("Maximum value is {}", fmt_bound(*.max))]
    AboveMaximum {
        field: String,
        max: f64,
    },

    #[error("Please select a valid date")]
    InvalidDate {
        field: String,
    },

    #[error("You must accept the {label}")]
    MustAccept {
        field: String,
        label: String,
    },

    #[error("Validation error: {message}")]
    Custom {
        message: String,
    },
}

/// Integral bounds print like the form author wrote them (`1900`, not `1900.0`).
pub(crate) fn fmt_bound(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

impl ValidationError {
    pub fn required(field: &str, label: &str) -> Self {
        Self::Required {
            field: field.to_string(),
            label: label.to_string(),
        }
    }

    pub fn invalid_email(field: &str) -> Self {
        Self::InvalidEmail {
            field: field.to_string(),
        }
    }

    pub fn invalid_number(field: &str) -> Self {
        Self::InvalidNumber {
            field: field.to_string(),
        }
    }

    pub fn below_minimum(field: &str, min: f64) -> Self {
        Self::BelowMinimum {
            field: field.to_string(),
            min,
        }
    }

    pub fn above_maximum(field: &str, max: f64) -> Self {
        Self::AboveMaximum {
            field: field.to_string(),
            max,
        }
    }

    pub fn invalid_date(field: &str) -> Self {
        Self::InvalidDate {
            field: field.to_string(),
        }
    }

    pub fn must_accept(field: &str, label: &str) -> Self {
        Self::MustAccept {
            field: field.to_string(),
            label: label.to_string(),
        }
    }

    pub fn custom(message: &str) -> Self {
        Self::Custom {
            message: message.to_string(),
        }
    }

    /// Id of the field the failure belongs to, if it is field-scoped.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Required { field, .. }
            | Self::InvalidEmail { field }
            | Self::InvalidNumber { field }
            | Self::BelowMinimum { field, .. }
            | Self::AboveMaximum { field, .. }
            | Self::InvalidDate { field }
            | Self::MustAccept { field, .. } => Some(field),
            Self::Custom { .. } => None,
        }
    }
}

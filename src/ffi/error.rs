use crate::domains::export::types::ExportError;
use crate::errors::{DomainError, ServiceError, StoreError, ValidationError};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;

/// Error codes for FFI boundary
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Success (no error)
    Success = 0,

    // General errors (1-99)
    Unknown = 1,
    InvalidArgument = 2,
    NullPointer = 3,
    InvalidUtf8 = 4,
    InvalidUuid = 5,
    InternalError = 6,
    NotInitialized = 7,

    // Store errors (100-199)
    StoreGeneral = 100,
    StoreNotFound = 101,
    StoreUnavailable = 102,
    StoreRejected = 103,

    // Domain errors (200-299)
    DomainGeneral = 200,
    EntityNotFound = 201,
    ValidationFailed = 204,
    ExportFailed = 207,

    // Service errors (300-399)
    ServiceGeneral = 300,
    NoCategorySelected = 301,
    FormNotReady = 302,
    UnknownField = 303,
    FormSessionNotFound = 304,
    ServiceUnavailable = 309,
    ConfigurationError = 310,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, *self as i32)
    }
}

/// Error type for FFI boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FFIError {
    /// Error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details (JSON string)
    pub details: Option<String>,
}

impl fmt::Display for FFIError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(details) = &self.details {
            write!(f, "{}: {} ({})", self.code, self.message, details)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for FFIError {}

impl FFIError {
    pub fn new(code: ErrorCode, message: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
            details: None,
        }
    }

    pub fn with_details(code: ErrorCode, message: &str, details: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
            details: Some(details.to_string()),
        }
    }

    pub fn invalid_argument(message: &str) -> Self {
        Self::new(ErrorCode::InvalidArgument, message)
    }

    pub fn internal(message: String) -> Self {
        Self::new(ErrorCode::InternalError, &message)
    }

    pub fn not_initialized(component: &str) -> Self {
        Self::new(
            ErrorCode::NotInitialized,
            &format!("{} not initialized; call insurance_initialize first", component),
        )
    }

    pub fn from_service_error(err: ServiceError) -> Self {
        err.into()
    }
}

fn entity_details(entity: &str, id: &str) -> String {
    serde_json::json!({ "entity": entity, "id": id }).to_string()
}

impl From<StoreError> for FFIError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(entity, id) => Self::with_details(
                ErrorCode::StoreNotFound,
                &format!("Record not found: {} with ID {}", entity, id),
                &entity_details(&entity, &id),
            ),
            StoreError::Unavailable(msg) => Self::new(ErrorCode::StoreUnavailable, &msg),
            StoreError::Rejected(msg) => Self::new(ErrorCode::StoreRejected, &msg),
            StoreError::Other(msg) => Self::new(ErrorCode::StoreGeneral, &msg),
        }
    }
}

impl From<DomainError> for FFIError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Store(store_err) => store_err.into(),
            DomainError::EntityNotFound(entity, id) => Self::with_details(
                ErrorCode::EntityNotFound,
                &format!("Entity not found: {} with ID {}", entity, id),
                &entity_details(&entity, &id),
            ),
            DomainError::Validation(validation_err) => validation_err.into(),
            DomainError::Export(msg) => Self::new(ErrorCode::ExportFailed, &msg),
        }
    }
}

impl From<ServiceError> for FFIError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Domain(domain_err) => domain_err.into(),
            ServiceError::NoCategorySelected => {
                Self::new(ErrorCode::NoCategorySelected, "No insurance type selected")
            }
            ServiceError::NotReady(msg) => Self::new(ErrorCode::FormNotReady, &msg),
            ServiceError::UnknownField(field) => Self::with_details(
                ErrorCode::UnknownField,
                &format!("Unknown form field: {}", field),
                &serde_json::json!({ "field": field }).to_string(),
            ),
            ServiceError::ValueMismatch { field, expected } => Self::with_details(
                ErrorCode::InvalidArgument,
                &format!("Field {} does not accept that value (expected {})", field, expected),
                &serde_json::json!({ "field": field, "expected": expected }).to_string(),
            ),
            ServiceError::Configuration(msg) => Self::new(ErrorCode::ConfigurationError, &msg),
            ServiceError::ServiceUnavailable(msg) => Self::new(ErrorCode::ServiceUnavailable, &msg),
        }
    }
}

impl From<ValidationError> for FFIError {
    fn from(err: ValidationError) -> Self {
        let details = serde_json::to_string(&err).unwrap_or_default();
        Self::with_details(ErrorCode::ValidationFailed, &err.to_string(), &details)
    }
}

impl From<ExportError> for FFIError {
    fn from(err: ExportError) -> Self {
        Self::new(ErrorCode::ExportFailed, &err.to_string())
    }
}

impl From<std::ffi::NulError> for FFIError {
    fn from(_: std::ffi::NulError) -> Self {
        Self::new(ErrorCode::InvalidUtf8, "String contains null bytes, cannot create CString")
    }
}

// Result type alias for FFI functions
pub type FFIResult<T> = Result<T, FFIError>;

thread_local! {
    static LAST_ERROR: RefCell<Option<FFIError>> = const { RefCell::new(None) };
}

/// Remember the error of the latest failed call on this thread.
pub fn set_last_error(err: &FFIError) {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(err.clone()));
}

/// Take the error of the latest failed call on this thread, if any.
pub fn take_last_error() -> Option<FFIError> {
    LAST_ERROR.with(|slot| slot.borrow_mut().take())
}

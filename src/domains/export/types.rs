use crate::errors::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while producing an application document
#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Rendering error: {0}")]
    Rendering(String),

    #[error("Export task failed: {0}")]
    TaskFailed(String),
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::Io(err.to_string())
    }
}

impl From<ExportError> for DomainError {
    fn from(err: ExportError) -> Self {
        DomainError::Export(err.to_string())
    }
}

/// A document written to disk for one application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedDocument {
    pub application_id: String,
    pub file_name: String,
    pub path: PathBuf,
    pub page_count: usize,
    pub bytes_written: u64,
    pub generated_at: DateTime<Utc>,
}

/// One `label: value` row of the details view or document body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailRow {
    pub label: String,
    pub value: String,
}

impl DetailRow {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

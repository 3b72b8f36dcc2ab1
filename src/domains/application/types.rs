use crate::domains::form::types::FormValues;
use crate::errors::{DomainError, DomainResult, ValidationError};
use crate::validation::Validate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Review status of a submitted application
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    /// A status this crate does not know, kept verbatim.
    Other(String),
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ApplicationStatus::Pending => "Pending",
            ApplicationStatus::Approved => "Approved",
            ApplicationStatus::Rejected => "Rejected",
            ApplicationStatus::Other(status) => status,
        }
    }
}

impl From<String> for ApplicationStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Pending" => ApplicationStatus::Pending,
            "Approved" => ApplicationStatus::Approved,
            "Rejected" => ApplicationStatus::Rejected,
            _ => ApplicationStatus::Other(value),
        }
    }
}

impl From<ApplicationStatus> for String {
    fn from(status: ApplicationStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A submitted insurance application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: String,
    /// Display name of the insurance type, e.g. "Health Insurance".
    pub insurance_type: String,
    pub submitted_at: DateTime<Utc>,
    #[serde(default)]
    pub status: ApplicationStatus,
    pub form_data: FormValues,
}

/// Payload handed to the store on submit. The store assigns id and status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewApplication {
    /// Category id as selected in the form, e.g. "health".
    pub insurance_type: String,
    pub form_data: FormValues,
    pub submitted_at: DateTime<Utc>,
}

impl NewApplication {
    pub fn new(insurance_type: &str, form_data: FormValues) -> Self {
        Self {
            insurance_type: insurance_type.to_string(),
            form_data,
            submitted_at: Utc::now(),
        }
    }
}

impl Validate for NewApplication {
    fn validate(&self) -> DomainResult<()> {
        if self.insurance_type.trim().is_empty() {
            return Err(DomainError::Validation(ValidationError::custom(
                "Missing required fields: insuranceType",
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_application_wire_shape() {
        let app: Application = serde_json::from_value(json!({
            "id": "app456",
            "insuranceType": "Car Insurance",
            "submittedAt": "2023-09-10T14:20:00Z",
            "status": "Pending",
            "formData": {"vehicleYear": 2020, "termsAgreed": true}
        }))
        .unwrap();

        assert_eq!(app.status, ApplicationStatus::Pending);
        assert_eq!(app.form_data.len(), 2);

        let back = serde_json::to_value(&app).unwrap();
        assert_eq!(back["insuranceType"], "Car Insurance");
        assert_eq!(back["formData"]["vehicleYear"], 2020);
    }

    #[test]
    fn test_unknown_status_is_kept() {
        let status: ApplicationStatus = serde_json::from_value(json!("Under Review")).unwrap();
        assert_eq!(status, ApplicationStatus::Other("Under Review".to_string()));
        assert_eq!(serde_json::to_value(&status).unwrap(), json!("Under Review"));
    }

    #[test]
    fn test_new_application_requires_type() {
        assert!(NewApplication::new("", FormValues::new()).validate().is_err());
        assert!(NewApplication::new("health", FormValues::new()).validate().is_ok());
    }
}

use crate::errors::{DomainError, DomainResult, ValidationError};
use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use std::sync::OnceLock;

/// A trait that entities should implement for validation.
pub trait Validate {
    /// Validates the entity and returns an error if validation fails.
    fn validate(&self) -> DomainResult<()>;
}

// Common regex patterns
pub(crate) fn email_regex() -> &'static Regex {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("email pattern is a valid regex")
    })
}

/// Values that can be "present but empty", which `required` treats like a missing value.
pub trait Blank {
    fn is_blank(&self) -> bool;
}

impl Blank for String {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl Blank for f64 {
    fn is_blank(&self) -> bool {
        false
    }
}

impl Blank for bool {
    fn is_blank(&self) -> bool {
        false
    }
}

impl Blank for DateTime<Utc> {
    fn is_blank(&self) -> bool {
        false
    }
}

/// Struct for configuring validations in a fluent style
pub struct ValidationBuilder<T> {
    field_name: String,
    value: Option<T>,
    errors: Vec<ValidationError>,
}

/// Generic validation implementations
impl<T> ValidationBuilder<T> {
    pub fn new(field_name: &str, value: Option<T>) -> Self {
        Self {
            field_name: field_name.to_string(),
            value,
            errors: Vec::new(),
        }
    }

    /// Fails with `{label} is required` when the value is missing or blank.
    pub fn required(mut self, label: &str) -> Self
    where
        T: Blank,
    {
        let missing = match &self.value {
            None => true,
            Some(value) => value.is_blank(),
        };
        if missing {
            self.errors.push(ValidationError::required(&self.field_name, label));
        }
        self
    }

    /// First failure recorded, in the order the checks were chained.
    pub fn first_error(self) -> Option<ValidationError> {
        self.errors.into_iter().next()
    }

    /// Complete validation and return result
    pub fn validate(self) -> DomainResult<()> {
        match self.first_error() {
            None => Ok(()),
            Some(err) => Err(DomainError::Validation(err)),
        }
    }
}

/// String-specific validations
impl ValidationBuilder<String> {
    /// Empty strings are skipped so that an optional field may stay blank.
    pub fn matches_pattern(mut self, pattern: &Regex, error: ValidationError) -> Self {
        if let Some(value) = &self.value {
            if !value.is_empty() && !pattern.is_match(value) {
                self.errors.push(error);
            }
        }
        self
    }

    pub fn email(self) -> Self {
        let error = ValidationError::invalid_email(&self.field_name);
        self.matches_pattern(email_regex(), error)
    }
}

/// Numeric validations
impl ValidationBuilder<f64> {
    pub fn min(mut self, min: f64) -> Self {
        if let Some(value) = self.value {
            if value < min {
                self.errors.push(ValidationError::below_minimum(&self.field_name, min));
            }
        }
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        if let Some(value) = self.value {
            if value > max {
                self.errors.push(ValidationError::above_maximum(&self.field_name, max));
            }
        }
        self
    }
}

/// Boolean validations
impl ValidationBuilder<bool> {
    /// Fails with `You must accept the {label}` unless the value is exactly `true`.
    pub fn accepted(mut self, label: &str) -> Self {
        if self.value != Some(true) {
            self.errors.push(ValidationError::must_accept(&self.field_name, label));
        }
        self
    }
}

/// Parse the date shapes a date control or a JSON payload can carry: RFC 3339 timestamps
/// and plain `YYYY-MM-DD` dates (taken as midnight UTC).
pub fn parse_date_input(input: &str) -> Option<DateTime<Utc>> {
    let trimmed = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

//! Compiles a form's field declarations into the checks run before submission.

use crate::domains::form::types::{FieldCondition, FieldKind, FieldSchema, FieldValue, FormValues};
use crate::domains::form::visibility;
use crate::errors::ValidationError;
use crate::validation::{parse_date_input, ValidationBuilder};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// The check applied to one field, chosen by its kind.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleKind {
    Text,
    Email,
    Number { min: Option<f64>, max: Option<f64> },
    Date,
    Accept,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    pub field_id: String,
    pub label: String,
    pub required: bool,
    pub kind: RuleKind,
    condition: Option<FieldCondition>,
}

impl FieldRule {
    fn from_field(field: &FieldSchema) -> Self {
        let kind = match &field.kind {
            FieldKind::Text
            | FieldKind::Textarea
            | FieldKind::Select { .. }
            | FieldKind::Radio { .. }
            | FieldKind::Other { .. } => RuleKind::Text,
            FieldKind::Email => RuleKind::Email,
            FieldKind::Number { min, max } => RuleKind::Number {
                min: *min,
                max: *max,
            },
            FieldKind::Date => RuleKind::Date,
            FieldKind::Checkbox => RuleKind::Accept,
        };

        Self {
            field_id: field.id.clone(),
            label: field.label.clone(),
            required: field.required,
            kind,
            condition: field.condition.clone(),
        }
    }

    /// First failure for this field's current value, if any.
    pub fn check(&self, value: Option<&FieldValue>) -> Option<ValidationError> {
        match &self.kind {
            RuleKind::Text => self.check_text(value, false),
            RuleKind::Email => self.check_text(value, true),
            RuleKind::Number { min, max } => self.check_number(value, *min, *max),
            RuleKind::Date => self.check_date(value),
            RuleKind::Accept => self.check_accept(value),
        }
    }

    fn check_text(&self, value: Option<&FieldValue>, email: bool) -> Option<ValidationError> {
        let text = match value {
            None | Some(FieldValue::Absent) => None,
            Some(FieldValue::Text(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        };

        let mut builder = ValidationBuilder::new(&self.field_id, text);
        if self.required {
            builder = builder.required(&self.label);
        }
        if email {
            builder = builder.email();
        }
        builder.first_error()
    }

    fn check_number(
        &self,
        value: Option<&FieldValue>,
        min: Option<f64>,
        max: Option<f64>,
    ) -> Option<ValidationError> {
        let coerced: Result<Option<f64>, ()> = match value {
            None | Some(FieldValue::Absent) => Ok(None),
            Some(FieldValue::Number(n)) if n.is_finite() => Ok(Some(*n)),
            Some(FieldValue::Text(s)) if s.trim().is_empty() => Ok(None),
            Some(FieldValue::Text(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(Some)
                .ok_or(()),
            Some(_) => Err(()),
        };

        let mut builder = match coerced {
            Ok(number) => ValidationBuilder::new(&self.field_id, number),
            Err(()) => {
                // unparsable input is present, so "required" cannot be what failed
                return Some(ValidationError::invalid_number(&self.field_id));
            }
        };
        if self.required {
            builder = builder.required(&self.label);
        }
        if let Some(min) = min {
            builder = builder.min(min);
        }
        if let Some(max) = max {
            builder = builder.max(max);
        }
        builder.first_error()
    }

    fn check_date(&self, value: Option<&FieldValue>) -> Option<ValidationError> {
        let coerced: Result<Option<DateTime<Utc>>, ()> = match value {
            None | Some(FieldValue::Absent) => Ok(None),
            Some(FieldValue::Date(dt)) => Ok(Some(*dt)),
            Some(FieldValue::Text(s)) if s.trim().is_empty() => Ok(None),
            Some(FieldValue::Text(s)) => parse_date_input(s).map(Some).ok_or(()),
            Some(_) => Err(()),
        };

        match coerced {
            Err(()) => Some(ValidationError::invalid_date(&self.field_id)),
            Ok(date) => {
                let mut builder = ValidationBuilder::new(&self.field_id, date);
                if self.required {
                    builder = builder.required(&self.label);
                }
                builder.first_error()
            }
        }
    }

    fn check_accept(&self, value: Option<&FieldValue>) -> Option<ValidationError> {
        if !self.required {
            return None;
        }
        let checked = match value {
            Some(FieldValue::Bool(b)) => Some(*b),
            _ => None,
        };
        ValidationBuilder::new(&self.field_id, checked)
            .accepted(&self.label)
            .first_error()
    }
}

/// One field's failure, as shown inline under the field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldFailure {
    pub field: String,
    pub message: String,
    pub reason: ValidationError,
}

impl From<ValidationError> for FieldFailure {
    fn from(reason: ValidationError) -> Self {
        Self {
            field: reason.field().unwrap_or_default().to_string(),
            message: reason.to_string(),
            reason,
        }
    }
}

/// Outcome of validating a [`FormValues`] against a [`ValidationRuleset`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub failures: Vec<FieldFailure>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failure_for(&self, field_id: &str) -> Option<&FieldFailure> {
        self.failures.iter().find(|failure| failure.field == field_id)
    }

    pub fn message_for(&self, field_id: &str) -> Option<&str> {
        self.failure_for(field_id).map(|failure| failure.message.as_str())
    }
}

/// Per-field checks compiled from a form's declarations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationRuleset {
    rules: Vec<FieldRule>,
}

impl ValidationRuleset {
    /// Build the ruleset for a list of fields. Never fails: unknown kinds get a text rule.
    pub fn build(fields: &[FieldSchema]) -> Self {
        Self {
            rules: fields.iter().map(FieldRule::from_field).collect(),
        }
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    pub fn rule(&self, field_id: &str) -> Option<&FieldRule> {
        self.rules.iter().find(|rule| rule.field_id == field_id)
    }

    /// Validate every field that is currently visible. Hidden conditional fields are
    /// skipped, so a required follow-up question only binds once it is shown.
    pub fn validate(&self, values: &FormValues) -> ValidationReport {
        let failures = self
            .rules
            .iter()
            .filter(|rule| visibility::condition_met(rule.condition.as_ref(), values))
            .filter_map(|rule| rule.check(values.get(&rule.field_id)))
            .map(FieldFailure::from)
            .collect();

        ValidationReport { failures }
    }

    /// Validate a single field, as done on every change for inline feedback.
    pub fn validate_field(&self, field_id: &str, values: &FormValues) -> Option<FieldFailure> {
        let rule = self.rule(field_id)?;
        if !visibility::condition_met(rule.condition.as_ref(), values) {
            return None;
        }
        rule.check(values.get(field_id)).map(FieldFailure::from)
    }
}

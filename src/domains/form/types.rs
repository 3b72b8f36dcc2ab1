use crate::validation::parse_date_input;
use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// One `{label, value}` choice of a select or radio field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    pub label: String,
    pub value: String,
}

impl FieldOption {
    pub fn new(label: &str, value: &str) -> Self {
        Self {
            label: label.to_string(),
            value: value.to_string(),
        }
    }
}

/// Show a field only while another field holds a given value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldCondition {
    pub depends_on: String,
    pub value: String,
}

/// What kind of input a field is, with the attributes only that kind uses.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text,
    Email,
    Number { min: Option<f64>, max: Option<f64> },
    Textarea,
    Select { options: Vec<FieldOption> },
    Radio { options: Vec<FieldOption> },
    Checkbox,
    Date,
    /// A `type` this engine does not know; handled like plain text.
    Other { type_name: String },
}

impl FieldKind {
    pub fn type_name(&self) -> &str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Email => "email",
            FieldKind::Number { .. } => "number",
            FieldKind::Textarea => "textarea",
            FieldKind::Select { .. } => "select",
            FieldKind::Radio { .. } => "radio",
            FieldKind::Checkbox => "checkbox",
            FieldKind::Date => "date",
            FieldKind::Other { type_name } => type_name,
        }
    }

    pub fn options(&self) -> &[FieldOption] {
        match self {
            FieldKind::Select { options } | FieldKind::Radio { options } => options,
            _ => &[],
        }
    }

    /// Value a freshly loaded form starts with for this kind of field.
    pub fn default_value(&self) -> FieldValue {
        match self {
            FieldKind::Number { .. } | FieldKind::Date => FieldValue::Absent,
            FieldKind::Checkbox => FieldValue::Bool(false),
            _ => FieldValue::Text(String::new()),
        }
    }

    /// Bring a value into the shape this kind stores, or `None` when the shape cannot
    /// belong to this kind (a boolean for a text field, say). Number and date text that
    /// does not parse is kept as typed so validation can report it.
    pub fn coerce(&self, value: FieldValue) -> Option<FieldValue> {
        match (self, value) {
            (_, FieldValue::Absent) => Some(FieldValue::Absent),
            (FieldKind::Number { .. }, FieldValue::Number(n)) => Some(FieldValue::Number(n)),
            (FieldKind::Number { .. }, FieldValue::Text(text)) => {
                let parsed = text.trim().parse::<f64>().ok().filter(|n| n.is_finite());
                Some(match parsed {
                    Some(n) => FieldValue::Number(n),
                    None if text.trim().is_empty() => FieldValue::Absent,
                    None => FieldValue::Text(text),
                })
            }
            (FieldKind::Date, FieldValue::Date(dt)) => Some(FieldValue::Date(dt)),
            (FieldKind::Date, FieldValue::Text(text)) => Some(match parse_date_input(&text) {
                Some(dt) => FieldValue::Date(dt),
                None if text.trim().is_empty() => FieldValue::Absent,
                None => FieldValue::Text(text),
            }),
            (FieldKind::Checkbox, FieldValue::Bool(b)) => Some(FieldValue::Bool(b)),
            (FieldKind::Number { .. } | FieldKind::Date | FieldKind::Checkbox, _) => None,
            (_, FieldValue::Text(text)) => Some(FieldValue::Text(text)),
            _ => None,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Declaration of one form field.
///
/// On the wire this is the flat `{id, type, label, placeholder, required, options, min,
/// max, condition}` record; in memory the type-specific attributes live on [`FieldKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawFieldSchema", into = "RawFieldSchema")]
pub struct FieldSchema {
    pub id: String,
    pub label: String,
    pub placeholder: Option<String>,
    pub required: bool,
    pub condition: Option<FieldCondition>,
    pub kind: FieldKind,
}

impl FieldSchema {
    pub fn new(id: &str, label: &str, kind: FieldKind) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            placeholder: None,
            required: false,
            condition: None,
            kind,
        }
    }

    pub fn with_placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = Some(placeholder.to_string());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn shown_when(mut self, depends_on: &str, value: &str) -> Self {
        self.condition = Some(FieldCondition {
            depends_on: depends_on.to_string(),
            value: value.to_string(),
        });
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawFieldSchema {
    id: String,
    #[serde(rename = "type")]
    field_type: String,
    label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    options: Option<Vec<FieldOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    condition: Option<FieldCondition>,
}

impl From<RawFieldSchema> for FieldSchema {
    fn from(raw: RawFieldSchema) -> Self {
        let options = raw.options.unwrap_or_default();
        let kind = match raw.field_type.as_str() {
            "text" => FieldKind::Text,
            "email" => FieldKind::Email,
            "number" => FieldKind::Number {
                min: raw.min,
                max: raw.max,
            },
            "textarea" => FieldKind::Textarea,
            "select" => FieldKind::Select { options },
            "radio" => FieldKind::Radio { options },
            "checkbox" => FieldKind::Checkbox,
            "date" => FieldKind::Date,
            other => {
                log::warn!("Field '{}' has unknown type '{}', treating it as text", raw.id, other);
                FieldKind::Other {
                    type_name: other.to_string(),
                }
            }
        };

        FieldSchema {
            id: raw.id,
            label: raw.label,
            placeholder: raw.placeholder,
            required: raw.required.unwrap_or(false),
            condition: raw.condition,
            kind,
        }
    }
}

impl From<FieldSchema> for RawFieldSchema {
    fn from(field: FieldSchema) -> Self {
        let field_type = field.kind.type_name().to_string();
        let (options, min, max) = match field.kind {
            FieldKind::Select { options } | FieldKind::Radio { options } => (Some(options), None, None),
            FieldKind::Number { min, max } => (None, min, max),
            _ => (None, None, None),
        };

        RawFieldSchema {
            id: field.id,
            field_type,
            label: field.label,
            placeholder: field.placeholder,
            required: field.required.then_some(true),
            options,
            min,
            max,
            condition: field.condition,
        }
    }
}

/// Ordered field declarations for one insurance category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormSchema {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

impl FormSchema {
    pub fn new(title: &str, fields: Vec<FieldSchema>) -> Self {
        Self {
            title: title.to_string(),
            fields,
        }
    }

    pub fn field(&self, id: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|field| field.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Values a freshly loaded form starts with, in declaration order.
    pub fn default_values(&self) -> FormValues {
        let mut values = FormValues::new();
        for field in &self.fields {
            values.set(&field.id, field.kind.default_value());
        }
        values
    }
}

/// A single answer in a [`FormValues`] map.
///
/// JSON: `null`, string, number, bool. A `Date` serializes as its canonical timestamp
/// string; incoming dates arrive as `Text` and are parsed when validated.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    #[default]
    Absent,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(DateTime<Utc>),
}

impl FieldValue {
    pub fn text(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Absent)
    }

    /// Canonical timestamp form used when a value leaves the form (`toISOString` shape).
    pub fn canonical_timestamp(dt: &DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Dates become timestamp strings; everything else is unchanged.
    pub fn normalized(&self) -> FieldValue {
        match self {
            FieldValue::Date(dt) => FieldValue::Text(Self::canonical_timestamp(dt)),
            other => other.clone(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Absent => Ok(()),
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Number(n) => write!(f, "{}", crate::errors::fmt_bound(*n)),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Date(dt) => write!(f, "{}", Self::canonical_timestamp(dt)),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Date(value)
    }
}

impl Serialize for FieldValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            FieldValue::Absent => serializer.serialize_none(),
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 9.0e15 {
                    serializer.serialize_i64(*n as i64)
                } else {
                    serializer.serialize_f64(*n)
                }
            }
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
            FieldValue::Date(dt) => serializer.serialize_str(&Self::canonical_timestamp(dt)),
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct FieldValueVisitor;

        impl<'de> Visitor<'de> for FieldValueVisitor {
            type Value = FieldValue;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("null, a string, a number or a boolean")
            }

            fn visit_unit<E: de::Error>(self) -> Result<FieldValue, E> {
                Ok(FieldValue::Absent)
            }

            fn visit_none<E: de::Error>(self) -> Result<FieldValue, E> {
                Ok(FieldValue::Absent)
            }

            fn visit_some<D2>(self, deserializer: D2) -> Result<FieldValue, D2::Error>
            where
                D2: Deserializer<'de>,
            {
                FieldValue::deserialize(deserializer)
            }

            fn visit_bool<E: de::Error>(self, value: bool) -> Result<FieldValue, E> {
                Ok(FieldValue::Bool(value))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<FieldValue, E> {
                Ok(FieldValue::Number(value as f64))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<FieldValue, E> {
                Ok(FieldValue::Number(value as f64))
            }

            fn visit_f64<E: de::Error>(self, value: f64) -> Result<FieldValue, E> {
                Ok(FieldValue::Number(value))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<FieldValue, E> {
                Ok(FieldValue::Text(value.to_string()))
            }

            fn visit_string<E: de::Error>(self, value: String) -> Result<FieldValue, E> {
                Ok(FieldValue::Text(value))
            }
        }

        deserializer.deserialize_any(FieldValueVisitor)
    }
}

/// Current answers keyed by field id, kept in insertion (declaration) order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormValues {
    entries: IndexMap<String, FieldValue>,
}

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field_id: &str) -> Option<&FieldValue> {
        self.entries.get(field_id)
    }

    /// Replace the value in place, or append it when the key is new.
    pub fn set(&mut self, field_id: &str, value: FieldValue) {
        self.entries.insert(field_id.to_string(), value);
    }

    pub fn with(mut self, field_id: &str, value: impl Into<FieldValue>) -> Self {
        self.set(field_id, value.into());
        self
    }

    pub fn contains(&self, field_id: &str) -> bool {
        self.entries.contains_key(field_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(id, value)| (id.as_str(), value))
    }

    /// Copy suitable for submission: dates become timestamp strings.
    pub fn normalized(&self) -> FormValues {
        FormValues {
            entries: self
                .entries
                .iter()
                .map(|(id, value)| (id.clone(), value.normalized()))
                .collect(),
        }
    }
}

/// An insurance category a form can be loaded for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsuranceCategory {
    pub id: String,
    /// Display name, e.g. "Health Insurance".
    pub name: String,
}

impl InsuranceCategory {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_field_schema_from_wire_shape() {
        let field: FieldSchema = serde_json::from_value(json!({
            "id": "coverageType",
            "type": "select",
            "label": "Coverage Type",
            "required": true,
            "options": [{"label": "Basic", "value": "basic"}]
        }))
        .unwrap();

        assert!(field.required);
        assert_eq!(field.kind.options(), &[FieldOption::new("Basic", "basic")]);
    }

    #[test]
    fn test_malformed_fields_degrade() {
        // select without options, and an unknown type
        let fields: Vec<FieldSchema> = serde_json::from_value(json!([
            {"id": "a", "type": "select", "label": "A"},
            {"id": "b", "type": "color", "label": "B"}
        ]))
        .unwrap();

        assert_eq!(fields[0].kind, FieldKind::Select { options: vec![] });
        assert_eq!(fields[1].kind, FieldKind::Other { type_name: "color".to_string() });
        assert_eq!(fields[1].kind.default_value(), FieldValue::Text(String::new()));
    }

    #[test]
    fn test_field_schema_serializes_flat() {
        let field = FieldSchema::new("tripDuration", "Trip Duration (days)", FieldKind::Number {
            min: Some(1.0),
            max: Some(365.0),
        })
        .required()
        .shown_when("travel", "yes");

        let value = serde_json::to_value(&field).unwrap();
        assert_eq!(value["type"], "number");
        assert_eq!(value["min"], 1.0);
        assert_eq!(value["condition"]["dependsOn"], "travel");
        assert!(value.get("options").is_none());
        assert!(value.get("placeholder").is_none());
    }

    #[test]
    fn test_default_values_follow_declaration_order() {
        let schema = FormSchema::new("T", vec![
            FieldSchema::new("name", "Name", FieldKind::Text),
            FieldSchema::new("age", "Age", FieldKind::Number { min: None, max: None }),
            FieldSchema::new("born", "Born", FieldKind::Date),
            FieldSchema::new("terms", "Terms", FieldKind::Checkbox),
        ]);

        let values = schema.default_values();
        let ids: Vec<&str> = values.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["name", "age", "born", "terms"]);
        assert_eq!(values.get("name"), Some(&FieldValue::Text(String::new())));
        assert_eq!(values.get("age"), Some(&FieldValue::Absent));
        assert_eq!(values.get("born"), Some(&FieldValue::Absent));
        assert_eq!(values.get("terms"), Some(&FieldValue::Bool(false)));
    }

    #[test]
    fn test_form_values_json() {
        let born = Utc.with_ymd_and_hms(1985, 1, 15, 0, 0, 0).unwrap();
        let values = FormValues::new()
            .with("fullName", "John Doe")
            .with("vehicleYear", 2020.0)
            .with("termsAgreed", true)
            .with("dateOfBirth", born)
            .with("notes", FieldValue::Absent);

        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(
            json,
            r#"{"fullName":"John Doe","vehicleYear":2020,"termsAgreed":true,"dateOfBirth":"1985-01-15T00:00:00.000Z","notes":null}"#
        );

        let back: FormValues = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get("vehicleYear"), Some(&FieldValue::Number(2020.0)));
        assert_eq!(back.get("dateOfBirth"), Some(&FieldValue::text("1985-01-15T00:00:00.000Z")));
        assert_eq!(back.get("notes"), Some(&FieldValue::Absent));
    }

    #[test]
    fn test_coerce_by_kind() {
        let date = FieldKind::Date;
        let born = Utc.with_ymd_and_hms(1985, 1, 15, 0, 0, 0).unwrap();
        assert_eq!(date.coerce(FieldValue::text("1985-01-15")), Some(FieldValue::Date(born)));
        assert_eq!(date.coerce(FieldValue::text("")), Some(FieldValue::Absent));
        assert_eq!(date.coerce(FieldValue::text("soon")), Some(FieldValue::text("soon")));
        assert_eq!(date.coerce(FieldValue::Bool(true)), None);

        let number = FieldKind::Number { min: None, max: None };
        assert_eq!(number.coerce(FieldValue::text(" 42 ")), Some(FieldValue::Number(42.0)));
        assert_eq!(number.coerce(FieldValue::text("")), Some(FieldValue::Absent));
        assert_eq!(number.coerce(FieldValue::text("abc")), Some(FieldValue::text("abc")));

        assert_eq!(FieldKind::Checkbox.coerce(FieldValue::text("true")), None);
        assert_eq!(FieldKind::Text.coerce(FieldValue::Bool(true)), None);
        assert_eq!(FieldKind::Email.coerce(FieldValue::Number(1.0)), None);
        assert_eq!(FieldKind::Textarea.coerce(FieldValue::Absent), Some(FieldValue::Absent));
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut values = FormValues::new().with("a", "1").with("b", "2");
        values.set("a", FieldValue::text("3"));
        let ids: Vec<&str> = values.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(values.get("a"), Some(&FieldValue::text("3")));
    }
}

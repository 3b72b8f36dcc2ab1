//! Maps a field declaration and its current value to a concrete input control.

use crate::domains::form::types::{FieldKind, FieldOption, FieldSchema, FieldValue};
use crate::validation::parse_date_input;
use chrono::{DateTime, Utc};
use serde::Serialize;

const DEFAULT_SELECT_PLACEHOLDER: &str = "Select an option";
const DEFAULT_DATE_PLACEHOLDER: &str = "Select date";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Text,
    Email,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RadioItem {
    /// Element id linking the button to its caption, `{field}-{value}`.
    pub id: String,
    pub label: String,
    pub value: String,
}

/// Description of the control a field renders as
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "control", rename_all = "camelCase")]
pub enum Control {
    #[serde(rename_all = "camelCase")]
    TextInput {
        input_type: InputType,
        value: String,
        placeholder: String,
    },
    #[serde(rename_all = "camelCase")]
    NumberInput {
        /// Text shown in the input; empty while the value is absent.
        value: String,
        placeholder: String,
        min: Option<f64>,
        max: Option<f64>,
    },
    #[serde(rename_all = "camelCase")]
    TextArea { value: String, placeholder: String },
    #[serde(rename_all = "camelCase")]
    Dropdown {
        options: Vec<FieldOption>,
        selected: Option<String>,
        /// Shown while nothing is selected.
        placeholder: String,
    },
    #[serde(rename_all = "camelCase")]
    RadioGroup {
        items: Vec<RadioItem>,
        selected: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Toggle {
        id: String,
        checked: bool,
        /// Caption next to the box, taken from the field's placeholder.
        caption: String,
    },
    /// Owns its label, required marker and disabled state.
    #[serde(rename_all = "camelCase")]
    DatePicker {
        label: String,
        value: Option<DateTime<Utc>>,
        placeholder: String,
        required: bool,
        disabled: bool,
    },
}

/// What a user did to a control
#[derive(Debug, Clone, PartialEq)]
pub enum ControlInput {
    /// Typed into a text-like input (also a number input's raw text).
    Typed(String),
    /// Picked an option of a dropdown or radio group.
    Chose(String),
    Toggled(bool),
    PickedDate(Option<DateTime<Utc>>),
}

impl Control {
    /// Value handed to the change handler for an interaction, or `None` when the
    /// interaction does not apply to this control.
    pub fn value_for(&self, input: ControlInput) -> Option<FieldValue> {
        match (self, input) {
            (Control::TextInput { .. } | Control::TextArea { .. }, ControlInput::Typed(text)) => {
                Some(FieldValue::Text(text))
            }
            (Control::NumberInput { .. }, ControlInput::Typed(text)) => Some(normalize_number_input(&text)),
            (Control::Dropdown { .. } | Control::RadioGroup { .. }, ControlInput::Chose(value)) => {
                Some(FieldValue::Text(value))
            }
            (Control::Toggle { .. }, ControlInput::Toggled(checked)) => Some(FieldValue::Bool(checked)),
            (Control::DatePicker { disabled: false, .. }, ControlInput::PickedDate(date)) => {
                Some(date.map(FieldValue::Date).unwrap_or(FieldValue::Absent))
            }
            (Control::DatePicker { disabled: false, .. }, ControlInput::Typed(text)) => {
                Some(match parse_date_input(&text) {
                    Some(date) => FieldValue::Date(date),
                    None if text.trim().is_empty() => FieldValue::Absent,
                    None => FieldValue::Text(text),
                })
            }
            _ => None,
        }
    }
}

/// Empty input means "no number", not zero. Text that is not a number is kept as typed
/// so validation can report it.
pub fn normalize_number_input(text: &str) -> FieldValue {
    if text.is_empty() {
        return FieldValue::Absent;
    }
    match text.trim().parse::<f64>() {
        Ok(number) if number.is_finite() => FieldValue::Number(number),
        _ => FieldValue::Text(text.to_string()),
    }
}

/// Label drawn above the generic controls
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldLabel {
    pub text: String,
    pub required: bool,
}

impl FieldLabel {
    /// `Full Name *` for required fields.
    pub fn display(&self) -> String {
        if self.required {
            format!("{} *", self.text)
        } else {
            self.text.clone()
        }
    }
}

/// Serializable description of one rendered field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldView {
    pub field_id: String,
    /// `None` for date fields, whose control draws its own label.
    pub label: Option<FieldLabel>,
    pub control: Control,
}

/// A rendered field wired to its change handler
pub struct RenderedField<'a> {
    pub view: FieldView,
    on_change: Box<dyn FnMut(FieldValue) + 'a>,
}

impl<'a> RenderedField<'a> {
    pub fn field_id(&self) -> &str {
        &self.view.field_id
    }

    pub fn control(&self) -> &Control {
        &self.view.control
    }

    /// Feed a user interaction to the control. The change handler runs before this
    /// returns; returns whether it ran.
    pub fn interact(&mut self, input: ControlInput) -> bool {
        match self.view.control.value_for(input) {
            Some(value) => {
                (self.on_change)(value);
                true
            }
            None => false,
        }
    }
}

fn text_of(value: Option<&FieldValue>) -> String {
    match value {
        None | Some(FieldValue::Absent) => String::new(),
        Some(other) => other.to_string(),
    }
}

fn selection_of(value: Option<&FieldValue>) -> Option<String> {
    match value {
        Some(FieldValue::Text(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Describe the control for a field without wiring a handler.
pub fn render_view(field: &FieldSchema, value: Option<&FieldValue>) -> FieldView {
    let placeholder = field.placeholder.clone().unwrap_or_default();

    let control = match &field.kind {
        FieldKind::Text => Control::TextInput {
            input_type: InputType::Text,
            value: text_of(value),
            placeholder,
        },
        FieldKind::Email => Control::TextInput {
            input_type: InputType::Email,
            value: text_of(value),
            placeholder,
        },
        FieldKind::Number { min, max } => Control::NumberInput {
            value: text_of(value),
            placeholder,
            min: *min,
            max: *max,
        },
        FieldKind::Textarea => Control::TextArea {
            value: text_of(value),
            placeholder,
        },
        FieldKind::Select { options } => Control::Dropdown {
            options: options.clone(),
            selected: selection_of(value),
            placeholder: field
                .placeholder
                .clone()
                .unwrap_or_else(|| DEFAULT_SELECT_PLACEHOLDER.to_string()),
        },
        FieldKind::Radio { options } => Control::RadioGroup {
            items: options
                .iter()
                .map(|option| RadioItem {
                    id: format!("{}-{}", field.id, option.value),
                    label: option.label.clone(),
                    value: option.value.clone(),
                })
                .collect(),
            selected: selection_of(value),
        },
        FieldKind::Checkbox => Control::Toggle {
            id: field.id.clone(),
            checked: matches!(value, Some(FieldValue::Bool(true))),
            caption: placeholder,
        },
        FieldKind::Date => Control::DatePicker {
            label: field.label.clone(),
            value: match value {
                Some(FieldValue::Date(date)) => Some(*date),
                Some(FieldValue::Text(text)) => parse_date_input(text),
                _ => None,
            },
            placeholder: field
                .placeholder
                .clone()
                .unwrap_or_else(|| DEFAULT_DATE_PLACEHOLDER.to_string()),
            required: field.required,
            disabled: false,
        },
        FieldKind::Other { .. } => Control::TextInput {
            input_type: InputType::Text,
            value: text_of(value),
            placeholder: String::new(),
        },
    };

    let label = match field.kind {
        FieldKind::Date => None,
        _ => Some(FieldLabel {
            text: field.label.clone(),
            required: field.required,
        }),
    };

    FieldView {
        field_id: field.id.clone(),
        label,
        control,
    }
}

/// Render a field with its current value; `on_change` receives every new value.
pub fn render<'a>(
    field: &FieldSchema,
    value: Option<&FieldValue>,
    on_change: impl FnMut(FieldValue) + 'a,
) -> RenderedField<'a> {
    RenderedField {
        view: render_view(field, value),
        on_change: Box::new(on_change),
    }
}

use crate::domains::form::types::{FieldCondition, FieldSchema, FieldValue, FormSchema, FormValues};

/// True when the field has no condition, or its dependency currently holds exactly the
/// expected string. Only text values can match; `"5"` does not match the number `5`.
pub fn condition_met(condition: Option<&FieldCondition>, values: &FormValues) -> bool {
    match condition {
        None => true,
        Some(condition) => match values.get(&condition.depends_on) {
            Some(FieldValue::Text(current)) => *current == condition.value,
            _ => false,
        },
    }
}

pub fn is_visible(field: &FieldSchema, values: &FormValues) -> bool {
    condition_met(field.condition.as_ref(), values)
}

/// Fields to show for the current values, in declaration order.
///
/// Conditions are evaluated one hop deep against the raw values: a field whose
/// dependency is itself hidden is still shown if the dependency's stored value matches.
pub fn active_fields<'a>(schema: &'a FormSchema, values: &FormValues) -> Vec<&'a FieldSchema> {
    schema
        .fields
        .iter()
        .filter(|field| is_visible(field, values))
        .collect()
}

pub mod catalog;
pub mod controller;
pub mod render;
pub mod rules;
pub mod types;
pub mod visibility;

pub use catalog::{FormCatalog, StaticFormCatalog};
pub use controller::{FormController, FormState, FormView, SubmitOutcome};
pub use rules::{ValidationReport, ValidationRuleset};
pub use types::{FieldKind, FieldSchema, FieldValue, FormSchema, FormValues, InsuranceCategory};

use crate::domains::form::types::{FieldKind, FieldOption, FieldSchema, FormSchema, InsuranceCategory};
use crate::errors::StoreResult;
use async_trait::async_trait;
use chrono::{Datelike, Utc};
use std::time::Duration;

/// Source of insurance categories and the form schema for each one
#[async_trait]
pub trait FormCatalog: Send + Sync {
    async fn fetch_categories(&self) -> StoreResult<Vec<InsuranceCategory>>;

    /// Unknown categories yield an empty schema rather than an error.
    async fn fetch_form_schema(&self, category_id: &str) -> StoreResult<FormSchema>;

    /// Display name for a category id, if the id is known.
    async fn category_name(&self, category_id: &str) -> StoreResult<Option<String>> {
        let categories = self.fetch_categories().await?;
        Ok(categories
            .into_iter()
            .find(|category| category.id == category_id)
            .map(|category| category.name))
    }
}

/// Catalog of the built-in insurance forms
pub struct StaticFormCatalog {
    latency: Duration,
}

impl StaticFormCatalog {
    pub fn new() -> Self {
        Self {
            latency: Duration::ZERO,
        }
    }

    /// Delay every call, to exercise loading states against a realistic backend.
    pub fn with_latency(latency: Duration) -> Self {
        Self { latency }
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

impl Default for StaticFormCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FormCatalog for StaticFormCatalog {
    async fn fetch_categories(&self) -> StoreResult<Vec<InsuranceCategory>> {
        self.simulate_latency().await;
        Ok(builtin_categories())
    }

    async fn fetch_form_schema(&self, category_id: &str) -> StoreResult<FormSchema> {
        self.simulate_latency().await;
        let schema = builtin_schema(category_id).unwrap_or_else(|| {
            log::warn!("No form defined for insurance type '{}'", category_id);
            FormSchema::default()
        });
        log::debug!("Loaded form '{}' with {} fields", schema.title, schema.fields.len());
        Ok(schema)
    }
}

pub fn builtin_categories() -> Vec<InsuranceCategory> {
    vec![
        InsuranceCategory::new("health", "Health Insurance"),
        InsuranceCategory::new("home", "Home Insurance"),
        InsuranceCategory::new("car", "Car Insurance"),
        InsuranceCategory::new("life", "Life Insurance"),
        InsuranceCategory::new("travel", "Travel Insurance"),
    ]
}

pub fn builtin_schema(category_id: &str) -> Option<FormSchema> {
    match category_id {
        "health" => Some(health_schema()),
        "home" => Some(home_schema()),
        "car" => Some(car_schema()),
        "life" => Some(life_schema()),
        "travel" => Some(travel_schema()),
        _ => None,
    }
}

fn yes_no() -> Vec<FieldOption> {
    vec![FieldOption::new("Yes", "yes"), FieldOption::new("No", "no")]
}

fn full_name() -> FieldSchema {
    FieldSchema::new("fullName", "Full Name", FieldKind::Text)
        .with_placeholder("Enter your full name")
        .required()
}

fn email() -> FieldSchema {
    FieldSchema::new("email", "Email Address", FieldKind::Email)
        .with_placeholder("Enter your email")
        .required()
}

fn terms_agreed() -> FieldSchema {
    FieldSchema::new("termsAgreed", "Terms and Conditions", FieldKind::Checkbox)
        .with_placeholder("I agree to the terms and conditions")
        .required()
}

fn number(min: Option<f64>, max: Option<f64>) -> FieldKind {
    FieldKind::Number { min, max }
}

fn current_year() -> f64 {
    f64::from(Utc::now().year())
}

pub fn health_schema() -> FormSchema {
    FormSchema::new("Health Insurance Application", vec![
        full_name(),
        email(),
        FieldSchema::new("dateOfBirth", "Date of Birth", FieldKind::Date).required(),
        FieldSchema::new(
            "hasMedicalConditions",
            "Do you have any pre-existing medical conditions?",
            FieldKind::Radio { options: yes_no() },
        )
        .required(),
        FieldSchema::new("medicalConditionsDetails", "Please describe your medical conditions", FieldKind::Textarea)
            .with_placeholder("Enter details here")
            .required()
            .shown_when("hasMedicalConditions", "yes"),
        FieldSchema::new("coverageType", "Coverage Type", FieldKind::Select {
            options: vec![
                FieldOption::new("Basic", "basic"),
                FieldOption::new("Standard", "standard"),
                FieldOption::new("Premium", "premium"),
            ],
        })
        .required(),
        terms_agreed(),
    ])
}

pub fn home_schema() -> FormSchema {
    FormSchema::new("Home Insurance Application", vec![
        full_name(),
        email(),
        FieldSchema::new("address", "Property Address", FieldKind::Text)
            .with_placeholder("Enter property address")
            .required(),
        FieldSchema::new("propertyType", "Property Type", FieldKind::Select {
            options: vec![
                FieldOption::new("House", "house"),
                FieldOption::new("Apartment", "apartment"),
                FieldOption::new("Condo", "condo"),
                FieldOption::new("Townhouse", "townhouse"),
            ],
        })
        .required(),
        FieldSchema::new("yearBuilt", "Year Built", number(Some(1900.0), Some(current_year())))
            .with_placeholder("Enter year built")
            .required(),
        FieldSchema::new("purchaseDate", "Purchase Date", FieldKind::Date).required(),
        FieldSchema::new("hasSecuritySystem", "Do you have a security system?", FieldKind::Radio {
            options: yes_no(),
        })
        .required(),
        FieldSchema::new("securitySystemDetails", "Security System Details", FieldKind::Textarea)
            .with_placeholder("Describe your security system")
            .shown_when("hasSecuritySystem", "yes"),
        FieldSchema::new("coverageAmount", "Coverage Amount ($)", number(Some(50000.0), None))
            .with_placeholder("Enter coverage amount")
            .required(),
        terms_agreed(),
    ])
}

pub fn car_schema() -> FormSchema {
    FormSchema::new("Car Insurance Application", vec![
        full_name(),
        email(),
        FieldSchema::new("vehicleMake", "Vehicle Make", FieldKind::Text)
            .with_placeholder("e.g., Toyota, Honda")
            .required(),
        FieldSchema::new("vehicleModel", "Vehicle Model", FieldKind::Text)
            .with_placeholder("e.g., Camry, Civic")
            .required(),
        FieldSchema::new("vehicleYear", "Vehicle Year", number(Some(1950.0), Some(current_year() + 1.0)))
            .with_placeholder("Enter vehicle year")
            .required(),
        FieldSchema::new("purchaseDate", "Purchase Date", FieldKind::Date).required(),
        FieldSchema::new(
            "drivingHistory",
            "Have you had any accidents in the last 3 years?",
            FieldKind::Radio { options: yes_no() },
        )
        .required(),
        FieldSchema::new("accidentDetails", "Accident Details", FieldKind::Textarea)
            .with_placeholder("Describe the accidents")
            .shown_when("drivingHistory", "yes"),
        FieldSchema::new("coverageType", "Coverage Type", FieldKind::Select {
            options: vec![
                FieldOption::new("Liability Only", "liability"),
                FieldOption::new("Collision", "collision"),
                FieldOption::new("Comprehensive", "comprehensive"),
            ],
        })
        .required(),
        terms_agreed(),
    ])
}

pub fn life_schema() -> FormSchema {
    FormSchema::new("Life Insurance Application", vec![
        full_name(),
        email(),
        FieldSchema::new("dateOfBirth", "Date of Birth", FieldKind::Date).required(),
        FieldSchema::new("smoker", "Are you a smoker?", FieldKind::Radio { options: yes_no() }).required(),
        FieldSchema::new("familyHistory", "Family Medical History", FieldKind::Textarea)
            .with_placeholder("Describe any relevant family medical history")
            .required(),
        FieldSchema::new("beneficiaryName", "Beneficiary Name", FieldKind::Text)
            .with_placeholder("Enter beneficiary's full name")
            .required(),
        FieldSchema::new("beneficiaryRelationship", "Relationship to Beneficiary", FieldKind::Text)
            .with_placeholder("e.g., Spouse, Child")
            .required(),
        FieldSchema::new("coverageAmount", "Coverage Amount ($)", number(Some(10000.0), None))
            .with_placeholder("Enter coverage amount")
            .required(),
        terms_agreed(),
    ])
}

pub fn travel_schema() -> FormSchema {
    FormSchema::new("Travel Insurance Application", vec![
        full_name(),
        email(),
        FieldSchema::new("destination", "Destination Country", FieldKind::Text)
            .with_placeholder("Enter destination country")
            .required(),
        FieldSchema::new("tripDuration", "Trip Duration (days)", number(Some(1.0), Some(365.0)))
            .with_placeholder("Enter number of days")
            .required(),
        FieldSchema::new("tripStartDate", "Trip Start Date", FieldKind::Date).required(),
        FieldSchema::new("tripEndDate", "Trip End Date", FieldKind::Date).required(),
        FieldSchema::new("travelPurpose", "Purpose of Travel", FieldKind::Select {
            options: vec![
                FieldOption::new("Leisure", "leisure"),
                FieldOption::new("Business", "business"),
                FieldOption::new("Study", "study"),
                FieldOption::new("Medical", "medical"),
            ],
        })
        .required(),
        FieldSchema::new(
            "preExistingConditions",
            "Do you have any pre-existing medical conditions?",
            FieldKind::Radio { options: yes_no() },
        )
        .required(),
        FieldSchema::new("medicalDetails", "Medical Condition Details", FieldKind::Textarea)
            .with_placeholder("Describe your medical conditions")
            .shown_when("preExistingConditions", "yes"),
        terms_agreed(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_unknown_category_yields_empty_schema() {
        let catalog = StaticFormCatalog::new();
        let schema = catalog.fetch_form_schema("pet").await.unwrap();
        assert!(schema.fields.is_empty());
        assert!(schema.title.is_empty());
    }

    #[tokio::test]
    async fn test_category_names() {
        let catalog = StaticFormCatalog::new();
        assert_eq!(
            catalog.category_name("car").await.unwrap().as_deref(),
            Some("Car Insurance")
        );
        assert_eq!(catalog.category_name("boat").await.unwrap(), None);
    }

    #[test]
    fn test_builtin_schemas_are_well_formed() {
        for category in builtin_categories() {
            let schema = builtin_schema(&category.id).expect("every category has a form");
            assert_eq!(schema.title, format!("{} Application", category.name));

            let ids: HashSet<&str> = schema.fields.iter().map(|f| f.id.as_str()).collect();
            assert_eq!(ids.len(), schema.fields.len(), "duplicate ids in {}", category.id);

            for field in &schema.fields {
                if let Some(condition) = &field.condition {
                    assert!(ids.contains(condition.depends_on.as_str()));
                }
                if matches!(field.kind, FieldKind::Select { .. } | FieldKind::Radio { .. }) {
                    assert!(!field.kind.options().is_empty());
                }
            }
        }
    }

    #[test]
    fn test_year_bounds_track_current_year() {
        let car = car_schema();
        let year = f64::from(Utc::now().year());
        assert_eq!(
            car.field("vehicleYear").map(|f| f.kind.clone()),
            Some(FieldKind::Number { min: Some(1950.0), max: Some(year + 1.0) })
        );
    }
}

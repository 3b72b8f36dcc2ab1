use crate::domains::application::types::{Application, ApplicationStatus, NewApplication};
use crate::domains::form::catalog::FormCatalog;
use crate::domains::form::types::FormValues;
use crate::errors::{StoreError, StoreResult};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use uuid::Uuid;

/// Persistence for submitted applications
#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    /// Store a new application. The store assigns id and status and resolves the
    /// category id in the payload to its display name.
    async fn submit(&self, new_application: &NewApplication) -> StoreResult<Application>;

    /// All applications, newest first.
    async fn find_all(&self) -> StoreResult<Vec<Application>>;

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Application>>;
}

/// Process-local application store
pub struct InMemoryApplicationRepository {
    applications: RwLock<Vec<Application>>,
    catalog: Arc<dyn FormCatalog>,
    latency: Duration,
}

impl InMemoryApplicationRepository {
    /// Store pre-populated with the sample applications.
    pub fn new(catalog: Arc<dyn FormCatalog>) -> Self {
        Self::with_applications(catalog, sample_applications())
    }

    pub fn empty(catalog: Arc<dyn FormCatalog>) -> Self {
        Self::with_applications(catalog, Vec::new())
    }

    pub fn with_applications(catalog: Arc<dyn FormCatalog>, applications: Vec<Application>) -> Self {
        Self {
            applications: RwLock::new(applications),
            catalog,
            latency: Duration::ZERO,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn generate_id() -> String {
        Uuid::new_v4().simple().to_string()[..8].to_string()
    }
}

#[async_trait]
impl ApplicationRepository for InMemoryApplicationRepository {
    async fn submit(&self, new_application: &NewApplication) -> StoreResult<Application> {
        self.simulate_latency().await;

        let insurance_type = self
            .catalog
            .category_name(&new_application.insurance_type)
            .await?
            .unwrap_or_else(|| new_application.insurance_type.clone());

        let application = Application {
            id: Self::generate_id(),
            insurance_type,
            submitted_at: new_application.submitted_at,
            status: ApplicationStatus::Pending,
            form_data: new_application.form_data.clone(),
        };

        self.applications
            .write()
            .map_err(|_| StoreError::Unavailable("application store lock poisoned".to_string()))?
            .insert(0, application.clone());

        log::info!(
            "Stored application {} ({})",
            application.id,
            application.insurance_type
        );
        Ok(application)
    }

    async fn find_all(&self) -> StoreResult<Vec<Application>> {
        self.simulate_latency().await;
        let applications = self
            .applications
            .read()
            .map_err(|_| StoreError::Unavailable("application store lock poisoned".to_string()))?;
        Ok(applications.clone())
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Application>> {
        self.simulate_latency().await;
        let applications = self
            .applications
            .read()
            .map_err(|_| StoreError::Unavailable("application store lock poisoned".to_string()))?;
        Ok(applications.iter().find(|app| app.id == id).cloned())
    }
}

fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .unwrap_or_default()
}

fn sample(
    id: &str,
    insurance_type: &str,
    submitted_at: DateTime<Utc>,
    status: ApplicationStatus,
    form_data: FormValues,
) -> Application {
    Application {
        id: id.to_string(),
        insurance_type: insurance_type.to_string(),
        submitted_at,
        status,
        form_data,
    }
}

/// The demo data set shown on a fresh install.
pub fn sample_applications() -> Vec<Application> {
    vec![
        sample(
            "app123",
            "Health Insurance",
            at(2023, 9, 15, 10, 30),
            ApplicationStatus::Approved,
            FormValues::new()
                .with("fullName", "John Doe")
                .with("email", "john@example.com")
                .with("dateOfBirth", "1985-01-15T00:00:00Z")
                .with("hasMedicalConditions", "no")
                .with("coverageType", "premium")
                .with("termsAgreed", true),
        ),
        sample(
            "app456",
            "Car Insurance",
            at(2023, 9, 10, 14, 20),
            ApplicationStatus::Pending,
            FormValues::new()
                .with("fullName", "Jane Smith")
                .with("email", "jane@example.com")
                .with("vehicleMake", "Toyota")
                .with("vehicleModel", "Camry")
                .with("vehicleYear", 2020.0)
                .with("purchaseDate", "2020-03-15T00:00:00Z")
                .with("drivingHistory", "no")
                .with("coverageType", "comprehensive")
                .with("termsAgreed", true),
        ),
        sample(
            "app789",
            "Home Insurance",
            at(2023, 9, 5, 9, 15),
            ApplicationStatus::Rejected,
            FormValues::new()
                .with("fullName", "Robert Johnson")
                .with("email", "robert@example.com")
                .with("address", "123 Main St, Anytown, USA")
                .with("propertyType", "house")
                .with("yearBuilt", 1995.0)
                .with("purchaseDate", "2010-06-22T00:00:00Z")
                .with("hasSecuritySystem", "no")
                .with("coverageAmount", 350000.0)
                .with("termsAgreed", true),
        ),
        sample(
            "app101",
            "Life Insurance",
            at(2023, 8, 28, 16, 45),
            ApplicationStatus::Approved,
            FormValues::new()
                .with("fullName", "Emily Davis")
                .with("email", "emily@example.com")
                .with("dateOfBirth", "1978-05-22T00:00:00Z")
                .with("smoker", "no")
                .with("familyHistory", "No significant medical history")
                .with("beneficiaryName", "Michael Davis")
                .with("beneficiaryRelationship", "Spouse")
                .with("coverageAmount", 500000.0)
                .with("termsAgreed", true),
        ),
        sample(
            "app202",
            "Travel Insurance",
            at(2023, 8, 20, 11, 10),
            ApplicationStatus::Pending,
            FormValues::new()
                .with("fullName", "Michael Wilson")
                .with("email", "michael@example.com")
                .with("destination", "Japan")
                .with("tripDuration", 14.0)
                .with("tripStartDate", "2023-12-10T00:00:00Z")
                .with("tripEndDate", "2023-12-24T00:00:00Z")
                .with("travelPurpose", "leisure")
                .with("preExistingConditions", "no")
                .with("termsAgreed", true),
        ),
    ]
}
